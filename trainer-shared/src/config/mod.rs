//! # Configuration
//!
//! Client configuration: service endpoints, credential location and logging.

pub mod client;

pub use client::{ClientConfig, ConfigError, ConfigFormat};
