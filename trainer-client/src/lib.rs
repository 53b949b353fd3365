#![cfg_attr(not(test), forbid(unsafe_code))]
#![deny(warnings, clippy::pedantic)]
#![allow(clippy::multiple_crate_versions)]

//! Client-side session management for the Mongo Trainer.
//!
//! The pieces, leaves first:
//! - [`token_store`] persists the bearer credential between runs
//! - [`session_client`] talks to the identity service
//! - [`auth`] owns the in-memory session and its transitions
//! - [`guards`] decide whether a [`routes::Route`] may be shown for a session
//! - [`core_api`] calls the resource service with the stored credential

use std::time::Duration;

pub mod auth;
pub mod core_api;
pub mod guards;
pub mod routes;
pub mod session_client;
pub mod token_store;

#[cfg(test)]
mod test_support;

pub use auth::{AuthError, AuthPhase, Session, SessionHandle};
pub use core_api::{AssignmentQuery, CoreApiError, CoreClient, LogQuery, TopicQuery};
pub use guards::{GuardOutcome, Redirect};
pub use routes::{Access, Route};
pub use session_client::{HttpSessionClient, IdentityApi};
pub use token_store::{Credential, FileTokenStore, MemoryTokenStore, TokenStore};

/// Builds the HTTP client shared by the identity and core clients.
///
/// # Errors
/// Returns an error if the TLS backend cannot be initialised.
pub fn build_http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("mongo-trainer/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
}
