pub mod admin;
pub mod assignments;
pub mod completion;
pub mod config;
pub mod session;
pub mod topics;
mod view;
