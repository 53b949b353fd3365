//! Session state and the operations that move it between phases.

mod error;
mod session;
mod state;

pub use error::AuthError;
pub use session::SessionHandle;
pub use state::{AuthPhase, Session};
