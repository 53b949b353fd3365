//! Wire models exchanged with the identity and core services.

pub mod attempt;
pub mod errors;
pub mod user;

pub use attempt::AttemptRequest;
pub use errors::{error_message_from_text, extract_error_message};
pub use user::{
    IsAdminResponse, LoginRequest, LoginResponse, Profile, ProfileRecord, RegisterRequest,
};
