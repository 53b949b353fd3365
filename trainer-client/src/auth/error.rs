use thiserror::Error;

/// Failures of identity operations, carrying a message fit to show the user.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// The identity service rejected the email/password pair (401/403 on login).
    #[error("{message}")]
    InvalidCredentials {
        /// Message from the service, or a generic one.
        message: String,
    },

    /// Registration hit an existing account (409).
    #[error("{message}")]
    AlreadyExists {
        /// Message from the service.
        message: String,
    },

    /// Any other non-success answer, or a success answer that could not be used.
    #[error("{message}")]
    ServerError {
        /// Status code, absent when a success body was unusable.
        status: Option<u16>,
        /// Message extracted from the body, or the status reason.
        message: String,
    },

    /// The request never produced a response.
    #[error("could not reach the identity service: {0}")]
    NetworkError(String),

    /// The stored credential was refused while fetching the profile (401/403).
    #[error("session rejected by the identity service (HTTP {status})")]
    SessionRejected {
        /// 401 or 403.
        status: u16,
    },

    /// The credential could not be written to or removed from the token store.
    #[error("failed to update stored credential: {0}")]
    Storage(String),
}

impl AuthError {
    /// Whether the failure means the stored credential is no longer valid.
    ///
    /// Only an explicit 401/403 on the profile call qualifies; transport errors
    /// and 5xx answers leave the session intact.
    #[must_use]
    pub const fn invalidates_session(&self) -> bool {
        matches!(self, Self::SessionRejected { .. })
    }

    /// HTTP status behind the failure, when there was one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::ServerError { status, .. } => *status,
            Self::SessionRejected { status } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_uses_server_message() {
        let err = AuthError::InvalidCredentials {
            message: "invalid".to_string(),
        };
        assert_eq!(err.to_string(), "invalid");

        let err = AuthError::ServerError {
            status: Some(500),
            message: "database down".to_string(),
        };
        assert_eq!(err.to_string(), "database down");
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn test_only_rejection_invalidates_session() {
        assert!(AuthError::SessionRejected { status: 401 }.invalidates_session());
        assert!(AuthError::SessionRejected { status: 403 }.invalidates_session());
        assert!(!AuthError::NetworkError("timeout".to_string()).invalidates_session());
        assert!(
            !AuthError::ServerError {
                status: Some(503),
                message: "unavailable".to_string()
            }
            .invalidates_session()
        );
    }
}
