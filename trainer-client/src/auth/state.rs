use shared::models::Profile;
use strum::Display;

use crate::token_store::Credential;

/// In-memory session: credential, resolved profile and the loading flag.
///
/// `loading` is true only while a profile fetch (and its admin-flag lookup)
/// is in flight; `user` is only present after a successful fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// Credential currently held, mirrored in the token store.
    pub token: Option<Credential>,
    /// Profile resolved for `token`.
    pub user: Option<Profile>,
    /// A profile fetch is in flight.
    pub loading: bool,
}

/// Coarse state of a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum AuthPhase {
    /// No credential held.
    Anonymous,
    /// Credential held, profile fetch in flight.
    Restoring,
    /// Credential and profile both present.
    Authenticated,
    /// Credential held but the profile could not be fetched for a transient
    /// reason. Nothing is retried automatically.
    Unverified,
}

impl Session {
    /// Session seeded from a stored credential, before its profile is fetched.
    #[must_use]
    pub fn seeded(token: Option<Credential>) -> Self {
        Self {
            loading: token.is_some(),
            token,
            user: None,
        }
    }

    /// Derives the phase from the three fields.
    #[must_use]
    pub fn phase(&self) -> AuthPhase {
        if self.loading {
            return AuthPhase::Restoring;
        }
        match (&self.token, &self.user) {
            (None, _) => AuthPhase::Anonymous,
            (Some(_), Some(_)) => AuthPhase::Authenticated,
            (Some(_), None) => AuthPhase::Unverified,
        }
    }

    /// A profile has been resolved.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// True only for a resolved profile whose admin flag came back set.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|user| user.is_admin)
    }
}
