use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use shared::models::{Profile, RegisterRequest};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use super::{AuthError, AuthPhase, Session};
use crate::{
    session_client::IdentityApi,
    token_store::{Credential, TokenStore},
};

/// Owner of the application's session.
///
/// Created once at the application root and passed explicitly to whatever
/// needs it; clones share the same state. Reads go through [`snapshot`],
/// [`phase`] or [`subscribe`]; the only mutations are [`bootstrap`],
/// [`refresh`], [`login`], [`register`] and [`logout`].
///
/// Every restore and every logout draws a ticket from a monotonically
/// increasing generation counter. A restore only commits while its ticket is
/// still the latest one issued, so a slow response can never overwrite the
/// outcome of a newer operation. A login only claims a ticket once its
/// profile has resolved, and only if no other operation started meanwhile;
/// a failed login therefore leaves the counter and the session alone.
///
/// [`snapshot`]: SessionHandle::snapshot
/// [`phase`]: SessionHandle::phase
/// [`subscribe`]: SessionHandle::subscribe
/// [`bootstrap`]: SessionHandle::bootstrap
/// [`refresh`]: SessionHandle::refresh
/// [`login`]: SessionHandle::login
/// [`register`]: SessionHandle::register
/// [`logout`]: SessionHandle::logout
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<dyn TokenStore>,
    api: Arc<dyn IdentityApi>,
    state: watch::Sender<Session>,
    generation: AtomicU64,
}

impl SessionHandle {
    /// Creates the session, seeding the credential from `store`.
    ///
    /// When a credential is found the session starts out loading; call
    /// [`SessionHandle::bootstrap`] to resolve it.
    pub fn new(store: Arc<dyn TokenStore>, api: Arc<dyn IdentityApi>) -> Self {
        let (state, _) = watch::channel(Session::seeded(store.get()));
        Self {
            inner: Arc::new(Inner {
                store,
                api,
                state,
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Copy of the current session.
    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.inner.state.borrow().clone()
    }

    /// Phase derived from the current session.
    #[must_use]
    pub fn phase(&self) -> AuthPhase {
        self.inner.state.borrow().phase()
    }

    /// Receiver notified on every committed change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.state.subscribe()
    }

    /// Waits until no profile fetch is in flight and returns the session.
    pub async fn settled(&self) -> Session {
        let mut receiver = self.subscribe();
        match receiver.wait_for(|session| !session.loading).await {
            Ok(session) => Session::clone(&session),
            Err(_) => self.snapshot(),
        }
    }

    /// Resolves the stored credential into a profile, if there is one.
    ///
    /// Failures are handled here: a rejected credential is cleared, anything
    /// else leaves the credential in place with no profile.
    #[instrument(skip(self))]
    pub async fn bootstrap(&self) -> AuthPhase {
        match self.inner.store.get() {
            Some(credential) => {
                if let Err(err) = self.restore(credential).await {
                    debug!(error = %err, "session bootstrap ended without a profile");
                }
            }
            None => {
                debug!("no stored credential");
                self.inner.state.send_if_modified(|session| {
                    let was_loading = session.loading;
                    session.loading = false;
                    was_loading
                });
            }
        }
        self.phase()
    }

    /// Re-runs the profile resolution for the stored credential.
    ///
    /// Returns `Ok(None)` when no credential is stored.
    ///
    /// # Errors
    /// The profile fetch failure, after it has been applied to the session.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<Option<Profile>, AuthError> {
        match self.inner.store.get() {
            Some(credential) => self.restore(credential).await.map(Some),
            None => Ok(None),
        }
    }

    /// Signs in and resolves the profile.
    ///
    /// The credential is persisted before the profile is fetched. If any step
    /// fails the previously stored credential is put back and the session is
    /// left exactly as it was, including any restore still in flight.
    ///
    /// A successful login only commits if no restore or logout started while
    /// it ran; otherwise the profile is returned and the store is realigned
    /// with the committed session.
    ///
    /// # Errors
    /// The identity service's answer translated to an [`AuthError`].
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Profile, AuthError> {
        let started = self.inner.generation.load(Ordering::SeqCst);
        let credential = self.inner.api.login(email, password).await?;
        let previous = self.inner.store.get();
        self.inner
            .store
            .set(&credential)
            .map_err(|err| AuthError::Storage(err.to_string()))?;

        let profile = match self.resolve_profile().await {
            Ok(profile) => profile,
            Err(err) => {
                self.roll_back_credential(&credential, previous);
                return Err(err);
            }
        };

        let committed = self.claim(started).is_some_and(|ticket| {
            self.commit(ticket, |session| {
                *session = Session {
                    token: Some(credential.clone()),
                    user: Some(profile.clone()),
                    loading: false,
                };
            })
        });
        if committed {
            info!(user_id = profile.id, is_admin = profile.is_admin, "signed in");
        } else {
            debug!("login superseded by a newer session operation");
            self.reconcile_store(&credential);
        }
        Ok(profile)
    }

    /// Creates an account, then signs in when the payload carries credentials.
    ///
    /// # Errors
    /// The registration or automatic login failure; the session is unchanged.
    #[instrument(skip(self, payload), fields(email = %payload.email))]
    pub async fn register(&self, payload: &RegisterRequest) -> Result<Option<Profile>, AuthError> {
        self.inner.api.register(payload).await?;
        info!("account registered");
        match payload.login_credentials() {
            Some((email, password)) => self.login(email, password).await.map(Some),
            None => Ok(None),
        }
    }

    /// Forgets the credential and the profile. Safe to call in any phase.
    ///
    /// # Errors
    /// [`AuthError::Storage`] if the credential file could not be removed; the
    /// in-memory session is reset regardless.
    pub fn logout(&self) -> Result<(), AuthError> {
        self.issue();
        self.inner.state.send_if_modified(|session| {
            if *session == Session::default() {
                return false;
            }
            *session = Session::default();
            true
        });
        self.inner
            .store
            .clear()
            .map_err(|err| AuthError::Storage(err.to_string()))?;
        info!("signed out");
        Ok(())
    }

    async fn restore(&self, credential: Credential) -> Result<Profile, AuthError> {
        let ticket = self.issue();
        self.commit(ticket, |session| {
            session.token = Some(credential);
            session.loading = true;
        });

        match self.resolve_profile().await {
            Ok(profile) => {
                let committed = self.commit(ticket, |session| {
                    session.user = Some(profile.clone());
                    session.loading = false;
                });
                if committed {
                    info!(
                        user_id = profile.id,
                        is_admin = profile.is_admin,
                        "session restored"
                    );
                } else {
                    debug!("discarding profile from a superseded restore");
                }
                Ok(profile)
            }
            Err(err) if err.invalidates_session() => {
                if self.is_current(ticket)
                    && let Err(io_err) = self.inner.store.clear()
                {
                    warn!(error = %io_err, "failed to remove rejected credential");
                }
                self.commit(ticket, |session| *session = Session::default());
                warn!(error = %err, "stored credential rejected");
                Err(err)
            }
            Err(err) => {
                self.commit(ticket, |session| {
                    session.user = None;
                    session.loading = false;
                });
                warn!(error = %err, "could not restore session, keeping stored credential");
                Err(err)
            }
        }
    }

    /// Profile fetch followed by the admin-flag lookup. The lookup can only
    /// lower privilege: any failure there yields a non-admin profile.
    async fn resolve_profile(&self) -> Result<Profile, AuthError> {
        let record = self.inner.api.fetch_profile().await?;
        let is_admin = match self.inner.api.fetch_is_admin(record.id).await {
            Ok(flag) => flag,
            Err(err) => {
                warn!(
                    user_id = record.id,
                    error = %err,
                    "admin flag lookup failed, treating user as non-admin"
                );
                false
            }
        };
        Ok(Profile::from_record(record, is_admin))
    }

    fn roll_back_credential(&self, credential: &Credential, previous: Option<Credential>) {
        if self.inner.store.get().as_ref() != Some(credential) {
            return;
        }
        let result = match previous {
            Some(previous) => self.inner.store.set(&previous),
            None => self.inner.store.clear(),
        };
        if let Err(err) = result {
            warn!(error = %err, "failed to restore previous credential");
        }
    }

    /// After a superseded login, makes the store agree with the committed session.
    fn reconcile_store(&self, credential: &Credential) {
        let committed = self.inner.state.borrow().token.clone();
        if committed.as_ref() == Some(credential) {
            return;
        }
        self.roll_back_credential(credential, committed);
    }

    fn issue(&self) -> u64 {
        self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.inner.generation.load(Ordering::SeqCst) == ticket
    }

    /// Takes the next ticket only if nothing was issued since `started`.
    fn claim(&self, started: u64) -> Option<u64> {
        self.inner
            .generation
            .compare_exchange(started, started + 1, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| started + 1)
    }

    fn commit(&self, ticket: u64, update: impl FnOnce(&mut Session)) -> bool {
        self.inner.state.send_if_modified(|session| {
            if !self.is_current(ticket) {
                return false;
            }
            update(session);
            true
        })
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("session", &*self.inner.state.borrow())
            .field("generation", &self.inner.generation.load(Ordering::SeqCst))
            .finish()
    }
}
