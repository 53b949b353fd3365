//! Durable storage for the bearer credential.
//!
//! Exactly one credential is kept; its absence means the user is anonymous.
//! Expiry is never tracked locally, the identity service reports it by
//! rejecting the credential.

use std::{
    fmt, fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::RwLock,
};

/// Opaque bearer token proving the user's identity.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wraps a raw token string.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for building the `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

impl From<&str> for Credential {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl From<String> for Credential {
    fn from(token: String) -> Self {
        Self(token)
    }
}

/// Persistence for the single bearer credential.
pub trait TokenStore: Send + Sync + fmt::Debug {
    /// The stored credential, if any.
    fn get(&self) -> Option<Credential>;

    /// Replaces the stored credential.
    ///
    /// # Errors
    /// Returns an error if the backing storage cannot be written.
    fn set(&self, credential: &Credential) -> io::Result<()>;

    /// Removes the stored credential. Clearing an empty store succeeds.
    ///
    /// # Errors
    /// Returns an error if the backing storage cannot be removed.
    fn clear(&self) -> io::Result<()>;
}

/// Stores the credential in a single file, readable only by its owner.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Creates a store backed by `path`. Nothing is touched until the first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the credential file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    /// Opens the credential file truncated, owner-only before any byte is written.
    #[cfg(unix)]
    fn open_for_write(&self) -> io::Result<fs::File> {
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

        let file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(&self.path)?;
        // `mode` only applies on creation; an existing file keeps its bits.
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
        Ok(file)
    }

    #[cfg(not(unix))]
    fn open_for_write(&self) -> io::Result<fs::File> {
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<Credential> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                (!token.is_empty()).then(|| Credential::new(token))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "failed to read stored credential"
                );
                None
            }
        }
    }

    fn set(&self, credential: &Credential) -> io::Result<()> {
        self.ensure_parent()?;
        let mut file = self.open_for_write()?;
        file.write_all(credential.expose().as_bytes())?;
        tracing::debug!(path = %self.path.display(), "stored credential");
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "removed stored credential");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }
}

/// Process-local store, for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slot: RwLock<Option<Credential>>,
}

impl MemoryTokenStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-seeded with `credential`.
    pub fn with_credential(credential: impl Into<Credential>) -> Self {
        Self {
            slot: RwLock::new(Some(credential.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<Credential> {
        self.slot.read().ok().and_then(|guard| guard.clone())
    }

    fn set(&self, credential: &Credential) -> io::Result<()> {
        let mut guard = self
            .slot
            .write()
            .map_err(|_| io::Error::other("credential store lock poisoned"))?;
        *guard = Some(credential.clone());
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        let mut guard = self
            .slot
            .write()
            .map_err(|_| io::Error::other("credential store lock poisoned"))?;
        *guard = None;
        Ok(())
    }
}
