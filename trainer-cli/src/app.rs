//! Application root: builds every long-lived client once and hands them out.

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use client::{CoreClient, FileTokenStore, HttpSessionClient, SessionHandle, build_http_client};
use shared::config::ClientConfig;
use tracing::debug;

use crate::logging;

/// Everything a command needs, wired from one [`ClientConfig`].
#[derive(Debug)]
pub struct App {
    /// Effective configuration after file and environment were applied.
    pub config: ClientConfig,
    /// The credential file shared by the session and the core client.
    pub store: Arc<FileTokenStore>,
    /// The one session handle of this process.
    pub session: SessionHandle,
    /// Resource client sending the stored credential.
    pub core: CoreClient,
}

impl App {
    /// Loads configuration, installs logging and builds the clients.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        let config =
            ClientConfig::load_config(config_path).context("failed to load configuration")?;
        logging::init(&config.log_level);
        Self::new(config)
    }

    /// Builds the clients for an already loaded configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = build_http_client(Duration::from_secs(config.request_timeout_secs))
            .context("failed to build HTTP client")?;
        let store = Arc::new(FileTokenStore::new(config.token_path.clone()));

        let identity = Arc::new(HttpSessionClient::with_client(
            &config.auth_url,
            http.clone(),
            store.clone(),
        ));
        let session = SessionHandle::new(store.clone(), identity);
        let core = CoreClient::with_client(&config.core_url, http, store.clone());

        debug!(
            auth_url = %config.auth_url,
            core_url = %config.core_url,
            token_path = %config.token_path.display(),
            "application wired"
        );
        Ok(Self {
            config,
            store,
            session,
            core,
        })
    }
}
