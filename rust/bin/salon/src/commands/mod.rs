pub mod account;
pub mod session;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;

use salon_auth::{AuthState, AuthView, HttpBackend, SessionSync};
use salon_kv::{LocalStorage, RedbStorage};

use crate::config::ClientConfig;

/// How long a command waits for the session to settle after a backend call.
const SETTLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything a command needs: storage, backend, and the synchronizer.
pub struct Client {
    pub config: ClientConfig,
    pub storage: Arc<dyn LocalStorage>,
    pub sync: Arc<SessionSync>,
    changes: mpsc::UnboundedReceiver<()>,
}

impl Client {
    /// Open local storage and wire the backend. Does not start the
    /// synchronizer.
    pub fn open(config_path: &Path) -> Result<Self> {
        let config = ClientConfig::load(config_path)?;

        let storage_path = config.storage_path();
        if let Some(parent) = storage_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let storage: Arc<dyn LocalStorage> = Arc::new(
            RedbStorage::open(&storage_path)
                .map_err(|e| anyhow::anyhow!("failed to open {}: {}", storage_path.display(), e))?,
        );

        let backend = Arc::new(HttpBackend::new(config.http_config(), storage.clone()));
        let sync = SessionSync::new(backend, storage.clone(), config.auth_config());

        let (tx, changes) = mpsc::unbounded_channel();
        sync.subscribe(move || {
            let _ = tx.send(());
        });

        Ok(Self {
            config,
            storage,
            sync,
            changes,
        })
    }

    /// Start following the backend session.
    pub async fn start(&self) -> Result<()> {
        self.sync.start().await?;
        Ok(())
    }

    /// Wait until `done` holds for the current state, re-checking on every
    /// change notification.
    pub async fn settle<F>(&mut self, done: F) -> Result<AuthState>
    where
        F: Fn(&AuthState) -> bool,
    {
        let deadline = tokio::time::Instant::now() + SETTLE_TIMEOUT;
        loop {
            let state = self.sync.state();
            if done(&state) {
                return Ok(state);
            }
            match tokio::time::timeout_at(deadline, self.changes.recv()).await {
                Ok(Some(())) => continue,
                Ok(None) => anyhow::bail!("session sync stopped"),
                Err(_) => anyhow::bail!("timed out waiting for the session to settle"),
            }
        }
    }
}

/// Print the signed-in summary for `state`.
pub fn print_state(state: &AuthState) {
    let view = AuthView::from(state);
    if !view.signed_in {
        println!("Not signed in.");
        return;
    }

    let greeting = view.greeting_name.unwrap_or_default();
    let email = state
        .current_user
        .as_ref()
        .map(|u| u.email.as_str())
        .unwrap_or_default();
    println!("Signed in as {} <{}>", greeting, email);
    match state.role {
        Some(role) => println!("  role:       {}", role),
        None => println!("  role:       (unknown)"),
    }
    if let Some(link) = view.dashboard {
        println!("  dashboard:  {} ({})", link.label, link.href);
    }
    println!("  state:      {:?}", state.phase);
}
