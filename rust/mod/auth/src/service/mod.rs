pub mod account;
pub mod notify;
pub mod resolve;
pub mod state;
pub mod sync;

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use salon_kv::LocalStorage;

use crate::backend::{AuthBackend, BackendError};
use crate::model::{MIRROR_KEY, Profile, Role, Session};

pub use account::{AccountError, REGISTRATION_SUCCEEDED, Registration};
pub use notify::{ChangeHook, SubscriptionId};
pub use state::{AuthPhase, AuthState};

use notify::Listeners;

/// Session synchronizer error type.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("session sync already started")]
    AlreadyStarted,

    #[error("not signed in")]
    NotSignedIn,

    #[error("backend: {0}")]
    Backend(#[from] BackendError),
}

/// Configuration for the session synchronizer.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Storage key of the local user mirror.
    pub mirror_key: String,
    /// Where the UI navigates after logout.
    pub entry_point: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            mirror_key: MIRROR_KEY.to_string(),
            entry_point: "index.html".to_string(),
        }
    }
}

/// Mirrors the backend session into local state.
///
/// One instance per client, built at startup and shared as
/// `Arc<SessionSync>`. The UI subscribes with [`SessionSync::subscribe`]
/// and re-reads [`SessionSync::state`] on every notification.
pub struct SessionSync {
    pub(crate) backend: Arc<dyn AuthBackend>,
    pub(crate) storage: Arc<dyn LocalStorage>,
    pub(crate) config: AuthConfig,
    state: RwLock<AuthState>,
    listeners: Listeners,
    /// Admits one state transition at a time, FIFO.
    transitions: tokio::sync::Mutex<()>,
    /// Set once `start` ran; cancelling it stops the event listener.
    listener: Mutex<Option<CancellationToken>>,
}

impl SessionSync {
    pub fn new(
        backend: Arc<dyn AuthBackend>,
        storage: Arc<dyn LocalStorage>,
        config: AuthConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            backend,
            storage,
            config,
            state: RwLock::new(AuthState::default()),
            listeners: Listeners::new(),
            transitions: tokio::sync::Mutex::new(()),
            listener: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    // ── State ──

    /// Snapshot of the whole state.
    pub fn state(&self) -> AuthState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn phase(&self) -> AuthPhase {
        self.state.read().unwrap_or_else(PoisonError::into_inner).phase
    }

    pub fn current_user(&self) -> Option<Session> {
        self.state().current_user
    }

    pub fn role(&self) -> Option<Role> {
        self.state.read().unwrap_or_else(PoisonError::into_inner).role
    }

    pub fn profile(&self) -> Option<Profile> {
        self.state().profile
    }

    pub(crate) fn update<F: FnOnce(&mut AuthState)>(&self, f: F) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut state);
    }

    // ── Notifications ──

    /// Register a hook called after every state change. Hooks get no
    /// payload; they re-read the state they need.
    pub fn subscribe<F>(&self, hook: F) -> SubscriptionId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.listeners.subscribe(hook)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners.unsubscribe(id);
    }

    pub(crate) fn notify(&self) {
        self.listeners.notify();
    }
}

impl Drop for SessionSync {
    fn drop(&mut self) {
        self.shutdown();
    }
}
