//! Auth module: keeps a salon client's view of the signed-in user in step
//! with the backend.
//!
//! # Pieces
//!
//! - **Backend**: the [`AuthBackend`] seam over authentication and the
//!   `users` table ([`HttpBackend`], [`MemoryBackend`])
//! - **SessionSync**: follows backend auth events, resolves the user's
//!   profile and role, mirrors it into local storage, notifies the UI
//! - **Accounts**: register, login, logout and profile edits, with
//!   user-facing error messages
//! - **AuthView**: display data derived from the state
//!
//! # Usage
//!
//! ```ignore
//! use salon_auth::{AuthConfig, HttpBackend, HttpConfig, SessionSync};
//!
//! let backend = Arc::new(HttpBackend::new(HttpConfig::new(url, key), storage.clone()));
//! let sync = SessionSync::new(backend, storage, AuthConfig::default());
//! sync.subscribe(|| redraw());
//! sync.start().await?;
//! ```

pub mod backend;
pub mod model;
pub mod service;
pub mod view;

pub use backend::{AuthBackend, BackendError, ErrorCode, HttpBackend, HttpConfig, MemoryBackend};
pub use model::{AuthEvent, AuthEventKind, Profile, ProfileUpdate, Role, Session, SignUpDetails};
pub use service::{
    AccountError, AuthConfig, AuthError, AuthPhase, AuthState, REGISTRATION_SUCCEEDED,
    Registration, SessionSync, SubscriptionId,
};
pub use view::{AuthView, DashboardLink};
