//! Backend capability consumed by the session synchronizer.
//!
//! The backend owns authentication, the session, and the `users` table.
//! [`AuthBackend`] is the seam: [`HttpBackend`] talks to a hosted
//! Supabase-compatible project, [`MemoryBackend`] runs in-process.

mod error;
pub mod http;
pub mod memory;

pub use error::{BackendError, ErrorCode};
pub use http::{HttpBackend, HttpConfig};
pub use memory::MemoryBackend;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::model::{AuthEvent, NewProfile, Profile, ProfileUpdate, Session, SignUpDetails};

/// Capacity of the auth event channel. Receivers that fall further behind
/// get `RecvError::Lagged` and must re-read the session.
pub const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Result of a successful sign-up.
#[derive(Debug, Clone, PartialEq)]
pub struct SignUp {
    pub user_id: String,
}

#[async_trait]
pub trait AuthBackend: Send + Sync + 'static {
    /// The session currently held by the backend client, if any.
    async fn current_session(&self) -> Result<Option<Session>, BackendError>;

    /// Subscribe to session changes. The subscription lasts until the
    /// receiver is dropped.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;

    /// Create an account. Does not sign the user in.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        details: &SignUpDetails,
    ) -> Result<SignUp, BackendError>;

    /// Password sign-in. Emits `SIGNED_IN` on success.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, BackendError>;

    /// End the session. Emits `SIGNED_OUT`.
    async fn sign_out(&self) -> Result<(), BackendError>;

    /// Fetch the `users` row for `user_id`.
    async fn find_profile(&self, user_id: &str) -> Result<Option<Profile>, BackendError>;

    /// Insert a `users` row.
    async fn insert_profile(&self, record: &NewProfile) -> Result<(), BackendError>;

    /// Patch the `users` row for `user_id`.
    async fn update_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<(), BackendError>;
}
