use std::collections::BTreeMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::broadcast;
use tracing::debug;

use crate::backend::{AuthBackend, BackendError, ErrorCode, EVENT_CHANNEL_CAPACITY, SignUp};
use crate::model::{AuthEvent, NewProfile, Profile, ProfileUpdate, Session, SignUpDetails};

/// Shortest password the in-process backend accepts.
pub const MIN_PASSWORD_LEN: usize = 6;

struct Account {
    user_id: String,
    password: String,
}

/// In-process backend: accounts, `users` rows, and the current session
/// live in memory. Behaves like the hosted backend for the operations the
/// synchronizer uses, including the event stream.
pub struct MemoryBackend {
    /// email -> account.
    accounts: RwLock<BTreeMap<String, Account>>,
    /// user id -> `users` row, stored as JSON like the hosted table.
    profiles: RwLock<BTreeMap<String, Map<String, Value>>>,
    session: RwLock<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
    next_id: AtomicU64,
}

impl MemoryBackend {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            accounts: RwLock::new(BTreeMap::new()),
            profiles: RwLock::new(BTreeMap::new()),
            session: RwLock::new(None),
            events,
            next_id: AtomicU64::new(1),
        }
    }

    /// Start with `session` already active, as if restored from storage.
    pub fn with_session(session: Session) -> Self {
        let backend = Self::new();
        if let Ok(mut current) = backend.session.write() {
            *current = Some(session);
        }
        backend
    }

    /// Seed a `users` row directly.
    pub fn put_profile(&self, profile: Profile) {
        if let Ok(mut profiles) = self.profiles.write() {
            profiles.insert(profile.id.clone(), profile.into());
        }
    }

    /// Read a `users` row directly.
    pub fn profile(&self, user_id: &str) -> Option<Profile> {
        let row = self.profiles.read().ok()?.get(user_id).cloned()?;
        Profile::try_from(row).ok()
    }

    /// Push an arbitrary event to subscribers.
    pub fn emit(&self, event: AuthEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }

    fn lock_err<T>(_: T) -> BackendError {
        BackendError::new(ErrorCode::Storage, "memory backend lock poisoned")
    }

    fn decode_err(e: serde_json::Error) -> BackendError {
        BackendError::new(ErrorCode::Decode, e.to_string())
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthBackend for MemoryBackend {
    async fn current_session(&self) -> Result<Option<Session>, BackendError> {
        let session = self.session.read().map_err(Self::lock_err)?;
        Ok(session.clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        _details: &SignUpDetails,
    ) -> Result<SignUp, BackendError> {
        if password.len() < MIN_PASSWORD_LEN {
            return Err(BackendError::new(
                ErrorCode::WeakPassword,
                format!("Password should be at least {} characters", MIN_PASSWORD_LEN),
            ));
        }

        let mut accounts = self.accounts.write().map_err(Self::lock_err)?;
        if accounts.contains_key(email) {
            return Err(BackendError::new(
                ErrorCode::UserAlreadyExists,
                "User already registered",
            ));
        }

        let user_id = format!("user-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        accounts.insert(
            email.to_string(),
            Account {
                user_id: user_id.clone(),
                password: password.to_string(),
            },
        );
        debug!("memory backend: signed up {} as {}", email, user_id);
        Ok(SignUp { user_id })
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, BackendError> {
        let user_id = {
            let accounts = self.accounts.read().map_err(Self::lock_err)?;
            match accounts.get(email) {
                Some(account) if account.password == password => account.user_id.clone(),
                _ => {
                    return Err(BackendError::new(
                        ErrorCode::InvalidCredentials,
                        "Invalid login credentials",
                    ));
                }
            }
        };

        let session = Session::new(user_id, email);
        {
            let mut current = self.session.write().map_err(Self::lock_err)?;
            *current = Some(session.clone());
        }
        self.emit(AuthEvent::signed_in(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        {
            let mut current = self.session.write().map_err(Self::lock_err)?;
            *current = None;
        }
        self.emit(AuthEvent::signed_out());
        Ok(())
    }

    async fn find_profile(&self, user_id: &str) -> Result<Option<Profile>, BackendError> {
        let row = self.profiles.read().map_err(Self::lock_err)?.get(user_id).cloned();
        row.map(Profile::try_from).transpose().map_err(Self::decode_err)
    }

    async fn insert_profile(&self, record: &NewProfile) -> Result<(), BackendError> {
        let mut profiles = self.profiles.write().map_err(Self::lock_err)?;
        if profiles.contains_key(&record.id) {
            return Err(BackendError::new(
                ErrorCode::Unknown,
                format!("duplicate key value violates unique constraint \"users_pkey\" ({})", record.id),
            ));
        }
        let row = match serde_json::to_value(record).map_err(Self::decode_err)? {
            Value::Object(row) => row,
            other => {
                return Err(BackendError::new(
                    ErrorCode::Decode,
                    format!("profile record is not an object: {}", other),
                ));
            }
        };
        profiles.insert(record.id.clone(), row);
        Ok(())
    }

    async fn update_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<(), BackendError> {
        let mut profiles = self.profiles.write().map_err(Self::lock_err)?;
        // Like a filtered PATCH: no matching row updates nothing.
        if let Some(row) = profiles.get_mut(user_id) {
            update.apply_to(row);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;

    // ========================================================================
    // Sign-up / sign-in
    // ========================================================================

    #[tokio::test]
    async fn sign_up_then_sign_in() {
        let backend = MemoryBackend::new();
        let signup = backend
            .sign_up("anna@salon.example", "secret123", &SignUpDetails::default())
            .await
            .unwrap();

        // Sign-up alone does not create a session.
        assert!(backend.current_session().await.unwrap().is_none());

        let session = backend
            .sign_in_with_password("anna@salon.example", "secret123")
            .await
            .unwrap();
        assert_eq!(session.user_id, signup.user_id);
        assert_eq!(backend.current_session().await.unwrap(), Some(session));
    }

    #[tokio::test]
    async fn duplicate_sign_up_rejected() {
        let backend = MemoryBackend::new();
        let details = SignUpDetails::default();
        backend.sign_up("a@b.c", "secret123", &details).await.unwrap();

        let err = backend.sign_up("a@b.c", "secret123", &details).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::UserAlreadyExists);
    }

    #[tokio::test]
    async fn short_password_rejected() {
        let backend = MemoryBackend::new();
        let err = backend
            .sign_up("a@b.c", "123", &SignUpDetails::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::WeakPassword);
    }

    #[tokio::test]
    async fn wrong_password_rejected() {
        let backend = MemoryBackend::new();
        backend.sign_up("a@b.c", "secret123", &SignUpDetails::default()).await.unwrap();

        let err = backend.sign_in_with_password("a@b.c", "nope").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidCredentials);
        assert_eq!(err.message, "Invalid login credentials");
    }

    // ========================================================================
    // Events
    // ========================================================================

    #[tokio::test]
    async fn sign_in_and_out_emit_events() {
        let backend = MemoryBackend::new();
        backend.sign_up("a@b.c", "secret123", &SignUpDetails::default()).await.unwrap();
        let mut rx = backend.subscribe();

        backend.sign_in_with_password("a@b.c", "secret123").await.unwrap();
        backend.sign_out().await.unwrap();

        let first = rx.recv().await.unwrap();
        assert_eq!(first.kind, crate::model::AuthEventKind::SignedIn);
        assert_eq!(first.session.unwrap().email, "a@b.c");

        let second = rx.recv().await.unwrap();
        assert_eq!(second.kind, crate::model::AuthEventKind::SignedOut);
        assert!(backend.current_session().await.unwrap().is_none());
    }

    // ========================================================================
    // Profiles
    // ========================================================================

    #[tokio::test]
    async fn insert_find_update_profile() {
        let backend = MemoryBackend::new();
        let session = Session::new("u1", "a@b.c");
        backend
            .insert_profile(&NewProfile::lazy(&session, "2024-01-01T00:00:00Z"))
            .await
            .unwrap();

        let p = backend.find_profile("u1").await.unwrap().unwrap();
        assert_eq!(p.role, Some(Role::Client));
        assert_eq!(p.email.as_deref(), Some("a@b.c"));

        let update = ProfileUpdate {
            first_name: Some("Anna".into()),
            ..Default::default()
        };
        backend.update_profile("u1", &update).await.unwrap();
        assert_eq!(backend.profile("u1").unwrap().first_name.as_deref(), Some("Anna"));
    }

    #[tokio::test]
    async fn duplicate_profile_insert_fails() {
        let backend = MemoryBackend::new();
        let record = NewProfile::lazy(&Session::new("u1", "a@b.c"), "now");
        backend.insert_profile(&record).await.unwrap();
        assert!(backend.insert_profile(&record).await.is_err());
    }

    #[tokio::test]
    async fn find_missing_profile_is_none() {
        let backend = MemoryBackend::new();
        assert!(backend.find_profile("ghost").await.unwrap().is_none());
    }
}
