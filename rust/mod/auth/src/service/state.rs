use crate::model::{Profile, Role, Session};

/// Where the synchronizer is in the sign-in lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthPhase {
    /// No session.
    #[default]
    Anonymous,
    /// Session known, profile lookup in flight.
    Resolving,
    /// Session known and profile resolution finished.
    Authenticated,
    /// Session known but the last profile lookup or creation failed.
    /// Role and profile keep whatever they held before resolution
    /// started, which is `None` when the session switched to a different
    /// user: sign-in clears both before the lookup.
    Error,
}

/// Public state the UI renders from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub phase: AuthPhase,
    pub current_user: Option<Session>,
    pub role: Option<Role>,
    pub profile: Option<Profile>,
}

impl AuthState {
    pub fn is_signed_in(&self) -> bool {
        self.current_user.is_some()
    }
}
