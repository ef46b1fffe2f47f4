use serde::{Deserialize, Serialize};

/// An authenticated backend session.
///
/// Issued and owned by the backend client; the synchronizer only keeps a
/// read-only copy of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Backend user id (UUID).
    pub user_id: String,

    /// Email the user signed in with.
    pub email: String,

    /// Bearer token for authenticated backend calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Expiry as unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl Session {
    /// A session carrying identity only, without tokens.
    pub fn new(user_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
            access_token: None,
            refresh_token: None,
            expires_at: None,
        }
    }

    /// The part of the email before `@`, used as a fallback display name.
    pub fn email_local_part(&self) -> &str {
        self.email.split('@').next().unwrap_or(&self.email)
    }
}
