use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::model::Session;

/// Kind of a backend auth state change.
///
/// Wire names follow the backend client (`SIGNED_IN`, `SIGNED_OUT`). Any
/// other name is carried through as `Other` and treated as a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEventKind {
    SignedIn,
    SignedOut,
    Other(String),
}

impl AuthEventKind {
    pub fn as_str(&self) -> &str {
        match self {
            AuthEventKind::SignedIn => "SIGNED_IN",
            AuthEventKind::SignedOut => "SIGNED_OUT",
            AuthEventKind::Other(name) => name,
        }
    }

    pub fn parse(name: &str) -> Self {
        match name {
            "SIGNED_IN" => AuthEventKind::SignedIn,
            "SIGNED_OUT" => AuthEventKind::SignedOut,
            other => AuthEventKind::Other(other.to_string()),
        }
    }
}

impl Serialize for AuthEventKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AuthEventKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(AuthEventKind::parse(&name))
    }
}

/// A session change pushed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthEvent {
    pub kind: AuthEventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<Session>,
}

impl AuthEvent {
    pub fn signed_in(session: Session) -> Self {
        Self {
            kind: AuthEventKind::SignedIn,
            session: Some(session),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            kind: AuthEventKind::SignedOut,
            session: None,
        }
    }

    pub fn other(name: &str, session: Option<Session>) -> Self {
        Self {
            kind: AuthEventKind::parse(name),
            session,
        }
    }
}
