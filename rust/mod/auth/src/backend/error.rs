use thiserror::Error;

// ── Error codes ─────────────────────────────────────────────────────
//
// Callers match on `ErrorCode`, never on the backend's message text.

/// Structured classification of a backend failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Sign-up with an email that already has an account.
    UserAlreadyExists,
    /// Sign-up password rejected by the backend policy.
    WeakPassword,
    /// Wrong email/password pair.
    InvalidCredentials,
    /// Call needs a session and there is none.
    NotAuthenticated,
    /// Transport failure, the request never got a response.
    Network,
    /// Response arrived but could not be decoded.
    Decode,
    /// Local storage failure inside the backend client.
    Storage,
    Unknown,
}

impl ErrorCode {
    /// Stable, machine-readable identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::UserAlreadyExists => "user_already_exists",
            ErrorCode::WeakPassword => "weak_password",
            ErrorCode::InvalidCredentials => "invalid_credentials",
            ErrorCode::NotAuthenticated => "not_authenticated",
            ErrorCode::Network => "network",
            ErrorCode::Decode => "decode",
            ErrorCode::Storage => "storage",
            ErrorCode::Unknown => "unknown",
        }
    }

    /// Map a backend-supplied machine code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "user_already_exists" | "email_exists" => Some(ErrorCode::UserAlreadyExists),
            "weak_password" => Some(ErrorCode::WeakPassword),
            "invalid_credentials" => Some(ErrorCode::InvalidCredentials),
            "not_authenticated" | "no_authorization" | "session_not_found" => {
                Some(ErrorCode::NotAuthenticated)
            }
            _ => None,
        }
    }

    /// Fallback for backends that only return prose. This is the single
    /// place that depends on the backend's wording.
    pub fn from_message(message: &str) -> Self {
        if message.contains("already registered") {
            ErrorCode::UserAlreadyExists
        } else if message.contains("weak password") {
            ErrorCode::WeakPassword
        } else if message.contains("Invalid login credentials") {
            ErrorCode::InvalidCredentials
        } else {
            ErrorCode::Unknown
        }
    }

    /// Prefer the machine code; fall back to the message.
    pub fn classify(code: Option<&str>, message: &str) -> Self {
        code.and_then(Self::from_code)
            .unwrap_or_else(|| Self::from_message(message))
    }
}

/// Failure reported by an [`AuthBackend`](super::AuthBackend) call.
#[derive(Debug, Clone, Error)]
#[error("{message} ({})", .code.as_str())]
pub struct BackendError {
    pub code: ErrorCode,
    pub message: String,
}

impl BackendError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Classify a prose-only error message.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            code: ErrorCode::from_message(&message),
            message,
        }
    }
}

impl From<salon_kv::StorageError> for BackendError {
    fn from(e: salon_kv::StorageError) -> Self {
        BackendError::new(ErrorCode::Storage, e.to_string())
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            BackendError::new(ErrorCode::Decode, e.to_string())
        } else {
            BackendError::new(ErrorCode::Network, e.to_string())
        }
    }
}
