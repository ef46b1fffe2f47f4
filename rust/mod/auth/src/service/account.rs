//! Registration, login, logout, and profile edits.
//!
//! Failures come back as [`AccountError`], whose `Display` is the message
//! shown to the user. Mapping goes through [`ErrorCode`], never through
//! the backend's wording.

use thiserror::Error;
use tracing::{error, info, warn};

use crate::backend::ErrorCode;
use crate::model::{ProfileUpdate, SignUpDetails};
use crate::service::{AuthError, SessionSync};

/// Shown after a successful registration.
pub const REGISTRATION_SUCCEEDED: &str = "Регистрация успешна! Проверьте email для подтверждения.";

/// User-facing account failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AccountError {
    #[error("Этот email уже зарегистрирован")]
    EmailTaken,

    #[error("Пароль слишком слабый (минимум 6 символов)")]
    WeakPassword,

    #[error("Ошибка регистрации")]
    RegistrationFailed,

    #[error("Неверный email или пароль")]
    InvalidCredentials,

    #[error("Ошибка входа")]
    LoginFailed,
}

impl AccountError {
    /// Stable, machine-readable identifier.
    pub fn code(&self) -> &'static str {
        match self {
            AccountError::EmailTaken => "EMAIL_TAKEN",
            AccountError::WeakPassword => "WEAK_PASSWORD",
            AccountError::RegistrationFailed => "REGISTRATION_FAILED",
            AccountError::InvalidCredentials => "INVALID_CREDENTIALS",
            AccountError::LoginFailed => "LOGIN_FAILED",
        }
    }

    fn registration(code: ErrorCode) -> Self {
        match code {
            ErrorCode::UserAlreadyExists => AccountError::EmailTaken,
            ErrorCode::WeakPassword => AccountError::WeakPassword,
            _ => AccountError::RegistrationFailed,
        }
    }

    fn login(code: ErrorCode) -> Self {
        match code {
            ErrorCode::InvalidCredentials => AccountError::InvalidCredentials,
            _ => AccountError::LoginFailed,
        }
    }
}

/// Successful registration.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub user_id: String,
    pub message: &'static str,
}

impl SessionSync {
    /// Create an account and its profile row.
    ///
    /// If sign-up succeeds but the profile insert fails the account is left
    /// without a row; the next sign-in creates one with the default role.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        details: &SignUpDetails,
    ) -> Result<Registration, AccountError> {
        let signup = self
            .backend
            .sign_up(email, password, details)
            .await
            .map_err(|e| {
                warn!("sign-up failed for {}: {}", email, e);
                AccountError::registration(e.code)
            })?;

        let record = details.to_new_profile(&signup.user_id, email);
        if let Err(e) = self.backend.insert_profile(&record).await {
            error!(
                "account {} created but its profile row was not: {}",
                signup.user_id, e
            );
            return Err(AccountError::registration(e.code));
        }

        info!("registered {} as {} ({})", email, signup.user_id, record.role);
        Ok(Registration {
            user_id: signup.user_id,
            message: REGISTRATION_SUCCEEDED,
        })
    }

    /// Password sign-in. Local state follows from the backend's
    /// `SIGNED_IN` event, not from this call.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), AccountError> {
        self.backend
            .sign_in_with_password(email, password)
            .await
            .map(|_| ())
            .map_err(|e| {
                warn!("sign-in failed for {}: {}", email, e);
                AccountError::login(e.code)
            })
    }

    /// End the session and return the page to navigate to.
    pub async fn logout(&self) -> String {
        if let Err(e) = self.backend.sign_out().await {
            warn!("sign-out failed: {}", e);
        }
        self.config.entry_point.clone()
    }

    /// Patch the signed-in user's profile, then reload it.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), AuthError> {
        {
            let _turn = self.transitions.lock().await;
            let session = self.current_user().ok_or(AuthError::NotSignedIn)?;
            self.backend
                .update_profile(&session.user_id, update)
                .await
                .map_err(|e| {
                    error!("failed to update profile for {}: {}", session.user_id, e);
                    e
                })?;
            self.resolve_profile(&session).await;
        }
        self.notify();
        Ok(())
    }
}
