//! Backend client for a hosted Supabase-compatible project.
//!
//! Auth goes through GoTrue (`/auth/v1/*`), the `users` table through
//! PostgREST (`/rest/v1/users`). The session is kept in memory and
//! persisted to [`LocalStorage`] so it survives restarts.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use salon_kv::{JsonStorage, LocalStorage};

use crate::backend::{AuthBackend, BackendError, ErrorCode, EVENT_CHANNEL_CAPACITY, SignUp};
use crate::model::{AuthEvent, NewProfile, Profile, ProfileUpdate, Session, SignUpDetails};

/// Connection settings for [`HttpBackend`].
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Project URL, e.g. `https://abcd.supabase.co`.
    pub url: String,
    /// Public anon key, sent as `apikey` on every request.
    pub anon_key: String,
    /// Storage key the session is persisted under.
    pub session_key: String,
    /// Table holding profile rows.
    pub profile_table: String,
}

impl HttpConfig {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            ..Default::default()
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:54321".to_string(),
            anon_key: String::new(),
            session_key: "salon.auth.session".to_string(),
            profile_table: "users".to_string(),
        }
    }
}

/// Error body shapes returned by GoTrue and PostgREST.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    code: Option<serde_json::Value>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ErrorBody {
    fn into_error(self, status: u16, raw: &str) -> BackendError {
        let code = self
            .error_code
            .or_else(|| self.code.as_ref().and_then(|c| c.as_str()).map(str::to_string));
        let message = self
            .msg
            .or(self.message)
            .or(self.error_description)
            .or(self.error)
            .unwrap_or_else(|| format!("HTTP {}: {}", status, raw));
        BackendError::new(ErrorCode::classify(code.as_deref(), &message), message)
    }
}

#[derive(Debug, Deserialize)]
struct UserBody {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: UserBody,
}

/// Sign-up returns the bare user when email confirmation is pending, or a
/// full token response when the project auto-confirms.
#[derive(Debug, Deserialize)]
struct SignUpResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    user: Option<UserBody>,
}

pub struct HttpBackend {
    http: reqwest::Client,
    config: HttpConfig,
    storage: Arc<dyn LocalStorage>,
    /// Outer `None` until storage has been read once; after that memory
    /// is authoritative even if persisting a change failed.
    session: RwLock<Option<Option<Session>>>,
    events: broadcast::Sender<AuthEvent>,
}

impl HttpBackend {
    pub fn new(config: HttpConfig, storage: Arc<dyn LocalStorage>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            http: reqwest::Client::new(),
            config,
            storage,
            session: RwLock::new(None),
            events,
        }
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.config.url, path)
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.config.url, self.config.profile_table)
    }

    fn cached_session(&self) -> Option<Session> {
        self.session.read().ok().and_then(|s| s.clone().flatten())
    }

    fn set_session(&self, session: Option<Session>) -> Result<(), BackendError> {
        let mut current = self.session.write().unwrap_or_else(PoisonError::into_inner);
        *current = Some(session.clone());
        drop(current);

        match &session {
            Some(s) => self.storage.store_json(&self.config.session_key, s)?,
            None => self.storage.remove_item(&self.config.session_key)?,
        }
        Ok(())
    }

    /// Attach `apikey` plus the bearer: session token when signed in,
    /// anon key otherwise.
    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        let token = self
            .cached_session()
            .and_then(|s| s.access_token)
            .unwrap_or_else(|| self.config.anon_key.clone());
        builder
            .header("apikey", &self.config.anon_key)
            .bearer_auth(token)
    }

    /// Map a non-2xx response to `BackendError`.
    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let raw = resp.text().await.unwrap_or_default();
        let body: ErrorBody = serde_json::from_str(&raw).unwrap_or_default();
        Err(body.into_error(status.as_u16(), &raw))
    }
}

#[async_trait]
impl AuthBackend for HttpBackend {
    async fn current_session(&self) -> Result<Option<Session>, BackendError> {
        if let Some(loaded) = self.session.read().ok().and_then(|s| s.clone()) {
            return Ok(loaded);
        }
        let stored: Option<Session> = self.storage.load_json(&self.config.session_key)?;
        if let Some(session) = &stored {
            debug!("restored session for {} from storage", session.user_id);
        }
        let mut current = self.session.write().unwrap_or_else(PoisonError::into_inner);
        Ok(current.get_or_insert(stored).clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        details: &SignUpDetails,
    ) -> Result<SignUp, BackendError> {
        let body = serde_json::json!({
            "email": email,
            "password": password,
            "data": {
                "first_name": details.first_name,
                "last_name": details.last_name,
                "phone": details.phone,
            },
        });
        let req = self.authed(self.http.post(self.auth_url("signup")).json(&body));
        let resp = Self::check(req.send().await?).await?;
        let parsed: SignUpResponse = resp.json().await?;

        let user_id = parsed
            .user
            .map(|u| u.id)
            .or(parsed.id)
            .ok_or_else(|| BackendError::new(ErrorCode::Decode, "sign-up response has no user id"))?;
        Ok(SignUp { user_id })
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, BackendError> {
        let body = serde_json::json!({ "email": email, "password": password });
        let req = self
            .http
            .post(self.auth_url("token"))
            .query(&[("grant_type", "password")])
            .json(&body);
        let resp = Self::check(self.authed(req).send().await?).await?;
        let token: TokenResponse = resp.json().await?;

        let expires_at = token.expires_at.or_else(|| {
            token
                .expires_in
                .map(|secs| chrono::Utc::now().timestamp() + secs)
        });
        let session = Session {
            user_id: token.user.id,
            email: token.user.email.unwrap_or_else(|| email.to_string()),
            access_token: Some(token.access_token),
            refresh_token: token.refresh_token,
            expires_at,
        };
        let stored = self.set_session(Some(session.clone()));
        let _ = self.events.send(AuthEvent::signed_in(session.clone()));
        stored?;
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        let remote = match self.cached_session().and_then(|s| s.access_token) {
            Some(_) => {
                let req = self.authed(self.http.post(self.auth_url("logout")));
                match req.send().await {
                    Ok(resp) => Self::check(resp).await.map(|_| ()),
                    Err(e) => Err(BackendError::from(e)),
                }
            }
            None => Ok(()),
        };
        if let Err(e) = &remote {
            warn!("remote sign-out failed, clearing local session anyway: {}", e);
        }

        let cleared = self.set_session(None);
        let _ = self.events.send(AuthEvent::signed_out());
        if let Err(e) = &cleared {
            warn!("signed out, but the stored session could not be removed: {}", e);
        }
        cleared?;
        remote
    }

    async fn find_profile(&self, user_id: &str) -> Result<Option<Profile>, BackendError> {
        let filter = format!("eq.{}", user_id);
        let req = self
            .http
            .get(self.table_url())
            .query(&[("id", filter.as_str()), ("select", "*")]);
        let resp = Self::check(self.authed(req).send().await?).await?;
        let rows: Vec<Profile> = resp.json().await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_profile(&self, record: &NewProfile) -> Result<(), BackendError> {
        let req = self
            .http
            .post(self.table_url())
            .header("Prefer", "return=minimal")
            .json(&[record]);
        Self::check(self.authed(req).send().await?).await?;
        Ok(())
    }

    async fn update_profile(&self, user_id: &str, update: &ProfileUpdate) -> Result<(), BackendError> {
        let filter = format!("eq.{}", user_id);
        let req = self
            .http
            .patch(self.table_url())
            .query(&[("id", filter.as_str())])
            .header("Prefer", "return=minimal")
            .json(update);
        Self::check(self.authed(req).send().await?).await?;
        Ok(())
    }
}
