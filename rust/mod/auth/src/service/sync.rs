use std::sync::{Arc, PoisonError, Weak};

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::model::{AuthEvent, AuthEventKind, Session};
use crate::service::{AuthError, AuthPhase, AuthState, SessionSync};

impl SessionSync {
    /// Load the existing session, notify once, then follow the backend's
    /// event stream in a background task until [`shutdown`](Self::shutdown).
    pub async fn start(self: &Arc<Self>) -> Result<(), AuthError> {
        let cancel = {
            let mut slot = self.listener.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.is_some() {
                return Err(AuthError::AlreadyStarted);
            }
            let token = CancellationToken::new();
            *slot = Some(token.clone());
            token
        };

        // Subscribe before reading the session so nothing emitted in
        // between is missed.
        let mut events = self.backend.subscribe();

        {
            let _turn = self.transitions.lock().await;
            match self.backend.current_session().await {
                Ok(Some(session)) => {
                    info!("existing session for {}", session.user_id);
                    self.apply_sign_in(session).await;
                }
                Ok(None) => debug!("no existing session"),
                Err(e) => error!("failed to read current session: {}", e),
            }
        }
        self.notify();

        let weak: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            debug!("auth event listener started");
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    received = events.recv() => {
                        let Some(sync) = weak.upgrade() else { break };
                        match received {
                            Ok(event) => sync.handle_event(event).await,
                            Err(RecvError::Lagged(missed)) => {
                                warn!("auth event listener lagged by {} events, re-reading session", missed);
                                sync.refresh().await;
                            }
                            Err(RecvError::Closed) => break,
                        }
                    }
                }
            }
            debug!("auth event listener stopped");
        });

        Ok(())
    }

    /// Stop following backend events. Dropping the receiver is the
    /// unsubscribe. State is left as is.
    pub fn shutdown(&self) {
        let token = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(token) = token {
            token.cancel();
        }
    }

    /// Whether `start` ran and `shutdown` has not been called since.
    pub fn is_running(&self) -> bool {
        self.listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|t| !t.is_cancelled())
    }

    /// Apply one backend event and notify. Resolution runs at most once
    /// per event.
    pub async fn handle_event(&self, event: AuthEvent) {
        {
            let _turn = self.transitions.lock().await;
            match event.kind {
                AuthEventKind::SignedIn => match event.session {
                    Some(session) => {
                        info!("signed in as {}", session.user_id);
                        self.apply_sign_in(session).await;
                    }
                    None => warn!("SIGNED_IN event without a session, ignoring"),
                },
                AuthEventKind::SignedOut => {
                    info!("signed out");
                    self.apply_sign_out();
                }
                AuthEventKind::Other(name) => debug!("auth event {} needs no state change", name),
            }
        }
        self.notify();
    }

    /// Re-read the backend session and apply it as a sign-in or sign-out.
    pub async fn refresh(&self) {
        {
            let _turn = self.transitions.lock().await;
            match self.backend.current_session().await {
                Ok(Some(session)) => self.apply_sign_in(session).await,
                Ok(None) => self.apply_sign_out(),
                Err(e) => error!("failed to read current session: {}", e),
            }
        }
        self.notify();
    }

    /// Caller holds the transition lock.
    async fn apply_sign_in(&self, session: Session) {
        self.update(|state| {
            let same_user = state
                .current_user
                .as_ref()
                .is_some_and(|u| u.user_id == session.user_id);
            if !same_user {
                state.role = None;
                state.profile = None;
            }
            state.current_user = Some(session.clone());
            state.phase = AuthPhase::Resolving;
        });
        self.resolve_profile(&session).await;
    }

    /// Caller holds the transition lock.
    fn apply_sign_out(&self) {
        self.update(|state| *state = AuthState::default());
        if let Err(e) = self.storage.remove_item(&self.config.mirror_key) {
            warn!("failed to remove local user mirror: {}", e);
        }
    }
}
