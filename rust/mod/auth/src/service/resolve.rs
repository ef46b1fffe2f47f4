use salon_kv::JsonStorage;
use tracing::{debug, error, info, warn};

use crate::model::{NewProfile, Session, mirror_record};
use crate::service::{AuthPhase, SessionSync};

impl SessionSync {
    /// Load the profile row for `session`, creating it on first sign-in.
    ///
    /// Never fails outward: backend errors are logged, role and profile
    /// stay as they were and the phase becomes [`AuthPhase::Error`].
    /// Caller holds the transition lock.
    pub(crate) async fn resolve_profile(&self, session: &Session) {
        match self.backend.find_profile(&session.user_id).await {
            Ok(Some(profile)) => {
                let role = profile.role;
                match role {
                    Some(role) => debug!("loaded profile for {} (role {})", session.user_id, role),
                    None => warn!("profile for {} has no known role", session.user_id),
                }

                let mirror = mirror_record(&session.user_id, &session.email, &profile);
                if let Err(e) = self.storage.store_json(&self.config.mirror_key, &mirror) {
                    warn!("failed to write local user mirror: {}", e);
                }

                self.update(|state| {
                    state.profile = Some(profile);
                    state.role = role;
                    state.phase = AuthPhase::Authenticated;
                });
            }
            Ok(None) => self.create_profile(session).await,
            Err(e) => {
                error!("failed to load profile for {}: {}", session.user_id, e);
                self.update(|state| state.phase = AuthPhase::Error);
            }
        }
    }

    /// Insert the default profile row. The row is not re-read, so
    /// `profile` stays empty until the next successful load.
    async fn create_profile(&self, session: &Session) {
        let now = chrono::Utc::now().to_rfc3339();
        let record = NewProfile::lazy(session, &now);

        match self.backend.insert_profile(&record).await {
            Ok(()) => {
                info!("created profile for {} with role {}", session.user_id, record.role);
                self.update(|state| {
                    state.role = Some(record.role);
                    state.phase = AuthPhase::Authenticated;
                });
            }
            Err(e) => {
                error!("failed to create profile for {}: {}", session.user_id, e);
                self.update(|state| state.phase = AuthPhase::Error);
            }
        }
    }
}
