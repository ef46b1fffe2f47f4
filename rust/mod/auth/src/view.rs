//! Display data derived from [`AuthState`]. No markup; the UI decides
//! how to render it.

use serde::Serialize;

use crate::model::Role;
use crate::service::AuthState;

/// Role-specific dashboard entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DashboardLink {
    pub label: &'static str,
    pub href: &'static str,
}

impl DashboardLink {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Client => Self {
                label: "Мой кабинет",
                href: "client-dashboard.html",
            },
            Role::Master => Self {
                label: "Кабинет мастера",
                href: "master-dashboard.html",
            },
            Role::Admin => Self {
                label: "Панель админа",
                href: "admin-dashboard.html",
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthView {
    pub signed_in: bool,
    /// Profile first name, else the email's local part.
    pub greeting_name: Option<String>,
    /// Absent until the role is known.
    pub dashboard: Option<DashboardLink>,
}

impl From<&AuthState> for AuthView {
    fn from(state: &AuthState) -> Self {
        let Some(user) = &state.current_user else {
            return Self {
                signed_in: false,
                greeting_name: None,
                dashboard: None,
            };
        };

        let first_name = state
            .profile
            .as_ref()
            .and_then(|p| p.first_name.as_deref())
            .map(str::trim)
            .filter(|name| !name.is_empty());
        let greeting_name = first_name.unwrap_or_else(|| user.email_local_part());

        Self {
            signed_in: true,
            greeting_name: Some(greeting_name.to_string()),
            dashboard: state.role.map(DashboardLink::for_role),
        }
    }
}
