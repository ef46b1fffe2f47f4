use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::model::Session;

/// Access-level tag stored on a profile. Advisory: it only selects which
/// dashboard the UI offers, nothing is enforced client-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Client,
    Master,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Master => "master",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(Role::Client),
            "master" => Ok(Role::Master),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// A row of the `users` table: one per backend user id.
///
/// Built from the row object as the backend returned it. The typed fields
/// are decoded from that row; [`Profile::row`] keeps every column as sent,
/// including ones this client does not model. Serializing a profile writes
/// the row back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Profile {
    /// Backend user id this profile belongs to.
    pub id: String,
    pub email: Option<String>,
    /// None when the column is missing, null, or not a known role.
    pub role: Option<Role>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    /// RFC 3339 creation timestamp.
    pub created_at: Option<String>,
    row: Map<String, Value>,
}

impl Profile {
    /// The row as the backend returned it.
    pub fn row(&self) -> &Map<String, Value> {
        &self.row
    }
}

#[derive(Deserialize)]
struct Columns {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default, deserialize_with = "lenient_role")]
    role: Option<Role>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    created_at: Option<String>,
}

/// Null and unrecognized roles decode to None instead of failing the row.
fn lenient_role<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Role>, D::Error> {
    let raw = Value::deserialize(deserializer)?;
    Ok(raw.as_str().and_then(|s| s.parse().ok()))
}

impl TryFrom<Map<String, Value>> for Profile {
    type Error = serde_json::Error;

    fn try_from(row: Map<String, Value>) -> Result<Self, Self::Error> {
        let columns: Columns = serde_json::from_value(Value::Object(row.clone()))?;
        Ok(Self {
            id: columns.id,
            email: columns.email,
            role: columns.role,
            first_name: columns.first_name,
            last_name: columns.last_name,
            phone: columns.phone,
            created_at: columns.created_at,
            row,
        })
    }
}

impl From<Profile> for Map<String, Value> {
    fn from(profile: Profile) -> Self {
        profile.row
    }
}

/// Insert payload for a new `users` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProfile {
    pub id: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// Left out when None so the backend column default applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl NewProfile {
    /// The record created on first sign-in when no profile exists yet:
    /// default role, blank names, stamped with `now`.
    pub fn lazy(session: &Session, now: &str) -> Self {
        Self {
            id: session.user_id.clone(),
            email: session.email.clone(),
            role: Role::default(),
            first_name: Some(String::new()),
            last_name: Some(String::new()),
            phone: None,
            created_at: Some(now.to_string()),
        }
    }
}

/// Partial update of a profile. Only `Some` fields are sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.phone.is_none()
    }

    /// Apply the set fields onto a stored row, like a filtered PATCH.
    pub fn apply_to(&self, row: &mut Map<String, Value>) {
        if let Ok(Value::Object(fields)) = serde_json::to_value(self) {
            row.extend(fields);
        }
    }
}

/// Optional fields collected by the registration form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignUpDetails {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    /// Defaults to [`Role::Client`] when not given.
    #[serde(default)]
    pub role: Option<Role>,
}

impl SignUpDetails {
    /// The profile row inserted right after a successful sign-up.
    pub fn to_new_profile(&self, user_id: &str, email: &str) -> NewProfile {
        NewProfile {
            id: user_id.to_string(),
            email: email.to_string(),
            role: self.role.unwrap_or_default(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            phone: self.phone.clone(),
            created_at: None,
        }
    }
}
