use serde_json::{Map, Value};

use crate::model::Profile;

/// Default storage key of the local mirror.
pub const MIRROR_KEY: &str = "userData";

/// Build the denormalized mirror document for a loaded profile.
///
/// Starts from `{id, email, role}` and overlays the row exactly as the
/// backend returned it. A column present in the row wins on key collision,
/// null included; a column the row does not carry leaves the base value.
pub fn mirror_record(user_id: &str, email: &str, profile: &Profile) -> Map<String, Value> {
    let role = match profile.role {
        Some(role) => Value::String(role.as_str().to_string()),
        None => Value::Null,
    };

    let mut doc = Map::new();
    doc.insert("id".into(), Value::String(user_id.to_string()));
    doc.insert("email".into(), Value::String(email.to_string()));
    doc.insert("role".into(), role);
    doc.extend(profile.row().clone());
    doc
}
