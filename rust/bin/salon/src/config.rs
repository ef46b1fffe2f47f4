//! Client configuration.
//!
//! Reads `~/.salon/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use salon_auth::{AuthConfig, HttpConfig};

/// Hosted backend connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSection {
    /// Project URL (e.g. "https://abcd.supabase.co").
    pub url: String,

    /// Public anon key.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub anon_key: String,
}

impl Default for BackendSection {
    fn default() -> Self {
        Self {
            url: HttpConfig::default().url,
            anon_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// redb file holding the session and the user mirror.
    /// Defaults to `~/.salon/storage.redb`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSection {
    pub mirror_key: String,
    pub entry_point: String,
}

impl Default for AuthSection {
    fn default() -> Self {
        let defaults = AuthConfig::default();
        Self {
            mirror_key: defaults.mirror_key,
            entry_point: defaults.entry_point,
        }
    }
}

/// Client configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub backend: BackendSection,
    pub storage: StorageSection,
    pub auth: AuthSection,
}

impl ClientConfig {
    /// Default config file path: ~/.salon/config.toml.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }

    /// Load config from disk, or return default if file doesn't exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("invalid config {}: {}", path.display(), e))?;
        Ok(config)
    }

    pub fn storage_path(&self) -> PathBuf {
        self.storage
            .path
            .clone()
            .unwrap_or_else(|| dirs_path().join("storage.redb"))
    }

    pub fn http_config(&self) -> HttpConfig {
        HttpConfig::new(self.backend.url.as_str(), self.backend.anon_key.as_str())
    }

    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            mirror_key: self.auth.mirror_key.clone(),
            entry_point: self.auth.entry_point.clone(),
        }
    }
}

/// Return the salon config directory (~/.salon).
fn dirs_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".salon")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.backend.url, "http://localhost:54321");
        assert!(config.backend.anon_key.is_empty());
        assert_eq!(config.auth.mirror_key, "userData");
        assert_eq!(config.auth.entry_point, "index.html");
        assert!(config.storage_path().ends_with(".salon/storage.redb"));
    }

    #[test]
    fn test_partial_file() {
        let config: ClientConfig = toml::from_str(
            r#"
            [backend]
            url = "https://abcd.supabase.co/"
            anon_key = "anon"
            "#,
        )
        .unwrap();
        assert_eq!(config.auth.mirror_key, "userData");

        let http = config.http_config();
        assert_eq!(http.url, "https://abcd.supabase.co");
        assert_eq!(http.anon_key, "anon");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert!(config.storage.path.is_none());
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[storage]\npath = \"/tmp/salon.redb\"\n\n[auth]\nmirror_key = \"salonUser\"\n",
        )
        .unwrap();

        let config = ClientConfig::load(&path).unwrap();
        assert_eq!(config.storage_path(), PathBuf::from("/tmp/salon.redb"));
        assert_eq!(config.auth_config().mirror_key, "salonUser");
        assert_eq!(config.auth_config().entry_point, "index.html");
    }

    #[test]
    fn test_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[backend\nurl = 1").unwrap();
        assert!(ClientConfig::load(&path).is_err());
    }
}
