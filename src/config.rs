//! Client configuration.
//!
//! Resolved in layers: built-in defaults, then `config.json` in the user's
//! config directory, then environment variables:
//! - `DRAFTDESK_URL` - Base URL of the document service (default: `http://localhost:8000/api`)
//! - `DRAFTDESK_TOKEN` - Session token sent as a bearer credential
//! - `DRAFTDESK_DOWNLOAD_DIR` - Where exports are saved (default: the user's download directory)
//! - `DRAFTDESK_TIMEOUT_SECS` - Per-request timeout; unset means the transport default

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};

use crate::client::{ClientError, Credentials, DocumentClient, DEFAULT_URL};

const APP_NAME: &str = "draftdesk";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Base URL of the document service, including the `/api` prefix.
    pub base_url: String,
    /// Session token obtained at login.
    pub token: Option<String>,
    /// Directory exports are written to.
    pub download_dir: PathBuf,
    /// Per-request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_URL.to_string(),
            token: None,
            download_dir: dirs::download_dir()
                .or_else(|| std::env::current_dir().ok())
                .unwrap_or_else(|| PathBuf::from(".")),
            timeout_secs: None,
        }
    }
}

impl EditorConfig {
    /// Load configuration from the config file and environment.
    /// A missing or unreadable file falls back to defaults.
    pub fn load() -> Self {
        let base = match get_config_path().and_then(|path| Self::from_file(&path)) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }
        };
        base.with_env(|key| std::env::var(key).ok())
    }

    /// Read a config file, returning defaults if it doesn't exist.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config = serde_json::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (normally the process environment).
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("DRAFTDESK_URL") {
            self.base_url = url;
        }
        if let Some(token) = lookup("DRAFTDESK_TOKEN").filter(|t| !t.is_empty()) {
            self.token = Some(token);
        }
        if let Some(dir) = lookup("DRAFTDESK_DOWNLOAD_DIR") {
            self.download_dir = PathBuf::from(dir);
        }
        if let Some(secs) = lookup("DRAFTDESK_TIMEOUT_SECS") {
            match secs.parse() {
                Ok(secs) => self.timeout_secs = Some(secs),
                Err(_) => tracing::warn!("Ignoring invalid DRAFTDESK_TIMEOUT_SECS: {}", secs),
            }
        }
        self
    }

    pub fn credentials(&self) -> Credentials {
        match self.token {
            Some(ref token) => Credentials::bearer(token.clone()),
            None => Credentials::anonymous(),
        }
    }

    /// Build the HTTP client described by this configuration.
    pub fn client(&self) -> Result<DocumentClient, ClientError> {
        match self.timeout_secs {
            Some(secs) => DocumentClient::with_timeout(
                self.base_url.clone(),
                self.credentials(),
                Duration::from_secs(secs),
            ),
            None => Ok(DocumentClient::new(self.base_url.clone(), self.credentials())),
        }
    }
}

fn get_config_path() -> Result<PathBuf> {
    let mut path =
        config_dir().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    path.push(APP_NAME);
    path.push(CONFIG_FILE);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = EditorConfig::from_file(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.base_url, DEFAULT_URL);
        assert!(config.token.is_none());
    }

    #[test]
    fn file_values_fill_in_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "base_url": "https://docs.example.com/api", "timeout_secs": 30 }"#)
            .unwrap();

        let config = EditorConfig::from_file(&path).unwrap();
        assert_eq!(config.base_url, "https://docs.example.com/api");
        assert_eq!(config.timeout_secs, Some(30));
        assert!(config.token.is_none());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(EditorConfig::from_file(&path).is_err());
    }

    #[test]
    fn environment_overrides_file() {
        let env: HashMap<&str, &str> = [
            ("DRAFTDESK_URL", "http://10.0.0.5:8000/api"),
            ("DRAFTDESK_TOKEN", "abc"),
            ("DRAFTDESK_DOWNLOAD_DIR", "/tmp/exports"),
            ("DRAFTDESK_TIMEOUT_SECS", "soon"),
        ]
        .into_iter()
        .collect();

        let config = EditorConfig::default().with_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.base_url, "http://10.0.0.5:8000/api");
        assert_eq!(config.credentials().token(), Some("abc"));
        assert_eq!(config.download_dir, PathBuf::from("/tmp/exports"));
        assert_eq!(config.timeout_secs, None);
    }
}
