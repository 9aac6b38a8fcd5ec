//! Runtime configuration.
//!
//! Settings merge lowest to highest: built-in defaults, an optional YAML
//! config file, environment variables, then CLI overrides applied by main.
//! The loaded `Config` is passed by reference to the components that need
//! it; there is no process-wide global.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Default port for the HTTP API.
pub const DEFAULT_PORT: u16 = 8000;

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// ntfy topic for reminder delivery. Reserved; nothing publishes to it yet.
    #[serde(default)]
    pub ntfy_topic: String,

    /// Port for the HTTP API (default: 8000).
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path to the SQLite database file (default: tasks.db).
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Origins allowed to call the API with credentials.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ntfy_topic: String::new(),
            port: default_port(),
            db_path: default_db_path(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_db_path() -> String {
    "tasks.db".to_string()
}

fn default_allowed_origins() -> Vec<String> {
    [
        "http://127.0.0.1:8000",
        "http://localhost:9000",
        "https://localhost:9000",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Apply environment variable overrides (`TASK_RECUR_*`).
    pub fn apply_env(&mut self) {
        if let Ok(topic) = std::env::var("TASK_RECUR_NTFY_TOPIC") {
            self.ntfy_topic = topic;
        }
        if let Ok(port) = std::env::var("TASK_RECUR_PORT") {
            match port.parse() {
                Ok(p) => self.port = p,
                Err(_) => warn!("Ignoring invalid TASK_RECUR_PORT: {}", port),
            }
        }
        if let Ok(db_path) = std::env::var("TASK_RECUR_DB_PATH") {
            self.db_path = db_path;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.ntfy_topic, "");
        assert_eq!(config.port, 8000);
        assert_eq!(config.db_path, "tasks.db");
        assert!(!config.allowed_origins.is_empty());
    }

    #[test]
    fn load_fills_missing_fields_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        writeln!(file, "port: 9100").expect("Failed to write config");

        let config = Config::load(file.path()).expect("Failed to load config");

        assert_eq!(config.port, 9100);
        assert_eq!(config.db_path, "tasks.db");
    }

    #[test]
    fn load_rejects_malformed_yaml() {
        let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
        writeln!(file, "port: [not a number").expect("Failed to write config");

        assert!(Config::load(file.path()).is_err());
    }

    #[test]
    fn env_overrides_file_values() {
        // SAFETY: test-local env mutation; keys are unique to this test
        unsafe {
            std::env::set_var("TASK_RECUR_PORT", "9200");
            std::env::set_var("TASK_RECUR_NTFY_TOPIC", "reminders");
        }

        let mut config = Config::default();
        config.apply_env();

        assert_eq!(config.port, 9200);
        assert_eq!(config.ntfy_topic, "reminders");

        unsafe {
            std::env::remove_var("TASK_RECUR_PORT");
            std::env::remove_var("TASK_RECUR_NTFY_TOPIC");
        }
    }

    #[test]
    fn env_db_path_override_applies() {
        // SAFETY: test-local env mutation; key is unique to this test
        unsafe {
            std::env::set_var("TASK_RECUR_DB_PATH", "/tmp/other.db");
        }

        let mut config = Config::default();
        config.apply_env();

        assert_eq!(config.db_path, "/tmp/other.db");

        unsafe {
            std::env::remove_var("TASK_RECUR_DB_PATH");
        }
    }
}
