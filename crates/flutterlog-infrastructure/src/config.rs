//! Application configuration loaded from `config.toml`.
//!
//! ```toml
//! storage_dir = "/var/lib/flutterlog"   # optional, defaults to the data dir
//! default_user = "alice"                # optional
//! seed_demo_data = false
//! log_level = "info"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use flutterlog_core::FlutterlogError;
use flutterlog_core::session::UserSession;
use serde::Deserialize;
use tracing::debug;

use crate::paths::{FlutterlogPaths, PathError};

/// Environment variable that overrides `default_user`.
pub const USER_ENV_VAR: &str = "FLUTTERLOG_USER";

/// Errors that can occur while loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// File I/O error.
    IoError(std::io::Error),
    /// TOML parsing error.
    TomlParseError(toml::de::Error),
    /// Platform directory could not be resolved.
    PathError(PathError),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "I/O error: {}", e),
            ConfigError::TomlParseError(e) => write!(f, "TOML parse error: {}", e),
            ConfigError::PathError(e) => write!(f, "Path error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::IoError(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::TomlParseError(e)
    }
}

impl From<PathError> for ConfigError {
    fn from(e: PathError) -> Self {
        ConfigError::PathError(e)
    }
}

impl From<ConfigError> for FlutterlogError {
    fn from(e: ConfigError) -> Self {
        FlutterlogError::config(e.to_string())
    }
}

/// Root configuration. Every field has a default, so an empty or missing
/// file is a valid configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AppConfig {
    /// Base directory of the file-backed store
    #[serde(default)]
    pub storage_dir: Option<PathBuf>,
    /// User id used when none is given on the command line or in the environment
    #[serde(default)]
    pub default_user: Option<String>,
    /// Seed the demonstration records into an empty history on open
    #[serde(default)]
    pub seed_demo_data: bool,
    /// Default tracing filter directive
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_dir: None,
            default_user: None,
            seed_demo_data: false,
            log_level: default_log_level(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from `path`.
    ///
    /// # Returns
    ///
    /// - `Ok(AppConfig::default())`: file doesn't exist or is empty
    /// - `Ok(config)`: parsed configuration
    /// - `Err`: failed to read or parse the file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!("[Config] {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Self = toml::from_str(&content)?;
        debug!("[Config] Loaded {}", path.display());
        Ok(config)
    }

    /// Loads configuration from the platform config file.
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load_from(&FlutterlogPaths::config_file()?)
    }

    /// Returns the configured store directory, or the platform default.
    pub fn resolved_storage_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.storage_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(FlutterlogPaths::store_dir()?),
        }
    }

    /// Picks the session user: explicit argument, then `env_user`, then
    /// `default_user`. Blank values are skipped.
    pub fn session_for(&self, explicit: Option<&str>, env_user: Option<&str>) -> UserSession {
        let chosen = [explicit, env_user, self.default_user.as_deref()]
            .into_iter()
            .flatten()
            .find(|candidate| !candidate.trim().is_empty());
        UserSession::from_raw(chosen)
    }

    /// Like [`AppConfig::session_for`], reading `FLUTTERLOG_USER` from the environment.
    pub fn resolve_session(&self, explicit: Option<&str>) -> UserSession {
        let env_user = std::env::var(USER_ENV_VAR).ok();
        self.session_for(explicit, env_user.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = AppConfig::load_from(&temp_dir.path().join("config.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "default_user = \"alice\"\nseed_demo_data = true\n").unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.default_user.as_deref(), Some("alice"));
        assert!(config.seed_demo_data);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.storage_dir, None);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "seed_demo_data = \"sometimes\"").unwrap();

        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TomlParseError(_)));
        let converted: FlutterlogError = err.into();
        assert!(matches!(converted, FlutterlogError::Config(_)));
    }

    #[test]
    fn test_explicit_storage_dir_wins() {
        let config = AppConfig {
            storage_dir: Some(PathBuf::from("/tmp/flutterlog-test")),
            ..AppConfig::default()
        };
        assert_eq!(
            config.resolved_storage_dir().unwrap(),
            PathBuf::from("/tmp/flutterlog-test")
        );
    }

    #[test]
    fn test_session_precedence() {
        let config = AppConfig {
            default_user: Some("from-config".to_string()),
            ..AppConfig::default()
        };

        let session = config.session_for(Some("cli"), Some("env"));
        assert_eq!(session.user_id().unwrap().as_str(), "cli");

        let session = config.session_for(None, Some("env"));
        assert_eq!(session.user_id().unwrap().as_str(), "env");

        let session = config.session_for(Some("  "), None);
        assert_eq!(session.user_id().unwrap().as_str(), "from-config");

        assert!(!AppConfig::default().session_for(None, None).is_authenticated());
    }
}
