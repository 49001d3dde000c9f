//! Runtime configuration resolved from the environment.
//!
//! # Responsibility
//! - Resolve database path, log level and log directory for hosts (CLI/FFI).
//!
//! # Invariants
//! - Unset or blank variables fall back to defaults.
//! - A configured log level is validated eagerly; a bad value is an error,
//!   never a silent fallback.

use crate::logging::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "RECIPEBOX_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "RECIPEBOX_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "RECIPEBOX_LOG_DIR";

const APP_DIR_NAME: &str = "recipebox";
const DB_FILE_NAME: &str = "recipebox.sqlite3";
const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "warning", "error"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnsupportedLogLevel(String),
    RelativeLogDir(PathBuf),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedLogLevel(level) => write!(
                f,
                "{LOG_LEVEL_ENV} has unsupported value `{level}`; expected trace|debug|info|warn|error"
            ),
            Self::RelativeLogDir(path) => write!(
                f,
                "{LOG_DIR_ENV} must be an absolute path, got `{}`",
                path.display()
            ),
        }
    }
}

impl Error for ConfigError {}

/// Host configuration for opening storage and starting logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// File logging is disabled when `None`.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        if let Some(path) = read(DB_PATH_ENV) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(level) = read(LOG_LEVEL_ENV) {
            let lowered = level.to_ascii_lowercase();
            if !LOG_LEVELS.contains(&lowered.as_str()) {
                return Err(ConfigError::UnsupportedLogLevel(level));
            }
            config.log_level = lowered;
        }
        if let Some(dir) = read(LOG_DIR_ENV) {
            let dir = PathBuf::from(dir);
            if !dir.is_absolute() {
                return Err(ConfigError::RelativeLogDir(dir));
            }
            config.log_dir = Some(dir);
        }
        Ok(config)
    }
}

/// `<data_dir>/recipebox/recipebox.sqlite3`, or the temp dir when the
/// platform has no data directory.
pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
        .join(DB_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::{default_db_path, ConfigError, CoreConfig, DB_PATH_ENV, LOG_DIR_ENV, LOG_LEVEL_ENV};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = CoreConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, CoreConfig::default());
        assert!(config.db_path.ends_with("recipebox/recipebox.sqlite3"));
        assert_eq!(config.db_path, default_db_path());
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn environment_values_override_defaults() {
        let log_dir = std::env::temp_dir().join("recipebox-logs");
        let config = CoreConfig::from_lookup(lookup(&[
            (DB_PATH_ENV, " /tmp/custom.sqlite3 "),
            (LOG_LEVEL_ENV, "WARN"),
            (LOG_DIR_ENV, log_dir.to_str().unwrap()),
        ]))
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/tmp/custom.sqlite3"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, Some(log_dir));
    }

    #[test]
    fn blank_values_are_treated_as_unset() {
        let config = CoreConfig::from_lookup(lookup(&[(DB_PATH_ENV, "   "), (LOG_DIR_ENV, "")]))
            .unwrap();
        assert_eq!(config, CoreConfig::default());
    }

    #[test]
    fn invalid_level_and_relative_log_dir_are_rejected() {
        assert_eq!(
            CoreConfig::from_lookup(lookup(&[(LOG_LEVEL_ENV, "loud")])),
            Err(ConfigError::UnsupportedLogLevel("loud".to_string()))
        );
        assert_eq!(
            CoreConfig::from_lookup(lookup(&[(LOG_DIR_ENV, "logs")])),
            Err(ConfigError::RelativeLogDir(PathBuf::from("logs")))
        );
    }
}
