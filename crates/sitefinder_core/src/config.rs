//! Environment-driven core configuration.
//!
//! | Variable                     | Default                    | Description                        |
//! |------------------------------|----------------------------|------------------------------------|
//! | `SITEFINDER_DB_PATH`         | `sitefinder.sqlite3`       | SQLite database file               |
//! | `SITEFINDER_LOG_LEVEL`       | build-mode default         | trace/debug/info/warn/error        |
//! | `SITEFINDER_LOG_DIR`         | unset (file logging off)   | absolute directory for log files   |
//! | `SITEFINDER_BUSY_TIMEOUT_MS` | `5000`                     | SQLite busy timeout                |
//!
//! # Invariants
//! - Missing variables fall back to defaults; malformed values are errors.
//! - Loading never panics.

use crate::db::DEFAULT_BUSY_TIMEOUT;
use crate::logging::default_log_level;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DB_PATH_VAR: &str = "SITEFINDER_DB_PATH";
pub const LOG_LEVEL_VAR: &str = "SITEFINDER_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "SITEFINDER_LOG_DIR";
pub const BUSY_TIMEOUT_VAR: &str = "SITEFINDER_BUSY_TIMEOUT_MS";

const DEFAULT_DB_PATH: &str = "sitefinder.sqlite3";

/// Runtime configuration shared by every host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// File logging is only initialized when a directory is configured.
    pub log_dir: Option<PathBuf>,
    pub busy_timeout: Duration,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            log_level: default_log_level().to_string(),
            log_dir: None,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }
}

/// Malformed configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    pub reason: String,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {} `{}`: {}", self.key, self.value, self.reason)
    }
}

impl Error for ConfigError {}

impl CoreConfig {
    /// Loads from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let value = |key: &'static str| {
            let found = lookup(key).filter(|value| !value.trim().is_empty());
            if found.is_none() {
                info!("event=config_load module=config status=default key={key}");
            }
            found
        };

        let db_path = value(DB_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);
        let log_level = value(LOG_LEVEL_VAR)
            .map(|level| level.trim().to_ascii_lowercase())
            .unwrap_or(defaults.log_level);
        let log_dir = value(LOG_DIR_VAR).map(PathBuf::from);
        let busy_timeout = match value(BUSY_TIMEOUT_VAR) {
            Some(raw) => Duration::from_millis(parse(BUSY_TIMEOUT_VAR, &raw)?),
            None => defaults.busy_timeout,
        };

        Ok(Self {
            db_path,
            log_level,
            log_dir,
            busy_timeout,
        })
    }
}

fn parse<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim().parse::<T>().map_err(|err| ConfigError {
        key,
        value: raw.to_string(),
        reason: err.to_string(),
    })
}
