//! Server configuration loaded from `WORKTALLY_*` environment variables.
//!
//! # Responsibility
//! - Resolve port, database path, uploads directory, public base URL and
//!   logging settings, with working defaults for local runs.
//!
//! # Invariants
//! - `log_dir` is always absolute; core logging rejects relative paths.
//! - `base_url` carries no trailing slash.

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use worktally_core::default_log_level;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: `{value}` ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("cannot resolve working directory: {0}")]
    WorkingDir(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct Config {
    /// TCP port the HTTP listener binds on.
    pub port: u16,
    /// SQLite database file path.
    pub db_path: PathBuf,
    /// Directory where uploaded files are stored and served from.
    pub uploads_dir: PathBuf,
    /// Public origin used to build upload URLs, no trailing slash.
    pub base_url: String,
    /// Absolute directory for rotated log files.
    pub log_dir: PathBuf,
    /// Log level handed to core logging.
    pub log_level: String,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let port: u16 = parse_var("WORKTALLY_PORT", "4000")?;
        let db_path = PathBuf::from(var_or("WORKTALLY_DB_PATH", "worktally.db"));
        let uploads_dir = PathBuf::from(var_or("WORKTALLY_UPLOADS_DIR", "uploads"));
        let base_url = env::var("WORKTALLY_BASE_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_string();
        let log_dir = absolutize(PathBuf::from(var_or("WORKTALLY_LOG_DIR", "logs")))?;
        let log_level = var_or("WORKTALLY_LOG_LEVEL", default_log_level());

        Ok(Self {
            port,
            db_path,
            uploads_dir,
            base_url,
            log_dir,
            log_level,
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_var<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let raw = var_or(key, default);
    parse_value(key, raw)
}

fn parse_value<T: FromStr>(key: &'static str, raw: String) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    match raw.parse() {
        Ok(value) => Ok(value),
        Err(err) => Err(ConfigError::InvalidValue {
            key,
            value: raw,
            reason: err.to_string(),
        }),
    }
}

fn absolutize(path: PathBuf) -> Result<PathBuf, ConfigError> {
    if path.is_absolute() {
        return Ok(path);
    }
    Ok(env::current_dir()?.join(path))
}

#[cfg(test)]
mod tests {
    use super::{absolutize, parse_value, ConfigError};
    use std::path::PathBuf;

    #[test]
    fn parse_value_accepts_valid_numbers() {
        let port: u16 = parse_value("WORKTALLY_PORT", "4000".to_string()).unwrap();
        assert_eq!(port, 4000);
    }

    #[test]
    fn parse_value_reports_key_and_raw_input() {
        let err = parse_value::<u16>("WORKTALLY_PORT", "not-a-port".to_string()).unwrap_err();
        match err {
            ConfigError::InvalidValue { key, value, .. } => {
                assert_eq!(key, "WORKTALLY_PORT");
                assert_eq!(value, "not-a-port");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn absolutize_keeps_absolute_paths_untouched() {
        let path = PathBuf::from("/var/log/worktally");
        assert_eq!(absolutize(path.clone()).unwrap(), path);
    }

    #[test]
    fn absolutize_anchors_relative_paths() {
        let resolved = absolutize(PathBuf::from("logs")).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("logs"));
    }
}
