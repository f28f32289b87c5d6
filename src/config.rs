//! Configuration types, populated from the environment.

use std::time::Duration;

use crate::error::ConfigError;

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind on (`CANDIDATES_PORT`).
    pub port: u16,
    /// Path of the libSQL database file (`CANDIDATES_DB_PATH`).
    pub db_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            db_path: "./data/candidates.db".to_string(),
        }
    }
}

impl ServerConfig {
    /// Read configuration from the environment, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let port = match std::env::var("CANDIDATES_PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "CANDIDATES_PORT".to_string(),
                message: format!("not a valid port: {raw}"),
            })?,
            Err(_) => defaults.port,
        };
        let db_path = std::env::var("CANDIDATES_DB_PATH").unwrap_or(defaults.db_path);
        Ok(Self { port, db_path })
    }
}

/// Worker process configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Base URL of the backend (`BACKEND_URL`).
    pub backend_url: String,
    /// Polling interval between job checks (`JOB_CHECK_INTERVAL`, seconds).
    /// Also the liveness-poll cadence while a strategy is running.
    pub job_check_interval: Duration,
    /// Log verbosity (`LOG_LEVEL`), enumerated options only.
    pub log_level: tracing::Level,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:8000".to_string(),
            job_check_interval: Duration::from_secs(10),
            log_level: tracing::Level::INFO,
        }
    }
}

impl WorkerConfig {
    /// Read configuration from the environment, falling back to defaults.
    ///
    /// Unknown `LOG_LEVEL` values fall back to `INFO` rather than erroring,
    /// matching the lenient handling of the other variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let backend_url = std::env::var("BACKEND_URL").unwrap_or(defaults.backend_url);
        let job_check_interval = match std::env::var("JOB_CHECK_INTERVAL") {
            Ok(raw) => {
                let secs: f64 = raw.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "JOB_CHECK_INTERVAL".to_string(),
                    message: format!("not a number of seconds: {raw}"),
                })?;
                if secs <= 0.0 {
                    return Err(ConfigError::InvalidValue {
                        key: "JOB_CHECK_INTERVAL".to_string(),
                        message: "interval must be positive".to_string(),
                    });
                }
                Duration::from_secs_f64(secs)
            }
            Err(_) => defaults.job_check_interval,
        };
        let log_level = std::env::var("LOG_LEVEL")
            .ok()
            .and_then(|raw| parse_log_level(&raw))
            .unwrap_or(defaults.log_level);
        Ok(Self {
            backend_url,
            job_check_interval,
            log_level,
        })
    }
}

/// Map the enumerated `LOG_LEVEL` names onto tracing levels.
fn parse_log_level(raw: &str) -> Option<tracing::Level> {
    match raw.to_ascii_uppercase().as_str() {
        "CRITICAL" | "ERROR" => Some(tracing::Level::ERROR),
        "WARNING" => Some(tracing::Level::WARN),
        "INFO" => Some(tracing::Level::INFO),
        "DEBUG" => Some(tracing::Level::DEBUG),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_parsing() {
        assert_eq!(parse_log_level("DEBUG"), Some(tracing::Level::DEBUG));
        assert_eq!(parse_log_level("critical"), Some(tracing::Level::ERROR));
        assert_eq!(parse_log_level("WARNING"), Some(tracing::Level::WARN));
        assert_eq!(parse_log_level("bogus"), None);
    }

    #[test]
    fn defaults() {
        let cfg = WorkerConfig::default();
        assert_eq!(cfg.backend_url, "http://localhost:8000");
        assert_eq!(cfg.job_check_interval, Duration::from_secs(10));
    }
}
