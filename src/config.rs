//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::domain::{IntervalParseError, IntervalTable};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL. In-memory storage is used when absent.
    pub database_url: Option<String>,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// Interval table used when scheduling reviews
    pub revision_intervals: IntervalTable,

    /// Cadence of the due-item scan
    pub reminder_scan_interval: Duration,

    /// Delivery attempts per user and cycle
    pub notify_max_attempts: u32,

    /// Pause between delivery attempts
    pub notify_retry_delay: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let database_max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS"))?;

        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let port = lookup("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("PORT"))?;

        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());

        let revision_intervals = match lookup("REVISION_INTERVALS") {
            Some(text) => IntervalTable::parse(&text)?,
            None => IntervalTable::default(),
        };

        let scan_secs: u64 = lookup("REMINDER_SCAN_INTERVAL_SECS")
            .unwrap_or_else(|| "60".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("REMINDER_SCAN_INTERVAL_SECS"))?;
        if scan_secs == 0 {
            return Err(ConfigError::InvalidValue("REMINDER_SCAN_INTERVAL_SECS"));
        }

        let notify_max_attempts: u32 = lookup("NOTIFY_MAX_ATTEMPTS")
            .unwrap_or_else(|| "6".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("NOTIFY_MAX_ATTEMPTS"))?;
        if notify_max_attempts == 0 {
            return Err(ConfigError::InvalidValue("NOTIFY_MAX_ATTEMPTS"));
        }

        let retry_delay_ms: u64 = lookup("NOTIFY_RETRY_DELAY_MS")
            .unwrap_or_else(|| "1000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("NOTIFY_RETRY_DELAY_MS"))?;

        Ok(Self {
            database_url,
            database_max_connections,
            host,
            port,
            environment,
            revision_intervals,
            reminder_scan_interval: Duration::from_secs(scan_secs),
            notify_max_attempts,
            notify_retry_delay: Duration::from_millis(retry_delay_ms),
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),

    #[error("Invalid REVISION_INTERVALS: {0}")]
    Intervals(#[from] IntervalParseError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.database_url, None);
        assert_eq!(config.database_max_connections, 10);
        assert_eq!(config.port, 3000);
        assert_eq!(config.revision_intervals, IntervalTable::default());
        assert_eq!(config.reminder_scan_interval, Duration::from_secs(60));
        assert_eq!(config.notify_max_attempts, 6);
        assert_eq!(config.notify_retry_delay, Duration::from_millis(1000));
        assert!(!config.is_production());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/revise"),
            ("PORT", "8080"),
            ("ENVIRONMENT", "production"),
            ("REVISION_INTERVALS", "1minute"),
            ("NOTIFY_MAX_ATTEMPTS", "3"),
        ])
        .unwrap();

        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/revise"));
        assert_eq!(config.port, 8080);
        assert!(config.is_production());
        assert_eq!(config.revision_intervals.next(0), chrono::Duration::minutes(1));
        assert_eq!(config.notify_max_attempts, 3);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load(&[("PORT", "not-a-port")]),
            Err(ConfigError::InvalidValue("PORT"))
        ));
        assert!(matches!(
            load(&[("NOTIFY_MAX_ATTEMPTS", "0")]),
            Err(ConfigError::InvalidValue("NOTIFY_MAX_ATTEMPTS"))
        ));
        assert!(matches!(
            load(&[("REVISION_INTERVALS", "3lightyears")]),
            Err(ConfigError::Intervals(_))
        ));
    }
}
