//! Core runtime configuration.
//!
//! Resolved once when the host opens the core and passed down from there;
//! nothing below this module reads the environment.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Environment variable holding the database path.
pub const ENV_DATABASE_PATH: &str = "DENTAL_PLAN_DB";
/// Environment variable holding the order currency code.
pub const ENV_CURRENCY: &str = "DENTAL_PLAN_CURRENCY";
/// Environment variable holding the tracing filter.
pub const ENV_LOG_FILTER: &str = "DENTAL_PLAN_LOG";

pub const DEFAULT_CURRENCY: &str = "RUB";
pub const DEFAULT_LOG_FILTER: &str = "dental_plan_core=info";

/// Configuration errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidInput(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Core configuration resolved at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoreConfig {
    database_path: Option<PathBuf>,
    currency: String,
    log_filter: String,
}

impl CoreConfig {
    /// Create a new `CoreConfig`. A `None` path means an in-memory database.
    pub fn new(
        database_path: Option<PathBuf>,
        currency: String,
        log_filter: String,
    ) -> ConfigResult<Self> {
        let currency = currency.trim().to_uppercase();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ConfigError::InvalidInput(format!(
                "currency must be a 3-letter code, got {:?}",
                currency
            )));
        }
        if log_filter.trim().is_empty() {
            return Err(ConfigError::InvalidInput("log filter cannot be empty".into()));
        }

        Ok(Self {
            database_path,
            currency,
            log_filter,
        })
    }

    /// In-memory database with default currency and log filter.
    pub fn in_memory() -> Self {
        Self {
            database_path: None,
            currency: DEFAULT_CURRENCY.to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }

    /// Resolve from `DENTAL_PLAN_DB`, `DENTAL_PLAN_CURRENCY` and `DENTAL_PLAN_LOG`.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve from an arbitrary key lookup; unset keys fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let database_path = lookup(ENV_DATABASE_PATH)
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);
        let currency = lookup(ENV_CURRENCY).unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
        let log_filter =
            lookup(ENV_LOG_FILTER).unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
        Self::new(database_path, currency, log_filter)
    }

    pub fn database_path(&self) -> Option<&Path> {
        self.database_path.as_deref()
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = CoreConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, CoreConfig::in_memory());
        assert!(config.database_path().is_none());
        assert_eq!(config.currency(), "RUB");
    }

    #[test]
    fn test_lookup_values() {
        let vars = HashMap::from([
            (ENV_DATABASE_PATH, "/tmp/plans.db".to_string()),
            (ENV_CURRENCY, "eur".to_string()),
            (ENV_LOG_FILTER, "debug".to_string()),
        ]);
        let config = CoreConfig::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.database_path(), Some(Path::new("/tmp/plans.db")));
        assert_eq!(config.currency(), "EUR");
        assert_eq!(config.log_filter(), "debug");
    }

    #[test]
    fn test_invalid_currency() {
        let result = CoreConfig::new(None, "rubles".into(), "info".into());
        assert!(matches!(result, Err(ConfigError::InvalidInput(_))));
    }

    #[test]
    fn test_empty_log_filter() {
        let result = CoreConfig::new(None, "USD".into(), "  ".into());
        assert!(result.is_err());
    }
}
