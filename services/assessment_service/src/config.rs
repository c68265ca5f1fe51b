use core::fmt;
use std::env;
use std::num::ParseIntError;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::admission::RateLimitConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextKey {
    DatabasePath,
    RateLimitRate,
    RateLimitWindowSecs,
    RateLimitSweepSecs,
    LogFilter,
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            &Self::DatabasePath => write!(f, "ASSESSMENT_DATABASE_PATH"),
            &Self::RateLimitRate => write!(f, "RATE_LIMIT_RATE"),
            &Self::RateLimitWindowSecs => write!(f, "RATE_LIMIT_WINDOW_SECS"),
            &Self::RateLimitSweepSecs => write!(f, "RATE_LIMIT_SWEEP_SECS"),
            &Self::LogFilter => write!(f, "LOG_FILTER"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} is not a valid number: {source}")]
    Malformed { key: ContextKey, source: ParseIntError },

    #[error("{key} must be at least 1.")]
    Zero { key: ContextKey },

    #[error("{key} is larger than {max}.")]
    OutOfRange { key: ContextKey, max: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// `:memory:` keeps everything in an ephemeral in-process database.
    pub database_path: PathBuf,
    pub rate_limit: RateLimitConfig,
    pub sweep_interval: Duration,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_path: PathBuf::from(":memory:"),
            rate_limit: RateLimitConfig::default(),
            sweep_interval: Duration::from_secs(60),
            log_filter: "info".to_owned(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key.to_string()).ok())
    }

    /// Builds the configuration from an arbitrary key source. Unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(ContextKey) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let positive = |key: ContextKey, default: u64| -> Result<u64, ConfigError> {
            let value = match lookup(key) {
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .map_err(|source| ConfigError::Malformed { key, source })?,
                None => return Ok(default),
            };
            if value == 0 {
                return Err(ConfigError::Zero { key });
            }
            Ok(value)
        };

        let rate = positive(ContextKey::RateLimitRate, u64::from(defaults.rate_limit.rate))?;
        let rate = u32::try_from(rate).map_err(|_| ConfigError::OutOfRange {
            key: ContextKey::RateLimitRate,
            max: u64::from(u32::MAX),
        })?;
        let window = positive(ContextKey::RateLimitWindowSecs, defaults.rate_limit.window.as_secs())?;
        let sweep = positive(ContextKey::RateLimitSweepSecs, defaults.sweep_interval.as_secs())?;

        Ok(Config {
            database_path: lookup(ContextKey::DatabasePath)
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),
            rate_limit: RateLimitConfig {
                rate,
                window: Duration::from_secs(window),
            },
            sweep_interval: Duration::from_secs(sweep),
            log_filter: lookup(ContextKey::LogFilter).unwrap_or(defaults.log_filter),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(ContextKey, &str)]) -> impl Fn(ContextKey) -> Option<String> {
        let map: HashMap<ContextKey, String> = pairs.iter().map(|(k, v)| (*k, v.to_string())).collect();
        move |key| map.get(&key).cloned()
    }

    #[test]
    fn unset_keys_fall_back_to_defaults() {
        assert_eq!(Config::from_lookup(lookup(&[])).unwrap(), Config::default());
    }

    #[test]
    fn values_are_read_from_keys() {
        let config = Config::from_lookup(lookup(&[
            (ContextKey::DatabasePath, "/var/lib/assessments.db"),
            (ContextKey::RateLimitRate, "5"),
            (ContextKey::RateLimitWindowSecs, " 1 "),
            (ContextKey::LogFilter, "debug"),
        ]))
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/var/lib/assessments.db"));
        assert_eq!(config.rate_limit.rate, 5);
        assert_eq!(config.rate_limit.window, Duration::from_secs(1));
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn malformed_number_names_the_key() {
        let err = Config::from_lookup(lookup(&[(ContextKey::RateLimitSweepSecs, "soon")])).unwrap_err();
        assert!(err.to_string().starts_with("RATE_LIMIT_SWEEP_SECS"));
    }

    #[test]
    fn zero_window_is_rejected() {
        let err = Config::from_lookup(lookup(&[(ContextKey::RateLimitWindowSecs, "0")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Zero {
                key: ContextKey::RateLimitWindowSecs
            }
        );
    }

    #[test]
    fn rate_above_u32_is_rejected() {
        let err = Config::from_lookup(lookup(&[(ContextKey::RateLimitRate, "4294967296")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::OutOfRange {
                key: ContextKey::RateLimitRate,
                max: 4_294_967_295,
            }
        );
        assert!(err.to_string().starts_with("RATE_LIMIT_RATE"));
    }
}
