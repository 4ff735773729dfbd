//! Loading retry policies from TOML or the environment.

use crate::policy::{RetryPolicy, millis_to_duration};
use serde::{Deserialize, Serialize};
use std::env::VarError;
use thiserror::Error;

/// Errors raised while loading a [`RetryConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML document could not be parsed.
    #[error("failed to parse retry config: {0}")]
    Parse(#[from] toml::de::Error),

    /// An environment variable held a value of the wrong type.
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// Raw value that failed to parse.
        value: String,
    },
}

/// Serializable retry settings.
///
/// Delays are plain signed milliseconds so configuration files can say
/// `base_delay_ms = 0` (or any negative number) to disable sleeping.
///
/// ```toml
/// max_attempts = 5
/// base_delay_ms = 200
/// exponential = true
/// ```
///
/// The attempt count is not checked here. An executor rejects
/// `max_attempts = 0` when it runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// Total number of attempts.
    pub max_attempts: u32,
    /// Delay after the first failure, in milliseconds.
    pub base_delay_ms: i64,
    /// Double the delay after every failed retry.
    pub exponential: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            exponential: false,
        }
    }
}

impl RetryConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    /// Load configuration from environment variables.
    ///
    /// This will look for:
    /// - `{prefix}_MAX_ATTEMPTS` for the attempt count
    /// - `{prefix}_BASE_DELAY_MS` for the base delay in milliseconds
    /// - `{prefix}_EXPONENTIAL` (`true`/`false`/`1`/`0`) for the backoff mode
    ///
    /// Unset variables keep their defaults.
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let max_attempts = read_env(prefix, "MAX_ATTEMPTS", |raw| raw.parse::<u32>().ok())?;
        if let Some(max_attempts) = max_attempts {
            config.max_attempts = max_attempts;
        }

        let base_delay_ms = read_env(prefix, "BASE_DELAY_MS", |raw| raw.parse::<i64>().ok())?;
        if let Some(base_delay_ms) = base_delay_ms {
            config.base_delay_ms = base_delay_ms;
        }

        if let Some(exponential) = read_env(prefix, "EXPONENTIAL", parse_flag)? {
            config.exponential = exponential;
        }

        Ok(config)
    }

    /// Convert into an executable policy.
    pub fn into_policy(self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            millis_to_duration(self.base_delay_ms),
            self.exponential,
        )
    }
}

impl From<RetryConfig> for RetryPolicy {
    fn from(config: RetryConfig) -> Self {
        config.into_policy()
    }
}

fn read_env<T>(
    prefix: &str,
    name: &str,
    parse: impl FnOnce(&str) -> Option<T>,
) -> Result<Option<T>, ConfigError> {
    let key = format!("{prefix}_{name}");
    let raw = match std::env::var(&key) {
        Ok(raw) => raw,
        Err(VarError::NotPresent) => return Ok(None),
        Err(VarError::NotUnicode(raw)) => {
            return Err(ConfigError::InvalidValue {
                key,
                value: raw.to_string_lossy().into_owned(),
            });
        }
    };

    match parse(raw.trim()) {
        Some(value) => Ok(Some(value)),
        None => Err(ConfigError::InvalidValue { key, value: raw }),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
