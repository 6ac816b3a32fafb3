//! Configuration management for the festival client.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Unlike a silent fallback, a variable that is set but does not parse is an
//! error: a typo in `FESTIVAL_RETRY_MAX` should not quietly mean "3".

use festival_runtime::RetryPolicy;
use std::env;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default base endpoint.
pub const DEFAULT_API_BASE: &str = "http://localhost:8000/api/v1";

/// Configuration errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was set to a value that does not parse.
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue {
        /// Variable name
        var: &'static str,
        /// Raw value
        value: String,
    },
}

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base endpoint all logical paths are resolved against
    pub api_base: String,
    /// Bearer token attached to every call, if any
    pub api_token: Option<String>,
    /// Per-request timeout
    pub http_timeout: Duration,
    /// Retry policy for every call
    pub retry: RetryPolicy,
    /// Channel tag used by previews
    pub reserve_channel: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_token: None,
            http_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            reserve_channel: crate::client::DEFAULT_CHANNEL.to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if a numeric variable is set but
    /// does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load configuration through `lookup` instead of the process
    /// environment.
    ///
    /// # Errors
    ///
    /// Same as [`ClientConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let retry = RetryPolicy::builder()
            .max_retries(parsed(&lookup, "FESTIVAL_RETRY_MAX")?.unwrap_or(defaults.retry.max_retries))
            .initial_delay(
                parsed(&lookup, "FESTIVAL_RETRY_INITIAL_DELAY_MS")?
                    .map_or(defaults.retry.initial_delay, Duration::from_millis),
            )
            .max_delay(
                parsed(&lookup, "FESTIVAL_RETRY_MAX_DELAY_MS")?
                    .map_or(defaults.retry.max_delay, Duration::from_millis),
            )
            .build();

        Ok(Self {
            api_base: lookup("FESTIVAL_API_BASE").unwrap_or(defaults.api_base),
            api_token: lookup("FESTIVAL_API_TOKEN").filter(|token| !token.is_empty()),
            http_timeout: parsed(&lookup, "FESTIVAL_HTTP_TIMEOUT_SECS")?
                .map_or(defaults.http_timeout, Duration::from_secs),
            retry,
            reserve_channel: lookup("FESTIVAL_RESERVE_CHANNEL").unwrap_or(defaults.reserve_channel),
        })
    }
}

fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    lookup(var)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue { var, value })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = ClientConfig::from_lookup(|_| None).unwrap();

        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.api_base, "http://localhost:8000/api/v1");
        assert_eq!(config.api_token, None);
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.initial_delay, Duration::from_millis(100));
        assert_eq!(config.reserve_channel, "web");
    }

    #[test]
    fn test_overrides_applied() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("FESTIVAL_API_BASE", "https://fest.example/api/v1"),
            ("FESTIVAL_API_TOKEN", "tok"),
            ("FESTIVAL_HTTP_TIMEOUT_SECS", "5"),
            ("FESTIVAL_RETRY_MAX", "1"),
            ("FESTIVAL_RETRY_INITIAL_DELAY_MS", "10"),
            ("FESTIVAL_RETRY_MAX_DELAY_MS", "50"),
            ("FESTIVAL_RESERVE_CHANNEL", "box-office"),
        ]))
        .unwrap();

        assert_eq!(config.api_base, "https://fest.example/api/v1");
        assert_eq!(config.api_token.as_deref(), Some("tok"));
        assert_eq!(config.http_timeout, Duration::from_secs(5));
        assert_eq!(config.retry.max_retries, 1);
        assert_eq!(config.retry.initial_delay, Duration::from_millis(10));
        assert_eq!(config.retry.max_delay, Duration::from_millis(50));
        assert_eq!(config.reserve_channel, "box-office");
    }

    #[test]
    fn test_empty_token_means_no_credential() {
        let config = ClientConfig::from_lookup(lookup_from(&[("FESTIVAL_API_TOKEN", "")])).unwrap();
        assert_eq!(config.api_token, None);
    }

    #[test]
    fn test_unparseable_number_is_an_error() {
        let result = ClientConfig::from_lookup(lookup_from(&[("FESTIVAL_RETRY_MAX", "three")]));

        assert_eq!(
            result,
            Err(ConfigError::InvalidValue {
                var: "FESTIVAL_RETRY_MAX",
                value: "three".to_string()
            })
        );
    }
}
