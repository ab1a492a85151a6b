use std::env;
use std::time::Duration;

use crate::domain::money::Money;
use crate::utils::RetryConfig;

// ============================================================================
// Application Configuration
// ============================================================================
//
// Environment variables (all optional):
//   BANK_LOG_FILTER              tracing filter, e.g. "info,bank_account=debug"
//   BANK_RETRY_MAX_ATTEMPTS      attempts per storage call, >= 1
//   BANK_RETRY_INITIAL_DELAY_MS  first backoff delay in milliseconds
//   BANK_DEMO_OVERDRAFT          overdraft of the demo current account, <= 0
//   BANK_DEMO_CEILING            ceiling of the demo savings account, > 0
//
// ============================================================================

pub const DEFAULT_LOG_FILTER: &str = "info,bank_account=debug";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub log_filter: String,
    pub retry: RetryConfig,
    pub demo_overdraft: Money,
    pub demo_ceiling: Money,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            retry: RetryConfig::default(),
            demo_overdraft: Money::from(-100),
            demo_ceiling: Money::from(1_000),
        }
    }
}

impl AppConfig {
    /// Read the process environment; call `dotenv` first to pick up `.env`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup, missing keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(filter) = lookup("BANK_LOG_FILTER").filter(|v| !v.trim().is_empty()) {
            config.log_filter = filter;
        }

        if let Some(raw) = lookup("BANK_RETRY_MAX_ATTEMPTS") {
            let attempts: u32 = parse_number("BANK_RETRY_MAX_ATTEMPTS", &raw)?;
            if attempts == 0 {
                return Err(invalid("BANK_RETRY_MAX_ATTEMPTS", &raw, "must be at least 1"));
            }
            config.retry = config.retry.with_max_attempts(attempts);
        }

        if let Some(raw) = lookup("BANK_RETRY_INITIAL_DELAY_MS") {
            let millis: u64 = parse_number("BANK_RETRY_INITIAL_DELAY_MS", &raw)?;
            config.retry = config.retry.with_initial_delay(Duration::from_millis(millis));
        }

        if let Some(raw) = lookup("BANK_DEMO_OVERDRAFT") {
            let overdraft = parse_money("BANK_DEMO_OVERDRAFT", &raw)?;
            if overdraft.is_positive() {
                return Err(invalid("BANK_DEMO_OVERDRAFT", &raw, "must be zero or negative"));
            }
            config.demo_overdraft = overdraft;
        }

        if let Some(raw) = lookup("BANK_DEMO_CEILING") {
            let ceiling = parse_money("BANK_DEMO_CEILING", &raw)?;
            if !ceiling.is_positive() {
                return Err(invalid("BANK_DEMO_CEILING", &raw, "must be strictly positive"));
            }
            config.demo_ceiling = ceiling;
        }

        Ok(config)
    }
}

fn invalid(key: &'static str, value: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: reason.into(),
    }
}

fn parse_number<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| invalid(key, raw, e.to_string()))
}

fn parse_money(key: &'static str, raw: &str) -> Result<Money, ConfigError> {
    Money::parse(raw).map_err(|e| invalid(key, raw, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.log_filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_values_are_read() {
        let config = AppConfig::from_lookup(lookup(&[
            ("BANK_LOG_FILTER", "warn"),
            ("BANK_RETRY_MAX_ATTEMPTS", "5"),
            ("BANK_RETRY_INITIAL_DELAY_MS", "25"),
            ("BANK_DEMO_OVERDRAFT", "-250.5"),
            ("BANK_DEMO_CEILING", "2000"),
        ]))
        .unwrap();

        assert_eq!(config.log_filter, "warn");
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.initial_delay, Duration::from_millis(25));
        assert_eq!(config.demo_overdraft, Money::parse("-250.50").unwrap());
        assert_eq!(config.demo_ceiling, Money::from(2_000));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let cases = [
            ("BANK_RETRY_MAX_ATTEMPTS", "zero"),
            ("BANK_RETRY_MAX_ATTEMPTS", "0"),
            ("BANK_RETRY_INITIAL_DELAY_MS", "-1"),
            ("BANK_DEMO_OVERDRAFT", "10"),
            ("BANK_DEMO_CEILING", "0"),
            ("BANK_DEMO_CEILING", "lots"),
        ];

        for (key, value) in cases {
            let error = AppConfig::from_lookup(lookup(&[(key, value)])).unwrap_err();
            let ConfigError::InvalidValue { key: failed, .. } = error;
            assert_eq!(failed, key);
        }
    }
}
