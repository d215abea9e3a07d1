use std::env;
use std::str::FromStr;
use std::time::Duration;

use itertools::Itertools;
use strum_macros::{Display, EnumString};
use thiserror::Error;

use crate::dispatcher::ProviderConfig;

const DEFAULT_REQUEST_COUNT: u64 = 10;
const DEFAULT_DRAIN_TIMEOUT_SECS: u64 = 60;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Missing {0} environment variable")]
    Missing(&'static str),
    #[error("{name} has an invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// How processed events are written out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum EventFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub providers: Vec<ProviderConfig>,
    pub request_count: u64,
    pub drain_timeout: Duration,
    pub seed: Option<u64>,
    pub event_format: EventFormat,
}

impl Config {
    /// Reads the process environment. The binary loads `.env` into it first.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let rates = lookup("PROVIDER_RATES").ok_or(ConfigError::Missing("PROVIDER_RATES"))?;
        let providers = parse_rates(&rates)?;
        let request_count = parse_or("REQUEST_COUNT", &lookup, DEFAULT_REQUEST_COUNT)?;
        let drain_timeout = Duration::from_secs(parse_or(
            "DRAIN_TIMEOUT_SECS",
            &lookup,
            DEFAULT_DRAIN_TIMEOUT_SECS,
        )?);
        let seed = lookup("REQUEST_SEED")
            .map(|value| parse("REQUEST_SEED", &value))
            .transpose()?;
        let event_format = parse_or("EVENT_FORMAT", &lookup, EventFormat::Text)?;
        Ok(Self {
            providers,
            request_count,
            drain_timeout,
            seed,
            event_format,
        })
    }

    pub fn describe_providers(&self) -> String {
        self.providers
            .iter()
            .map(|p| format!("{}@{}/s", p.name, p.rate_per_second))
            .join(", ")
    }
}

/// Providers are named P1, P2, ... in the order their rates are listed.
/// Rates are only parsed here, whether they're usable is up to the dispatcher.
fn parse_rates(value: &str) -> Result<Vec<ProviderConfig>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|rate| !rate.is_empty())
        .enumerate()
        .map(|(i, rate)| {
            let rate = parse::<f64>("PROVIDER_RATES", rate)?;
            Ok(ProviderConfig::new(format!("P{}", i + 1), rate))
        })
        .collect()
}

fn parse<T: FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_owned(),
    })
}

fn parse_or<T, F>(name: &'static str, lookup: &F, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&'static str) -> Option<String>,
{
    match lookup(name) {
        Some(value) => parse(name, &value),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::{Config, ConfigError, EventFormat};
    use crate::dispatcher::ProviderConfig;

    fn config(vars: &[(&'static str, &str)]) -> Result<Config, ConfigError> {
        let vars = vars
            .iter()
            .map(|(k, v)| (*k, v.to_string()))
            .collect::<HashMap<_, _>>();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn names_providers_in_order() {
        let config = config(&[("PROVIDER_RATES", "1, 0.2,2")]).unwrap();
        assert_eq!(
            config.providers,
            vec![
                ProviderConfig::new("P1", 1f64),
                ProviderConfig::new("P2", 0.2),
                ProviderConfig::new("P3", 2f64),
            ]
        );
        assert_eq!(config.describe_providers(), "P1@1/s, P2@0.2/s, P3@2/s");
    }

    #[test]
    fn falls_back_to_defaults() {
        let config = config(&[("PROVIDER_RATES", "1")]).unwrap();
        assert_eq!(config.request_count, 10);
        assert_eq!(config.drain_timeout, Duration::from_secs(60));
        assert_eq!(config.seed, None);
        assert_eq!(config.event_format, EventFormat::Text);
    }

    #[test]
    fn reads_every_setting() {
        let config = config(&[
            ("PROVIDER_RATES", "0.5"),
            ("REQUEST_COUNT", "25"),
            ("DRAIN_TIMEOUT_SECS", "5"),
            ("REQUEST_SEED", "42"),
            ("EVENT_FORMAT", "json"),
        ])
        .unwrap();
        assert_eq!(config.request_count, 25);
        assert_eq!(config.drain_timeout, Duration::from_secs(5));
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.event_format, EventFormat::Json);
    }

    #[test]
    fn rates_are_required() {
        assert_eq!(config(&[]), Err(ConfigError::Missing("PROVIDER_RATES")));
    }

    #[test]
    fn garbage_is_rejected_not_defaulted() {
        assert_eq!(
            config(&[("PROVIDER_RATES", "1,fast")]),
            Err(ConfigError::Invalid {
                name: "PROVIDER_RATES",
                value: "fast".to_owned()
            })
        );
        assert!(config(&[("PROVIDER_RATES", "1"), ("REQUEST_COUNT", "-2")]).is_err());
        assert!(config(&[("PROVIDER_RATES", "1"), ("EVENT_FORMAT", "xml")]).is_err());
    }
}
