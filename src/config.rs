//! Process configuration read from the environment (and `.env`, loaded in `main`).

use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::application::order_service::ServiceTimeouts;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub account_service_url: String,
    pub catalog_service_url: String,
    pub lookup_timeout: Duration,
    pub request_timeout: Duration,
    pub gateway_field_timeout: Duration,
    pub db_pool_size: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| var(name).ok_or(ConfigError::Missing(name));
        let millis = |name: &'static str, default: u64| {
            parsed(&var, name, default).map(Duration::from_millis)
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parsed(&var, "PORT", 8080)?,
            account_service_url: required("ACCOUNT_SERVICE_URL")?,
            catalog_service_url: required("CATALOG_SERVICE_URL")?,
            lookup_timeout: millis("LOOKUP_TIMEOUT_MS", 2000)?,
            request_timeout: millis("REQUEST_TIMEOUT_MS", 5000)?,
            gateway_field_timeout: millis("GATEWAY_FIELD_TIMEOUT_MS", 3000)?,
            db_pool_size: parsed(&var, "DB_POOL_SIZE", 10)?,
        })
    }

    pub fn service_timeouts(&self) -> ServiceTimeouts {
        ServiceTimeouts {
            lookup: self.lookup_timeout,
            request: self.request_timeout,
        }
    }
}

fn parsed<T, F>(var: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn source(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("DATABASE_URL", "postgres://localhost/orders"),
        ("ACCOUNT_SERVICE_URL", "http://account:8080"),
        ("CATALOG_SERVICE_URL", "http://catalog:8080"),
    ];

    #[test]
    fn defaults_apply_when_optional_values_are_absent() {
        let config = Config::from_lookup(source(&REQUIRED)).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.lookup_timeout, Duration::from_secs(2));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.gateway_field_timeout, Duration::from_secs(3));
        assert_eq!(config.db_pool_size, 10);
    }

    #[test]
    fn overrides_are_parsed() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([("PORT", "9090"), ("LOOKUP_TIMEOUT_MS", "250")]);

        let config = Config::from_lookup(source(&pairs)).unwrap();

        assert_eq!(config.port, 9090);
        assert_eq!(config.service_timeouts().lookup, Duration::from_millis(250));
    }

    #[test]
    fn missing_required_value_is_reported() {
        let err = Config::from_lookup(source(&REQUIRED[..2])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("CATALOG_SERVICE_URL"));
    }

    #[test]
    fn invalid_number_is_reported() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("PORT", "eighty"));

        let err = Config::from_lookup(source(&pairs)).unwrap_err();

        assert_eq!(
            err,
            ConfigError::Invalid {
                name: "PORT",
                value: "eighty".into()
            }
        );
    }
}
