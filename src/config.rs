use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

const DEFAULT_RASP_BASE_URL: &str = "https://rasp.omgtu.ru/";

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_token: String,
    // Без него всё хранится в памяти
    pub database_url: Option<String>,
    pub rasp_base_url: String,
    pub rasp_retries: u32,
    pub state_cache_ttl: Duration,
    pub cache_sweep_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let telegram_token =
            non_empty("TELEGRAM_TOKEN").ok_or(ConfigError::Missing("TELEGRAM_TOKEN"))?;

        let mut rasp_base_url =
            non_empty("RASP_BASE_URL").unwrap_or_else(|| DEFAULT_RASP_BASE_URL.to_string());
        if !rasp_base_url.ends_with('/') {
            rasp_base_url.push('/');
        }

        let secs = |name: &'static str, default: u64| -> Result<Duration, ConfigError> {
            number(&non_empty, name, default).map(Duration::from_secs)
        };

        let cache_sweep_interval = secs("CACHE_SWEEP_INTERVAL_SECS", 600)?;
        // tokio::time::interval не принимает нулевой период
        if cache_sweep_interval.is_zero() {
            return Err(ConfigError::InvalidNumber {
                name: "CACHE_SWEEP_INTERVAL_SECS",
                value: "0".to_string(),
            });
        }

        Ok(Config {
            telegram_token,
            database_url: non_empty("DATABASE_URL"),
            rasp_base_url,
            rasp_retries: number(&non_empty, "RASP_RETRIES", 1)?,
            state_cache_ttl: secs("STATE_CACHE_TTL_SECS", 300)?,
            cache_sweep_interval,
        })
    }
}

fn number<T: FromStr>(
    lookup: impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { name, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn token_is_required() {
        let err = config_from(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("TELEGRAM_TOKEN")));
    }

    #[test]
    fn defaults_apply() {
        let config = config_from(&[("TELEGRAM_TOKEN", "123:abc")]).unwrap();
        assert_eq!(config.rasp_base_url, "https://rasp.omgtu.ru/");
        assert_eq!(config.rasp_retries, 1);
        assert_eq!(config.state_cache_ttl, Duration::from_secs(300));
        assert!(config.database_url.is_none());
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let config = config_from(&[
            ("TELEGRAM_TOKEN", "123:abc"),
            ("RASP_BASE_URL", "http://localhost:8080"),
            ("DATABASE_URL", "postgres://localhost/rasp"),
        ])
        .unwrap();
        assert_eq!(config.rasp_base_url, "http://localhost:8080/");
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/rasp"));
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let err = config_from(&[("TELEGRAM_TOKEN", "t"), ("RASP_RETRIES", "many")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { name: "RASP_RETRIES", .. }));
    }

    #[test]
    fn retries_beyond_u32_are_rejected() {
        let err = config_from(&[("TELEGRAM_TOKEN", "t"), ("RASP_RETRIES", "4294967296")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { name: "RASP_RETRIES", .. }));
    }

    #[test]
    fn zero_sweep_interval_is_rejected() {
        let err = config_from(&[("TELEGRAM_TOKEN", "t"), ("CACHE_SWEEP_INTERVAL_SECS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { name: "CACHE_SWEEP_INTERVAL_SECS", .. }));

        let config = config_from(&[("TELEGRAM_TOKEN", "t"), ("CACHE_SWEEP_INTERVAL_SECS", "30")]).unwrap();
        assert_eq!(config.cache_sweep_interval, Duration::from_secs(30));
    }
}
