//! Runtime settings for a scrape run.
//!
//! Defaults come from the fetcher constants; environment variables (usually
//! loaded from `.env`) override them, and CLI flags override both.

use std::time::Duration;

use cars24_api::{Client, DEFAULT_BACKOFF, DEFAULT_BASE_URL, DEFAULT_MAX_ATTEMPTS, DEFAULT_TIMEOUT};

use crate::error::Cars24Error;

pub const ENV_BASE_URL: &str = "CARS24_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "CARS24_TIMEOUT_SECS";
pub const ENV_MAX_ATTEMPTS: &str = "CARS24_MAX_ATTEMPTS";
pub const ENV_BACKOFF_SECS: &str = "CARS24_BACKOFF_SECS";
pub const ENV_CITY_DELAY_MS: &str = "CARS24_CITY_DELAY_MS";

/// Fragments normalized per city page.
pub const DEFAULT_MAX_LISTINGS_PER_CITY: usize = 20;
/// Records produced by the sample generator.
pub const DEFAULT_SAMPLE_SIZE: usize = 50;
/// Pause between cities.
pub const DEFAULT_CITY_DELAY: Duration = Duration::from_millis(1500);

#[derive(Clone, Debug)]
pub struct ScrapeConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub max_attempts: u32,
    pub backoff: Duration,
    pub city_delay: Duration,
    pub max_listings_per_city: usize,
    pub sample_size: usize,
    /// Canonical city names. Empty means the catalog's default cities.
    pub cities: Vec<String>,
    /// Skip the network entirely and go straight to sample data.
    pub offline: bool,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
            city_delay: DEFAULT_CITY_DELAY,
            max_listings_per_city: DEFAULT_MAX_LISTINGS_PER_CITY,
            sample_size: DEFAULT_SAMPLE_SIZE,
            cities: Vec::new(),
            offline: false,
        }
    }
}

impl ScrapeConfig {
    /// Defaults overridden by process environment variables.
    pub fn from_env() -> Result<Self, Cars24Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Cars24Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_BASE_URL) {
            let url = url.trim();
            if !url.is_empty() {
                config.base_url = url.trim_end_matches('/').to_string();
            }
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, ENV_TIMEOUT_SECS)? {
            if secs == 0 {
                return Err(Cars24Error::InvalidInput(format!(
                    "{} must be >= 1",
                    ENV_TIMEOUT_SECS
                )));
            }
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(attempts) = parse_var::<u32, _>(&lookup, ENV_MAX_ATTEMPTS)? {
            if attempts == 0 {
                return Err(Cars24Error::InvalidInput(format!(
                    "{} must be >= 1",
                    ENV_MAX_ATTEMPTS
                )));
            }
            config.max_attempts = attempts;
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, ENV_BACKOFF_SECS)? {
            config.backoff = Duration::from_secs(secs);
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, ENV_CITY_DELAY_MS)? {
            config.city_delay = Duration::from_millis(ms);
        }

        Ok(config)
    }

    /// Builds a page fetcher with these settings.
    pub fn client(&self) -> Client {
        Client::with_base_url(&self.base_url)
            .with_timeout(self.timeout)
            .with_retry(self.max_attempts, self.backoff)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, Cars24Error>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            Cars24Error::InvalidInput(format!("{} is not a valid number: '{}'", key, raw))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = ScrapeConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(config.sample_size, DEFAULT_SAMPLE_SIZE);
        assert!(config.cities.is_empty());
        assert!(!config.offline);
    }

    #[test]
    fn environment_overrides_defaults() {
        let lookup = lookup_from(&[
            (ENV_BASE_URL, "http://localhost:9000/"),
            (ENV_TIMEOUT_SECS, "5"),
            (ENV_MAX_ATTEMPTS, "3"),
            (ENV_BACKOFF_SECS, "0"),
            (ENV_CITY_DELAY_MS, "10"),
        ]);
        let config = ScrapeConfig::from_lookup(lookup).unwrap();
        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.backoff, Duration::ZERO);
        assert_eq!(config.city_delay, Duration::from_millis(10));
    }

    #[test]
    fn blank_values_are_ignored() {
        let lookup = lookup_from(&[(ENV_TIMEOUT_SECS, "  "), (ENV_BASE_URL, "")]);
        let config = ScrapeConfig::from_lookup(lookup).unwrap();
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn malformed_number_is_rejected() {
        let lookup = lookup_from(&[(ENV_MAX_ATTEMPTS, "many")]);
        let err = ScrapeConfig::from_lookup(lookup).unwrap_err();
        assert!(err.to_string().contains(ENV_MAX_ATTEMPTS));
    }

    #[test]
    fn zero_attempts_is_rejected() {
        let lookup = lookup_from(&[(ENV_MAX_ATTEMPTS, "0")]);
        assert!(ScrapeConfig::from_lookup(lookup).is_err());
    }
}
