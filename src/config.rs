//! Runtime settings read from the environment (and `.env`, loaded by the
//! binary before this runs).

use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

use crate::location::nominatim::DEFAULT_NOMINATIM_URL;
use crate::location::{DEFAULT_CACHE_TTL, DEFAULT_TIMEOUT};

pub const DEFAULT_DATASET: &str = "data/dataset.json";
pub const DEFAULT_FILTER_STATE: &str = ".telesignal/filters.json";
pub const DEFAULT_LOG_FILE: &str = "logs/telesignal.log";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Local path or http(s) URL of the dataset.
    pub dataset: String,
    pub filter_state: PathBuf,
    pub geocoder_url: String,
    pub geolocation_timeout: Duration,
    pub location_cache_ttl: Duration,
    pub log_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            dataset: DEFAULT_DATASET.to_string(),
            filter_state: PathBuf::from(DEFAULT_FILTER_STATE),
            geocoder_url: DEFAULT_NOMINATIM_URL.to_string(),
            geolocation_timeout: DEFAULT_TIMEOUT,
            location_cache_ttl: DEFAULT_CACHE_TTL,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup. Empty values count as
    /// unset; malformed durations keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Settings::default();

        let seconds = |key: &str, default: Duration| match get(key) {
            None => default,
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) => Duration::from_secs(secs),
                Err(e) => {
                    warn!(key, value = %raw, error = %e, "Ignoring malformed duration");
                    default
                }
            },
        };

        Settings {
            dataset: get("TELESIGNAL_DATASET").unwrap_or(defaults.dataset),
            filter_state: get("TELESIGNAL_FILTER_STATE")
                .map(PathBuf::from)
                .unwrap_or(defaults.filter_state),
            geocoder_url: get("TELESIGNAL_GEOCODER_URL").unwrap_or(defaults.geocoder_url),
            geolocation_timeout: seconds("TELESIGNAL_GEOLOCATION_TIMEOUT_SECS", defaults.geolocation_timeout),
            location_cache_ttl: seconds("TELESIGNAL_LOCATION_CACHE_SECS", defaults.location_cache_ttl),
            log_file: get("LOG_FILE_PATH").map(PathBuf::from).unwrap_or(defaults.log_file),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Settings {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let s = settings(&[]);
        assert_eq!(s, Settings::default());
        assert_eq!(s.geolocation_timeout, Duration::from_secs(10));
        assert_eq!(s.location_cache_ttl, Duration::from_secs(300));
    }

    #[test]
    fn test_overrides() {
        let s = settings(&[
            ("TELESIGNAL_DATASET", "https://example.org/data.csv"),
            ("TELESIGNAL_FILTER_STATE", "/tmp/f.json"),
            ("TELESIGNAL_GEOLOCATION_TIMEOUT_SECS", "3"),
            ("LOG_FILE_PATH", "/var/log/ts.log"),
        ]);

        assert_eq!(s.dataset, "https://example.org/data.csv");
        assert_eq!(s.filter_state, PathBuf::from("/tmp/f.json"));
        assert_eq!(s.geolocation_timeout, Duration::from_secs(3));
        assert_eq!(s.log_file, PathBuf::from("/var/log/ts.log"));
    }

    #[test]
    fn test_malformed_and_empty_values_fall_back() {
        let s = settings(&[
            ("TELESIGNAL_LOCATION_CACHE_SECS", "five minutes"),
            ("TELESIGNAL_DATASET", "  "),
        ]);

        assert_eq!(s.location_cache_ttl, DEFAULT_CACHE_TTL);
        assert_eq!(s.dataset, DEFAULT_DATASET);
    }
}
