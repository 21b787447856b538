use photo_cache::PressurePolicy;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use unsplash_client::UnsplashClient;

const DAY_SECS: u64 = 24 * 60 * 60;

/// Server configuration parsed from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub cache_dir: PathBuf,
    pub unsplash_access_key: String,
    pub unsplash_base_url: String,
    pub download_timeout: Duration,
    /// Default age limit for `POST /cache/evict`
    pub max_age: Duration,
    pub pressure: PressurePolicy,
    pub cors_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3002,
            cache_dir: PathBuf::from("./cache/photos"),
            unsplash_access_key: String::new(),
            unsplash_base_url: UnsplashClient::DEFAULT_BASE_URL.to_string(),
            download_timeout: Duration::from_secs(30),
            max_age: Duration::from_secs(7 * DAY_SECS),
            pressure: PressurePolicy::default(),
            cors_origins: vec!["*".to_string()],
        }
    }
}

impl Config {
    /// Parse configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Parse configuration from any key lookup, falling back to defaults
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parsed_u64 = |key: &str| var(key).and_then(|s| s.trim().parse::<u64>().ok());

        let port = var("PORT")
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(defaults.port);

        let cache_dir = var("CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.cache_dir);

        let unsplash_access_key = var("UNSPLASH_ACCESS_KEY").unwrap_or_default();

        let unsplash_base_url = var("UNSPLASH_BASE_URL").unwrap_or(defaults.unsplash_base_url);

        let download_timeout = parsed_u64("DOWNLOAD_TIMEOUT_SECS")
            .map(Duration::from_secs)
            .unwrap_or(defaults.download_timeout);

        let max_age = parsed_u64("MAX_AGE_DAYS")
            .map(|days| Duration::from_secs(days.saturating_mul(DAY_SECS)))
            .unwrap_or(defaults.max_age);

        let pressure = PressurePolicy {
            max_age: parsed_u64("PRESSURE_MAX_AGE_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.pressure.max_age),
            target_bytes: parsed_u64("PRESSURE_TARGET_BYTES")
                .unwrap_or(defaults.pressure.target_bytes),
        };

        let cors_origins = var("CORS_ORIGINS")
            .map(|s| s.split(',').map(|o| o.trim().to_string()).collect())
            .unwrap_or(defaults.cors_origins);

        Self {
            port,
            cache_dir,
            unsplash_access_key,
            unsplash_base_url,
            download_timeout,
            max_age,
            pressure,
            cors_origins,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(pairs: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|key| map.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = from_map(&[]);
        assert_eq!(config.port, 3002);
        assert_eq!(config.cache_dir, PathBuf::from("./cache/photos"));
        assert_eq!(config.unsplash_base_url, "https://api.unsplash.com");
        assert_eq!(config.download_timeout, Duration::from_secs(30));
        assert_eq!(config.max_age, Duration::from_secs(7 * 86400));
        assert_eq!(config.pressure.target_bytes, 50 * 1024 * 1024);
        assert!(config.unsplash_access_key.is_empty());
    }

    #[test]
    fn test_overrides() {
        let config = from_map(&[
            ("PORT", "8080"),
            ("CACHE_DIR", "/var/cache/photos"),
            ("UNSPLASH_ACCESS_KEY", "abc"),
            ("DOWNLOAD_TIMEOUT_SECS", "5"),
            ("MAX_AGE_DAYS", "2"),
            ("PRESSURE_TARGET_BYTES", "1024"),
            ("PRESSURE_MAX_AGE_SECS", "60"),
            ("CORS_ORIGINS", "http://a.test, http://b.test"),
        ]);

        assert_eq!(config.port, 8080);
        assert_eq!(config.cache_dir, PathBuf::from("/var/cache/photos"));
        assert_eq!(config.unsplash_access_key, "abc");
        assert_eq!(config.download_timeout, Duration::from_secs(5));
        assert_eq!(config.max_age, Duration::from_secs(2 * 86400));
        assert_eq!(config.pressure.target_bytes, 1024);
        assert_eq!(config.pressure.max_age, Duration::from_secs(60));
        assert_eq!(config.cors_origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn test_unparsable_values_fall_back() {
        let config = from_map(&[("PORT", "not-a-port"), ("MAX_AGE_DAYS", "-1")]);
        assert_eq!(config.port, 3002);
        assert_eq!(config.max_age, Duration::from_secs(7 * 86400));
    }

    #[test]
    fn test_huge_max_age_saturates() {
        let config = from_map(&[("MAX_AGE_DAYS", &u64::MAX.to_string())]);
        assert_eq!(config.max_age, Duration::from_secs(u64::MAX));
    }
}
