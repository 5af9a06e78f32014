use dotenvy::dotenv;
use once_cell::sync::Lazy;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::gemini::DEFAULT_MODEL;

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    dotenv().ok(); // Load .env file if present
    Config::from_env()
});

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Only used for startup diagnostics; the search client re-reads the variable per call.
    pub serp_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub cache_ttl_secs: u64,
    pub cache_check_period_secs: u64,
    pub cache_stats_period_secs: u64,
    pub max_requests_per_minute: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 3000,
            serp_api_key: None,
            gemini_api_key: None,
            gemini_model: DEFAULT_MODEL.to_string(),
            cache_ttl_secs: 3600,
            cache_check_period_secs: 600,
            cache_stats_period_secs: 300,
            max_requests_per_minute: 30,
        }
    }
}

impl Config {
    pub fn from_env() -> Config {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Config
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        Config {
            port: parsed_or(&lookup, "PORT", defaults.port),
            serp_api_key: non_empty(lookup("SERP_API_KEY")),
            gemini_api_key: non_empty(lookup("GEMINI_API_KEY")),
            gemini_model: non_empty(lookup("GEMINI_MODEL")).unwrap_or(defaults.gemini_model),
            cache_ttl_secs: positive_or(&lookup, "CACHE_TTL", defaults.cache_ttl_secs),
            cache_check_period_secs: positive_or(
                &lookup,
                "CACHE_CHECK_PERIOD",
                defaults.cache_check_period_secs,
            ),
            cache_stats_period_secs: positive_or(
                &lookup,
                "CACHE_STATS_PERIOD",
                defaults.cache_stats_period_secs,
            ),
            max_requests_per_minute: parsed_or(
                &lookup,
                "MAX_REQUESTS_PER_MINUTE",
                defaults.max_requests_per_minute,
            )
            .max(1),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn cache_check_period(&self) -> Duration {
        Duration::from_secs(self.cache_check_period_secs)
    }

    pub fn cache_stats_period(&self) -> Duration {
        Duration::from_secs(self.cache_stats_period_secs)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parsed_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}

// zero durations would make the interval timers panic
fn positive_or<F>(lookup: &F, key: &str, default: u64) -> u64
where
    F: Fn(&str) -> Option<String>,
{
    match parsed_or(lookup, key, default) {
        0 => default,
        value => value,
    }
}
