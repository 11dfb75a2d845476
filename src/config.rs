// Client configuration
// Defaults follow the backend's documented limits: 30s default timeout,
// 5 minute response cache, 100 cached responses, 24h hotel list.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use reqwest::Url;

use crate::error::ClientError;

pub const DEVELOPMENT_BASE_URL: &str = "http://localhost:3001/api";
pub const PRODUCTION_BASE_URL: &str = "https://www.mpbarbosa.com/api";

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const SEARCH_TIMEOUT_MS: u64 = 60_000;
pub const WEEKEND_SEARCH_TIMEOUT_MS: u64 = 10 * 60 * 1000;
pub const DEFAULT_CACHE_TTL_MS: u64 = 5 * 60 * 1000;
pub const DEFAULT_MAX_CACHE_ENTRIES: usize = 100;
pub const HOTEL_LIST_TTL_MS: u64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn base_url(self) -> &'static str {
        match self {
            Environment::Development => DEVELOPMENT_BASE_URL,
            Environment::Production => PRODUCTION_BASE_URL,
        }
    }
}

impl FromStr for Environment {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "local" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(ClientError::ConfigError(format!(
                "unknown environment '{}'",
                other
            ))),
        }
    }
}

// Endpoint-specific timeouts; `ClientConfig::timeout` is the default for
// everything else
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    pub search: Duration,
    pub weekend_search: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            search: Duration::from_millis(SEARCH_TIMEOUT_MS),
            weekend_search: Duration::from_millis(WEEKEND_SEARCH_TIMEOUT_MS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub cache_ttl: Duration,
    pub max_cache_entries: usize,
    pub timeouts: TimeoutConfig,
    pub hotel_list_ttl: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::for_environment(Environment::Development)
    }
}

impl ClientConfig {
    pub fn for_environment(environment: Environment) -> Self {
        Self {
            base_url: environment.base_url().to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            cache_ttl: Duration::from_millis(DEFAULT_CACHE_TTL_MS),
            max_cache_entries: DEFAULT_MAX_CACHE_ENTRIES,
            timeouts: TimeoutConfig::default(),
            hotel_list_ttl: Duration::from_millis(HOTEL_LIST_TTL_MS),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    // Load from VACANCY_* environment variables, falling back to defaults
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("VACANCY_ENV") {
            Some(value) => value.parse()?,
            None => Environment::default(),
        };

        let mut config = Self::for_environment(environment);

        if let Some(base_url) = lookup("VACANCY_API_BASE_URL") {
            config.base_url = base_url;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "VACANCY_API_TIMEOUT_MS")? {
            config.timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "VACANCY_CACHE_TTL_MS")? {
            config.cache_ttl = Duration::from_millis(ms);
        }
        if let Some(entries) = parse_var::<usize>(&lookup, "VACANCY_MAX_CACHE_ENTRIES")? {
            config.max_cache_entries = entries;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.base_url.trim().is_empty() {
            return Err(ClientError::ConfigError("base_url is empty".to_string()));
        }
        Url::parse(&self.base_url).map_err(|e| {
            ClientError::ConfigError(format!("invalid base_url '{}': {}", self.base_url, e))
        })?;
        if self.timeout.is_zero() {
            return Err(ClientError::ConfigError(
                "timeout must be greater than zero".to_string(),
            ));
        }
        if self.max_cache_entries == 0 {
            return Err(ClientError::ConfigError(
                "max_cache_entries must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<T>, ClientError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ClientError::ConfigError(format!("{}='{}': {}", name, raw, e))),
        None => Ok(None),
    }
}
