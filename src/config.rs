use std::{env, fmt, time::Duration};

use thiserror::Error;
use url::Url;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    Bearer,
    ApiKeyHeader,
}

impl AuthScheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bearer => "bearer",
            Self::ApiKeyHeader => "x-api-key",
        }
    }
}

impl fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone)]
pub struct Config {
    pub api_key: String,
    pub api_url: Url,
    pub auth_scheme: AuthScheme,
    pub timeout: Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"[REDACTED]")
            .field("api_url", &self.api_url.as_str())
            .field("auth_scheme", &self.auth_scheme)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("DATAGRAPH_API_KEY is required and must not be empty")]
    MissingApiKey,
    #[error("DATAGRAPH_API_URL must be an absolute http(s) URL")]
    InvalidApiUrl,
    #[error("DATAGRAPH_AUTH_SCHEME must be one of: bearer, x-api-key")]
    InvalidAuthScheme,
    #[error("DATAGRAPH_TIMEOUT_SECS must be a positive integer")]
    InvalidTimeout,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let api_key = read("DATAGRAPH_API_KEY").ok_or(ConfigError::MissingApiKey)?;

        let api_url = read("DATAGRAPH_API_URL")
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .parse::<Url>()
            .map_err(|_| ConfigError::InvalidApiUrl)?;
        if !matches!(api_url.scheme(), "http" | "https") || api_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidApiUrl);
        }

        let auth_scheme = match read("DATAGRAPH_AUTH_SCHEME")
            .map(|value| value.to_ascii_lowercase())
            .as_deref()
        {
            None | Some("bearer") => AuthScheme::Bearer,
            Some("x-api-key") | Some("api-key") => AuthScheme::ApiKeyHeader,
            Some(_) => return Err(ConfigError::InvalidAuthScheme),
        };

        let timeout_secs = read("DATAGRAPH_TIMEOUT_SECS")
            .map(|value| value.parse::<u64>().map_err(|_| ConfigError::InvalidTimeout))
            .transpose()?
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        Ok(Self {
            api_key,
            api_url,
            auth_scheme,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Base URL without a trailing slash, ready for path concatenation.
    pub fn api_base(&self) -> String {
        self.api_url.as_str().trim_end_matches('/').to_string()
    }
}
