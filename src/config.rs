use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::storage::ExecutionContext;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_TOKEN_STORE_PATH: &str = ".taskforge/session.json";
pub const DEFAULT_POST_LOGIN_ROUTE: &str = "/dashboard";
pub const DEFAULT_PUBLIC_ROUTE: &str = "/login";

/// Client settings, read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub timeout: Duration,
    pub token_store_path: PathBuf,
    pub context: ExecutionContext,
    pub post_login_route: String,
    pub public_route: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            token_store_path: PathBuf::from(DEFAULT_TOKEN_STORE_PATH),
            context: ExecutionContext::Interactive,
            post_login_route: DEFAULT_POST_LOGIN_ROUTE.to_string(),
            public_route: DEFAULT_PUBLIC_ROUTE.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Builds a configuration from an arbitrary variable source; unset variables take
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_base_url = lookup("API_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_base_url);

        let timeout = match lookup("API_TIMEOUT_SECS") {
            Some(value) => value
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::Invalid {
                    var: "API_TIMEOUT_SECS",
                    value,
                })?,
            None => defaults.timeout,
        };

        let context = match lookup("CLIENT_CONTEXT") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                var: "CLIENT_CONTEXT",
                value,
            })?,
            None => defaults.context,
        };

        Ok(Self {
            api_base_url,
            timeout,
            token_store_path: lookup("TOKEN_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.token_store_path),
            context,
            post_login_route: lookup("POST_LOGIN_ROUTE").unwrap_or(defaults.post_login_route),
            public_route: lookup("PUBLIC_ROUTE").unwrap_or(defaults.public_route),
        })
    }
}
