//! Client configuration.
//!
//! Configuration is loaded from environment variables with defaults suited
//! to a local backend. Nothing here is secret; credentials live in the
//! credential store.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default backend base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Default HTTP request timeout in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 10;

/// Refresh the access token this many seconds before it expires.
pub const DEFAULT_REFRESH_AHEAD_SECONDS: u64 = 60;

/// Floor for the proactive refresh delay, avoids tight refresh loops.
pub const DEFAULT_MIN_REFRESH_INTERVAL_SECONDS: u64 = 5;

/// Credentials file location relative to `$HOME`.
const DEFAULT_CREDENTIALS_RELATIVE_PATH: &str = ".config/reserva/credentials.json";

/// Reserva client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base URL without trailing slash (e.g. `http://localhost:8080`).
    pub api_url: String,

    /// HTTP request timeout.
    pub http_timeout: Duration,

    /// Refresh this long before the access token expires.
    pub refresh_ahead: Duration,

    /// Lower bound for the proactive refresh delay.
    pub min_refresh_interval: Duration,

    /// Where `FileCredentialStore` keeps the session.
    pub credentials_path: PathBuf,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid API URL: {0}")]
    InvalidApiUrl(String),

    #[error("Invalid HTTP timeout configuration: {0}")]
    InvalidHttpTimeout(String),

    #[error("Invalid refresh configuration: {0}")]
    InvalidRefresh(String),
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECONDS),
            refresh_ahead: Duration::from_secs(DEFAULT_REFRESH_AHEAD_SECONDS),
            min_refresh_interval: Duration::from_secs(DEFAULT_MIN_REFRESH_INTERVAL_SECONDS),
            credentials_path: default_credentials_path(None),
        }
    }
}

impl ClientConfig {
    /// Create a configuration for `api_url` with default timings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidApiUrl` if the URL is not http(s).
    pub fn new(api_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: normalize_api_url(api_url)?,
            ..Self::default()
        })
    }

    /// Create a configuration requiring HTTPS.
    ///
    /// Tokens travel in every request, so this is the constructor to use
    /// against anything but a local backend.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidApiUrl` if the URL doesn't use HTTPS.
    pub fn new_secure(api_url: &str) -> Result<Self, ConfigError> {
        if !api_url.trim().starts_with("https://") {
            return Err(ConfigError::InvalidApiUrl(
                "API URL must use HTTPS".to_string(),
            ));
        }
        Self::new(api_url)
    }

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a variable is present but invalid.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let api_url = normalize_api_url(
            vars.get("RESERVA_API_URL")
                .map_or(DEFAULT_API_URL, String::as_str),
        )?;

        let http_timeout_secs = if let Some(value_str) = vars.get("RESERVA_HTTP_TIMEOUT_SECONDS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidHttpTimeout(format!(
                    "RESERVA_HTTP_TIMEOUT_SECONDS must be a valid positive integer, got '{value_str}': {e}"
                ))
            })?;

            if value == 0 {
                return Err(ConfigError::InvalidHttpTimeout(
                    "RESERVA_HTTP_TIMEOUT_SECONDS must be greater than 0".to_string(),
                ));
            }

            value
        } else {
            DEFAULT_HTTP_TIMEOUT_SECONDS
        };

        let refresh_ahead_secs = if let Some(value_str) = vars.get("RESERVA_REFRESH_AHEAD_SECONDS")
        {
            value_str.parse::<u64>().map_err(|e| {
                ConfigError::InvalidRefresh(format!(
                    "RESERVA_REFRESH_AHEAD_SECONDS must be a valid non-negative integer, got '{value_str}': {e}"
                ))
            })?
        } else {
            DEFAULT_REFRESH_AHEAD_SECONDS
        };

        let min_refresh_interval_secs =
            if let Some(value_str) = vars.get("RESERVA_MIN_REFRESH_INTERVAL_SECONDS") {
                let value: u64 = value_str.parse().map_err(|e| {
                    ConfigError::InvalidRefresh(format!(
                        "RESERVA_MIN_REFRESH_INTERVAL_SECONDS must be a valid positive integer, got '{value_str}': {e}"
                    ))
                })?;

                if value == 0 {
                    return Err(ConfigError::InvalidRefresh(
                        "RESERVA_MIN_REFRESH_INTERVAL_SECONDS must be greater than 0".to_string(),
                    ));
                }

                value
            } else {
                DEFAULT_MIN_REFRESH_INTERVAL_SECONDS
            };

        let credentials_path = vars
            .get("RESERVA_CREDENTIALS_PATH")
            .filter(|path| !path.trim().is_empty())
            .map_or_else(
                || default_credentials_path(vars.get("HOME").map(String::as_str)),
                PathBuf::from,
            );

        Ok(Self {
            api_url,
            http_timeout: Duration::from_secs(http_timeout_secs),
            refresh_ahead: Duration::from_secs(refresh_ahead_secs),
            min_refresh_interval: Duration::from_secs(min_refresh_interval_secs),
            credentials_path,
        })
    }

    /// Override the backend URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidApiUrl` if the URL is not http(s).
    pub fn with_api_url(mut self, api_url: &str) -> Result<Self, ConfigError> {
        self.api_url = normalize_api_url(api_url)?;
        Ok(self)
    }

    /// Set the HTTP timeout.
    #[must_use]
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Set how far ahead of expiry the proactive refresh fires.
    #[must_use]
    pub fn with_refresh_ahead(mut self, refresh_ahead: Duration) -> Self {
        self.refresh_ahead = refresh_ahead;
        self
    }

    /// Set the minimum proactive refresh delay.
    #[must_use]
    pub fn with_min_refresh_interval(mut self, interval: Duration) -> Self {
        self.min_refresh_interval = interval;
        self
    }

    /// Set the credentials file path.
    #[must_use]
    pub fn with_credentials_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_path = path.into();
        self
    }
}

fn normalize_api_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidApiUrl(format!(
            "API URL must start with http:// or https://, got '{raw}'"
        )));
    }
    Ok(trimmed.to_string())
}

fn default_credentials_path(home: Option<&str>) -> PathBuf {
    let home = home
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."));
    home.join(DEFAULT_CREDENTIALS_RELATIVE_PATH)
}
