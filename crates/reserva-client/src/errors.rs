//! Client error types.
//!
//! `ClientError` is what every service call returns. `user_message()` turns
//! it into the short text shown to a person; `Display` keeps the details for
//! logs.

use crate::config::ConfigError;
use crate::session::SessionError;
use crate::token_store::StoreError;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Maximum length for error body in error messages.
const MAX_ERROR_BODY_LEN: usize = 256;

/// Regex pattern for JWT tokens (header.payload.signature).
#[allow(clippy::expect_used)]
static JWT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"eyJ[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+(?:\.[A-Za-z0-9_-]*)?")
        .expect("JWT pattern is a valid regex")
});

/// Regex pattern for Bearer tokens in text.
#[allow(clippy::expect_used)]
static BEARER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)bearer\s+[A-Za-z0-9._~+/=-]+").expect("Bearer pattern is a valid regex")
});

/// Sanitize a response body before it ends up in an error or a log line.
///
/// Bearer tokens are removed first so "Bearer <JWT>" is replaced as a whole,
/// then standalone JWTs, then the result is truncated.
#[must_use]
pub fn sanitize_error_body(body: &str) -> String {
    let sanitized = BEARER_PATTERN.replace_all(body, "[BEARER_REDACTED]");
    let sanitized = JWT_PATTERN.replace_all(&sanitized, "[JWT_REDACTED]");

    if sanitized.chars().count() > MAX_ERROR_BODY_LEN {
        let truncated: String = sanitized.chars().take(MAX_ERROR_BODY_LEN).collect();
        format!("{truncated}...[truncated]")
    } else {
        sanitized.into_owned()
    }
}

/// Errors returned by Reserva API calls.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure (connection refused, timeout, TLS).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("Request failed with status {status}: {body}")]
    Api {
        status: u16,
        /// `message` from the backend's error body, when present.
        message: Option<String>,
        /// Sanitized raw body.
        body: String,
    },

    /// Refresh failed irrecoverably; credentials were cleared.
    #[error("Session expired: {0}")]
    SessionExpired(SessionError),

    /// Refresh failed transiently; credentials were kept.
    #[error("Token refresh failed: {0}")]
    Refresh(SessionError),

    /// Response body didn't match the expected shape.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Credential storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

impl From<SessionError> for ClientError {
    fn from(err: SessionError) -> Self {
        if err.is_irrecoverable() {
            ClientError::SessionExpired(err)
        } else {
            ClientError::Refresh(err)
        }
    }
}

impl ClientError {
    /// HTTP status for backend errors.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Short message suitable for showing to a user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Api {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            ClientError::Api { status: 409, .. } => "This resource already exists".to_string(),
            ClientError::Api { status: 403, .. } => {
                "You don't have permission to do that".to_string()
            }
            ClientError::Api { status: 401, .. } | ClientError::SessionExpired(_) => {
                "Session expired. Please log in again".to_string()
            }
            ClientError::Api { status, .. } => format!("Request failed with status code {status}"),
            ClientError::Http(_) | ClientError::Refresh(_) => {
                "Network error. Please try again".to_string()
            }
            other => other.to_string(),
        }
    }

    /// True when the backend rejected a reservation because it overlaps another.
    #[must_use]
    pub fn is_overlap(&self) -> bool {
        crate::validation::is_overlap_error(&self.user_message())
    }
}
