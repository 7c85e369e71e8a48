//! JWT utilities for the client side of the session.
//!
//! The client never verifies signatures: the backend does that on every
//! request. It only needs to peek at a few claims to decide when to refresh
//! and which UI affordances to show:
//! - `exp` for proactive refresh scheduling
//! - `roles` for the admin check
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE decoding
//! - Decoded claims are advisory only and must never gate server-side access
//! - The `sub` field is redacted in Debug output
//!
//! # Usage
//!
//! ```rust,ignore
//! use common::jwt::{expires_in, is_admin};
//!
//! let remaining = expires_in(token.expose_secret());
//! if is_admin(token.expose_secret()) {
//!     // show resource management commands
//! }
//! ```

use base64::alphabet::URL_SAFE;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum accepted JWT size in bytes (8KB).
///
/// Anything larger is treated as malformed without being decoded.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

/// Default "expiring soon" threshold (60 seconds).
pub const DEFAULT_EXPIRY_THRESHOLD: Duration = Duration::from_secs(60);

/// Role names that grant administrative access.
pub const ADMIN_ROLES: [&str; 2] = ["ADMIN", "ROLE_ADMIN"];

/// base64url engine that accepts payloads with or without `=` padding.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while decoding a JWT payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token size exceeds maximum allowed.
    #[error("The access token is malformed")]
    TokenTooLarge,

    /// Token is not a three-part JWT or its payload is not valid base64/JSON.
    #[error("The access token is malformed")]
    MalformedToken,
}

// =============================================================================
// Claims Types
// =============================================================================

/// Claims read from a JWT payload without signature verification.
#[derive(Clone, Default, Deserialize)]
pub struct UnverifiedClaims {
    /// Subject (user identifier or email) - redacted in Debug output.
    ///
    /// Numeric subjects are kept as their decimal string.
    #[serde(default, deserialize_with = "deserialize_subject")]
    pub sub: Option<String>,

    /// Expiration timestamp (Unix epoch seconds, fractions truncated).
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub exp: Option<i64>,

    /// Issued-at timestamp (Unix epoch seconds, fractions truncated).
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub iat: Option<i64>,

    /// Roles, normalised from either an array or a single string.
    #[serde(default, deserialize_with = "deserialize_roles")]
    pub roles: Vec<String>,
}

impl fmt::Debug for UnverifiedClaims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnverifiedClaims")
            .field("sub", &"[REDACTED]")
            .field("exp", &self.exp)
            .field("iat", &self.iat)
            .field("roles", &self.roles)
            .finish()
    }
}

impl UnverifiedClaims {
    /// True when the roles contain an admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.roles
            .iter()
            .any(|role| ADMIN_ROLES.contains(&role.as_str()))
    }
}

// A claim of an unexpected type reads as absent instead of failing the decode.

fn deserialize_subject<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(sub) => Some(sub),
        serde_json::Value::Number(sub) => Some(sub.to_string()),
        _ => None,
    })
}

#[allow(clippy::cast_possible_truncation)]
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let serde_json::Value::Number(number) = value else {
        return Ok(None);
    };

    if let Some(seconds) = number.as_i64() {
        return Ok(Some(seconds));
    }
    // `as` saturates at the i64 bounds
    Ok(number
        .as_f64()
        .filter(|seconds| seconds.is_finite())
        .map(|seconds| seconds.trunc() as i64))
}

fn deserialize_roles<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                serde_json::Value::String(role) => Some(role),
                _ => None,
            })
            .collect(),
        serde_json::Value::String(role) => vec![role],
        _ => Vec::new(),
    })
}

// =============================================================================
// Functions
// =============================================================================

/// Decode the payload of a JWT without verifying its signature.
///
/// # Errors
///
/// - `TokenTooLarge` - Token exceeds `MAX_JWT_SIZE_BYTES`
/// - `MalformedToken` - Not three parts, bad base64, or payload is not a JSON object
pub fn decode_claims(token: &str) -> Result<UnverifiedClaims, JwtValidationError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }

    let mut parts = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        tracing::debug!(target: "common.jwt", "Token rejected: invalid JWT format");
        return Err(JwtValidationError::MalformedToken);
    };

    let payload_bytes = URL_SAFE_LENIENT.decode(payload).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to decode JWT payload base64");
        JwtValidationError::MalformedToken
    })?;

    serde_json::from_slice(&payload_bytes).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to parse JWT payload JSON");
        JwtValidationError::MalformedToken
    })
}

/// Time remaining until the token's `exp`.
///
/// Returns `Duration::ZERO` when the token is expired, has no `exp`, or
/// cannot be decoded.
#[must_use]
pub fn expires_in(token: &str) -> Duration {
    expires_in_at(token, chrono::Utc::now().timestamp_millis())
}

/// Deterministic variant of [`expires_in`] against an explicit `now`
/// (Unix epoch milliseconds).
#[must_use]
pub fn expires_in_at(token: &str, now_ms: i64) -> Duration {
    let Some(exp) = decode_claims(token).ok().and_then(|claims| claims.exp) else {
        return Duration::ZERO;
    };

    let remaining_ms = exp.saturating_mul(1000).saturating_sub(now_ms);
    u64::try_from(remaining_ms).map_or(Duration::ZERO, Duration::from_millis)
}

/// True when the token expires within `threshold`.
#[must_use]
pub fn is_expiring_soon(token: &str, threshold: Duration) -> bool {
    expires_in(token) <= threshold
}

/// Roles carried by the token, empty when absent or undecodable.
#[must_use]
pub fn roles(token: &str) -> Vec<String> {
    decode_claims(token)
        .map(|claims| claims.roles)
        .unwrap_or_default()
}

/// True when the token carries `ADMIN` or `ROLE_ADMIN`.
#[must_use]
pub fn is_admin(token: &str) -> bool {
    decode_claims(token).is_ok_and(|claims| claims.is_admin())
}

// =============================================================================
// Tests
// =============================================================================
