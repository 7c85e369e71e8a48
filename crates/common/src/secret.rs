//! Secret types for protecting credentials from accidental logging.
//!
//! Re-exports the [`secrecy`] types used for access tokens, refresh tokens
//! and passwords throughout Reserva. `SecretString` implements `Debug` with
//! redaction, so any struct deriving `Debug` that holds one stays safe to
//! log via `{:?}` or tracing fields.
//!
//! Secrets are zeroized on drop.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct Session {
//!     email: String,
//!     access_token: SecretString,
//! }
//!
//! let session = Session {
//!     email: "alice@example.com".to_string(),
//!     access_token: SecretString::from("eyJhbGciOi..."),
//! };
//!
//! // The token is redacted in Debug output
//! assert!(!format!("{session:?}").contains("eyJhbGciOi"));
//!
//! // Reading the value is an explicit act
//! let header = format!("Bearer {}", session.access_token.expose_secret());
//! # assert!(header.starts_with("Bearer "));
//! ```

pub use secrecy::{ExposeSecret, SecretString};

/// Compare two secrets without exposing them to callers.
///
/// Used to detect whether a stored token was replaced by a concurrent refresh.
#[must_use]
pub fn same_secret(a: &SecretString, b: &SecretString) -> bool {
    a.expose_secret() == b.expose_secret()
}
