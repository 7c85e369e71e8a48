//! Common utilities and types shared across Reserva crates.

#![warn(clippy::pedantic)]

/// Module for common data types (typed identifiers)
pub mod types;

/// Module for common configuration
pub mod config;

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for JWT utilities (unverified claim decoding, expiry, roles)
pub mod jwt;
