//! # Reserva Test Utilities
//!
//! Shared test utilities for the Reserva client crates.
//!
//! This crate provides:
//! - Test data builders (`TestTokenBuilder` for access tokens)
//! - JSON fixtures for backend responses
//! - A mock backend (`MockBackend`) built on wiremock
//! - Fixed test IDs (UUIDs, constants)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use reserva_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let backend = MockBackend::start().await;
//!     let session = AuthFixture::new(TEST_EMAIL_ALICE);
//!     backend.mount_login(&session).await;
//!
//!     let token = TestTokenBuilder::new()
//!         .for_user(TEST_EMAIL_ALICE)
//!         .with_roles(&["ROLE_ADMIN"])
//!         .expires_in(30)
//!         .build();
//! }
//! ```

pub mod fixtures;
pub mod mock_backend;
pub mod test_ids;
pub mod token_builders;

// Re-export commonly used items
pub use fixtures::*;
pub use mock_backend::*;
pub use test_ids::*;
pub use token_builders::*;
