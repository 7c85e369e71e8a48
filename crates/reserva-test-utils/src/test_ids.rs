//! Fixed test IDs for deterministic tests
//!
//! Using fixed UUIDs keeps request paths and assertions stable across runs.

use uuid::Uuid;

// Resource IDs (1-99)
pub const TEST_RESOURCE_ROOM_A: Uuid = Uuid::from_u128(1);
pub const TEST_RESOURCE_VAN: Uuid = Uuid::from_u128(2);

// Reservation IDs (100-199)
pub const TEST_RESERVATION_1: Uuid = Uuid::from_u128(100);
pub const TEST_RESERVATION_2: Uuid = Uuid::from_u128(101);

// User IDs (1000-1099)
pub const TEST_USER_ALICE: Uuid = Uuid::from_u128(1000);
pub const TEST_USER_BOB: Uuid = Uuid::from_u128(1001);

// Resource type IDs
pub const TEST_TYPE_ROOM: i64 = 1;
pub const TEST_TYPE_VEHICLE: i64 = 6;

// Accounts
pub const TEST_EMAIL_ALICE: &str = "alice@example.com";
pub const TEST_EMAIL_BOB: &str = "bob@example.com";
pub const TEST_PASSWORD: &str = "correct-horse";

// Signing secret for test tokens; clients never verify signatures
pub const TEST_SIGNING_SECRET: &[u8] = b"reserva-test-secret-do-not-use-in-production";
