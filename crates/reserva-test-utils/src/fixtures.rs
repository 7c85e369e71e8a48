//! JSON fixtures shaped like backend responses

use crate::test_ids::*;
use crate::token_builders::TestTokenBuilder;
use serde_json::{json, Value};
use uuid::Uuid;

/// A token pair as issued by login, register and refresh.
#[derive(Debug, Clone)]
pub struct AuthFixture {
    pub access_token: String,
    pub refresh_token: String,
    pub email: String,
}

impl AuthFixture {
    /// Fresh pair for `email` with an access token valid for an hour.
    pub fn new(email: &str) -> Self {
        Self::with_access_token(email, TestTokenBuilder::new().for_user(email).build())
    }

    /// Pair for `email` using a specific access token.
    pub fn with_access_token(email: &str, access_token: String) -> Self {
        Self {
            access_token,
            refresh_token: format!("refresh-{}", Uuid::new_v4()),
            email: email.to_string(),
        }
    }

    /// Response body for the auth endpoints.
    pub fn to_json(&self) -> Value {
        json!({
            "accessToken": self.access_token,
            "refreshToken": self.refresh_token,
            "email": self.email,
        })
    }
}

/// Resource type body.
pub fn resource_type_json(id: i64, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": null,
    })
}

/// Active resource of type `ROOM`.
pub fn resource_json(id: Uuid, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "description": "Second floor",
        "resourceType": resource_type_json(TEST_TYPE_ROOM, "ROOM"),
        "location": "HQ",
        "active": true,
        "createdAt": "2026-01-05T08:00:00",
        "updatedAt": "2026-01-05T08:00:00",
    })
}

/// Reservation body with the given status (`ACTIVE` or `CANCELLED`).
pub fn reservation_json(id: Uuid, resource_id: Uuid, status: &str) -> Value {
    json!({
        "id": id,
        "resourceId": resource_id,
        "resourceName": "Room A",
        "userId": TEST_USER_ALICE,
        "userEmail": TEST_EMAIL_ALICE,
        "startTime": "2026-02-12T09:00:00",
        "endTime": "2026-02-12T10:00:00",
        "status": status,
        "notes": null,
        "cancelledById": null,
        "cancelledAt": null,
        "createdAt": "2026-02-01T12:00:00",
        "updatedAt": "2026-02-01T12:00:00",
    })
}

/// Backend error body.
pub fn error_json(status: u16, message: &str) -> Value {
    json!({
        "status": status,
        "error": "Error",
        "message": message,
        "timestamp": "2026-02-12T09:00:00",
    })
}
