//! Wire types for the Reserva REST API.
//!
//! Field names follow the backend's camelCase JSON. Date-times are
//! zone-less ISO-8601 (`2026-02-12T09:00:00`) and map to
//! `chrono::NaiveDateTime`.

use chrono::NaiveDateTime;
use common::secret::SecretString;
use common::types::{ReservationId, ResourceId, ResourceTypeId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Error body
// =============================================================================

/// Error body returned by the backend on non-2xx responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// Auth
// =============================================================================

/// Request body for `POST /api/auth/register`.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish()
    }
}

/// Request body for `POST /api/auth/login`.
#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Request body for `POST /api/auth/refresh`.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

impl fmt::Debug for RefreshTokenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshTokenRequest")
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

/// Token pair issued by login, register and refresh.
///
/// Tokens are `SecretString`, so the derived `Debug` is redacted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
    pub email: String,
}

// =============================================================================
// Resource types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceTypeRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResourceTypeResponse {
    pub id: ResourceTypeId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

// =============================================================================
// Resources
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub resource_type_id: ResourceTypeId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceResponse {
    pub id: ResourceId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub resource_type: ResourceTypeResponse,
    #[serde(default)]
    pub location: Option<String>,
    pub active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Optional filters for `GET /api/resources`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceFilters {
    pub active: Option<bool>,
    pub type_id: Option<ResourceTypeId>,
}

impl ResourceFilters {
    /// Query parameters for the filters that are set.
    #[must_use]
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(active) = self.active {
            query.push(("active", active.to_string()));
        }
        if let Some(type_id) = self.type_id {
            query.push(("typeId", type_id.to_string()));
        }
        query
    }
}

// =============================================================================
// Reservations
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Active,
    Cancelled,
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReservationStatus::Active => f.write_str("ACTIVE"),
            ReservationStatus::Cancelled => f.write_str("CANCELLED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReservationRequest {
    pub resource_id: ResourceId,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationResponse {
    pub id: ReservationId,
    pub resource_id: ResourceId,
    pub resource_name: String,
    pub user_id: UserId,
    pub user_email: String,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub status: ReservationStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub cancelled_by_id: Option<UserId>,
    #[serde(default)]
    pub cancelled_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ReservationResponse {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == ReservationStatus::Active
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AvailabilitySlot {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub available: bool,
}
