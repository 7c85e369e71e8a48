//! Input validation for sign-in, registration and reservation forms.
//!
//! Messages are user-facing and match what the backend expects; the backend
//! still validates everything again.

use crate::format::parse_api_date_time;
use crate::models::CreateReservationRequest;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use common::types::ResourceId;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Minimum password length accepted by the backend.
pub const MIN_PASSWORD_LENGTH: usize = 6;

#[allow(clippy::expect_used)]
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
});

/// A single user-facing validation message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// # Errors
///
/// "Email is required" when blank, "Invalid email format" otherwise.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() {
        return Err(ValidationError::new("Email is required"));
    }
    if !EMAIL_PATTERN.is_match(email) {
        return Err(ValidationError::new("Invalid email format"));
    }
    Ok(())
}

/// # Errors
///
/// "Password is required" when empty, or the minimum-length message.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::new("Password is required"));
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::new(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// # Errors
///
/// "`{field_name}` is required" when `value` is blank.
pub fn validate_required(value: &str, field_name: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(format!("{field_name} is required")));
    }
    Ok(())
}

/// # Errors
///
/// "Start time must be before end time" unless `start < end`.
pub fn validate_date_range(start: NaiveDateTime, end: NaiveDateTime) -> Result<(), ValidationError> {
    if start >= end {
        return Err(ValidationError::new("Start time must be before end time"));
    }
    Ok(())
}

/// [`validate_date_range`] for raw form input.
///
/// # Errors
///
/// Required-field messages for blank input, "Invalid date/time" for input
/// that doesn't parse, then the ordering check.
pub fn validate_date_range_input(start: &str, end: &str) -> Result<(), ValidationError> {
    if start.trim().is_empty() {
        return Err(ValidationError::new("Start time is required"));
    }
    if end.trim().is_empty() {
        return Err(ValidationError::new("End time is required"));
    }
    let start = parse_api_date_time(start).map_err(|_| ValidationError::new("Invalid date/time"))?;
    let end = parse_api_date_time(end).map_err(|_| ValidationError::new("Invalid date/time"))?;
    validate_date_range(start, end)
}

/// True when a backend message reports a reservation overlap.
#[must_use]
pub fn is_overlap_error(message: &str) -> bool {
    message.to_lowercase().contains("overlap")
}

// =============================================================================
// Reservation form
// =============================================================================

/// Field errors for a reservation form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservationDraftErrors {
    pub resource_id: Option<ValidationError>,
    pub date_range: Option<ValidationError>,
}

impl ReservationDraftErrors {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resource_id.is_none() && self.date_range.is_none()
    }

    /// All messages in form order.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        [&self.resource_id, &self.date_range]
            .into_iter()
            .flatten()
            .map(ToString::to_string)
            .collect()
    }
}

/// Reservation form input before validation.
///
/// The end date defaults to the start date when not given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservationDraft {
    pub resource_id: Option<ResourceId>,
    pub start_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_date: Option<NaiveDate>,
    pub end_time: Option<NaiveTime>,
    pub notes: String,
}

impl ReservationDraft {
    /// Start of the requested slot, when date and time are both set.
    #[must_use]
    pub fn start(&self) -> Option<NaiveDateTime> {
        Some(self.start_date?.and_time(self.start_time?))
    }

    /// End of the requested slot, using the start date when no end date is set.
    #[must_use]
    pub fn end(&self) -> Option<NaiveDateTime> {
        let date = self.end_date.or(self.start_date)?;
        Some(date.and_time(self.end_time?))
    }

    /// Check every field and collect the messages.
    ///
    /// # Errors
    ///
    /// Returns the per-field errors when anything is missing or out of order.
    pub fn validate(&self) -> Result<(), ReservationDraftErrors> {
        let mut errors = ReservationDraftErrors::default();

        if self.resource_id.is_none() {
            errors.resource_id = Some(ValidationError::new("Select a resource"));
        }

        errors.date_range = match (self.start(), self.end()) {
            (Some(start), Some(end)) => validate_date_range(start, end).err(),
            _ => Some(ValidationError::new(
                "Start and end date/time are required",
            )),
        };

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate and build the request body; blank notes are omitted.
    ///
    /// # Errors
    ///
    /// Returns the per-field errors from [`ReservationDraft::validate`].
    pub fn into_request(self) -> Result<CreateReservationRequest, ReservationDraftErrors> {
        self.validate()?;

        let missing = || ReservationDraftErrors {
            resource_id: None,
            date_range: Some(ValidationError::new(
                "Start and end date/time are required",
            )),
        };

        let start_time = self.start().ok_or_else(missing)?;
        let end_time = self.end().ok_or_else(missing)?;
        let resource_id = self.resource_id.ok_or_else(|| ReservationDraftErrors {
            resource_id: Some(ValidationError::new("Select a resource")),
            date_range: None,
        })?;

        let notes = self.notes.trim();
        Ok(CreateReservationRequest {
            resource_id,
            start_time,
            end_time,
            notes: (!notes.is_empty()).then(|| notes.to_string()),
        })
    }
}
