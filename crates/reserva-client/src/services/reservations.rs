//! Reservation endpoints (`/api/reservations`).
//!
//! Overlap checks and availability are computed by the backend; a
//! conflicting `create` comes back as a 409 whose message mentions the
//! overlap (see [`ClientError::is_overlap`]).

use crate::api_client::ApiClient;
use crate::errors::ClientError;
use crate::format::to_api_date_time;
use crate::models::{AvailabilitySlot, CreateReservationRequest, ReservationResponse};
use chrono::NaiveDateTime;
use common::types::{ReservationId, ResourceId};

const BASE_PATH: &str = "/api/reservations";

#[derive(Debug, Clone)]
pub struct ReservationsService {
    api: ApiClient,
}

impl ReservationsService {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// # Errors
    ///
    /// Returns `ClientError::Api` (409 on overlap, 400 on invalid range).
    pub async fn create(
        &self,
        request: &CreateReservationRequest,
    ) -> Result<ReservationResponse, ClientError> {
        self.api.post(BASE_PATH, request).await
    }

    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 404 when the reservation doesn't exist.
    pub async fn get(&self, id: ReservationId) -> Result<ReservationResponse, ClientError> {
        self.api.get(&format!("{BASE_PATH}/{id}")).await
    }

    /// All active reservations (admin view).
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on failure.
    pub async fn active(&self) -> Result<Vec<ReservationResponse>, ClientError> {
        self.api.get(&format!("{BASE_PATH}/active")).await
    }

    /// The signed-in user's active reservations.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on failure.
    pub async fn my_active(&self) -> Result<Vec<ReservationResponse>, ClientError> {
        self.api.get(&format!("{BASE_PATH}/my")).await
    }

    /// The signed-in user's full history, cancelled included.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on failure.
    pub async fn my_history(&self) -> Result<Vec<ReservationResponse>, ClientError> {
        self.api.get(&format!("{BASE_PATH}/my/history")).await
    }

    /// # Errors
    ///
    /// Returns `ClientError` on failure.
    pub async fn resource_history(
        &self,
        resource_id: ResourceId,
    ) -> Result<Vec<ReservationResponse>, ClientError> {
        self.api
            .get(&format!("{BASE_PATH}/resource/{resource_id}/history"))
            .await
    }

    /// Availability slots for a resource between `start` and `end`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on failure.
    pub async fn resource_availability(
        &self,
        resource_id: ResourceId,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<AvailabilitySlot>, ClientError> {
        self.api
            .get_with_query(
                &format!("{BASE_PATH}/resource/{resource_id}/availability"),
                &[
                    ("start", to_api_date_time(start)),
                    ("end", to_api_date_time(end)),
                ],
            )
            .await
    }

    /// # Errors
    ///
    /// Returns `ClientError::Api` (403 when cancelling someone else's reservation).
    pub async fn cancel(&self, id: ReservationId) -> Result<ReservationResponse, ClientError> {
        self.api.patch(&format!("{BASE_PATH}/{id}/cancel")).await
    }
}
