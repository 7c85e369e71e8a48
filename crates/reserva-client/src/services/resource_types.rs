//! Resource type endpoints (`/api/resource-types`).

use crate::api_client::ApiClient;
use crate::errors::ClientError;
use crate::models::{ResourceTypeRequest, ResourceTypeResponse};
use common::types::ResourceTypeId;

const BASE_PATH: &str = "/api/resource-types";

#[derive(Debug, Clone)]
pub struct ResourceTypesService {
    api: ApiClient,
}

impl ResourceTypesService {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// # Errors
    ///
    /// Returns `ClientError` on transport, status, or decoding failure.
    pub async fn list(&self) -> Result<Vec<ResourceTypeResponse>, ClientError> {
        self.api.get(BASE_PATH).await
    }

    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 404 when the type doesn't exist.
    pub async fn get(&self, id: ResourceTypeId) -> Result<ResourceTypeResponse, ClientError> {
        self.api.get(&format!("{BASE_PATH}/{id}")).await
    }

    /// Admin only.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` (403 for non-admins, 409 for duplicates).
    pub async fn create(
        &self,
        request: &ResourceTypeRequest,
    ) -> Result<ResourceTypeResponse, ClientError> {
        self.api.post(BASE_PATH, request).await
    }

    /// Admin only.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` on rejection.
    pub async fn update(
        &self,
        id: ResourceTypeId,
        request: &ResourceTypeRequest,
    ) -> Result<ResourceTypeResponse, ClientError> {
        self.api.put(&format!("{BASE_PATH}/{id}"), request).await
    }

    /// Admin only.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` on rejection.
    pub async fn delete(&self, id: ResourceTypeId) -> Result<(), ClientError> {
        self.api.delete(&format!("{BASE_PATH}/{id}")).await
    }
}
