//! Resource endpoints (`/api/resources`).

use crate::api_client::ApiClient;
use crate::errors::ClientError;
use crate::models::{ResourceFilters, ResourceRequest, ResourceResponse};
use common::types::ResourceId;

const BASE_PATH: &str = "/api/resources";

#[derive(Debug, Clone)]
pub struct ResourcesService {
    api: ApiClient,
}

impl ResourcesService {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// List resources; only the filters that are set become query parameters.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on transport, status, or decoding failure.
    pub async fn list(&self, filters: &ResourceFilters) -> Result<Vec<ResourceResponse>, ClientError> {
        self.api.get_with_query(BASE_PATH, &filters.to_query()).await
    }

    /// # Errors
    ///
    /// Returns `ClientError::Api` with status 404 when the resource doesn't exist.
    pub async fn get(&self, id: ResourceId) -> Result<ResourceResponse, ClientError> {
        self.api.get(&format!("{BASE_PATH}/{id}")).await
    }

    /// Admin only.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` on rejection.
    pub async fn create(&self, request: &ResourceRequest) -> Result<ResourceResponse, ClientError> {
        self.api.post(BASE_PATH, request).await
    }

    /// Admin only.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` on rejection.
    pub async fn update(
        &self,
        id: ResourceId,
        request: &ResourceRequest,
    ) -> Result<ResourceResponse, ClientError> {
        self.api.put(&format!("{BASE_PATH}/{id}"), request).await
    }

    /// Admin only.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` on rejection.
    pub async fn delete(&self, id: ResourceId) -> Result<(), ClientError> {
        self.api.delete(&format!("{BASE_PATH}/{id}")).await
    }
}
