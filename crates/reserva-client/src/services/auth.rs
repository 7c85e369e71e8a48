//! Authentication endpoints.

use crate::api_client::ApiClient;
use crate::errors::ClientError;
use crate::models::{AuthResponse, LoginRequest, RefreshTokenRequest, RegisterRequest};
use crate::session::RefreshTrigger;
use common::secret::SecretString;
use tracing::{instrument, warn};

#[derive(Debug, Clone)]
pub struct AuthService {
    api: ApiClient,
}

impl AuthService {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Create an account and start a session with the issued tokens.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` (e.g. 409 when the email is taken) or a
    /// storage error if the session cannot be persisted.
    #[instrument(skip_all)]
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ClientError> {
        let auth: AuthResponse = self.api.post("/api/auth/register", request).await?;
        self.api.session().sign_in(auth.clone()).await?;
        Ok(auth)
    }

    /// Sign in and persist the issued tokens.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` on bad credentials or a storage error if
    /// the session cannot be persisted.
    #[instrument(skip_all)]
    pub async fn login(&self, request: &LoginRequest) -> Result<AuthResponse, ClientError> {
        let auth: AuthResponse = self.api.post("/api/auth/login", request).await?;
        self.api.session().sign_in(auth.clone()).await?;
        Ok(auth)
    }

    /// Tell the backend to end the session, then sign out locally.
    ///
    /// Local credentials are cleared even when the backend call fails; that
    /// failure is still returned.
    ///
    /// # Errors
    ///
    /// Returns the backend call's error, or a storage error from clearing.
    #[instrument(skip_all)]
    pub async fn logout(&self) -> Result<(), ClientError> {
        let remote = self.api.post_empty("/api/auth/logout").await;
        if let Err(e) = &remote {
            warn!(target: "reserva.services.auth", error = %e, "Backend logout failed, clearing local session anyway");
        }

        self.api.session().sign_out().await?;
        remote
    }

    /// Exchange the stored refresh token for a new pair now.
    ///
    /// Shares any refresh already in flight.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::SessionExpired` when the refresh token was
    /// rejected, `ClientError::Refresh` on transient failure.
    pub async fn refresh(&self) -> Result<SecretString, ClientError> {
        Ok(self
            .api
            .session()
            .refresh_as(None, RefreshTrigger::Explicit)
            .await?)
    }

    /// Exchange a specific refresh token for a new pair and persist it.
    ///
    /// Bypasses deduplication; use [`AuthService::refresh`] for the stored token.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Api` when the token is rejected.
    #[instrument(skip_all)]
    pub async fn refresh_with(
        &self,
        request: &RefreshTokenRequest,
    ) -> Result<AuthResponse, ClientError> {
        let auth: AuthResponse = self.api.post("/api/auth/refresh", request).await?;
        self.api.session().sign_in(auth.clone()).await?;
        Ok(auth)
    }
}
