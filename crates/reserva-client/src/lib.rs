//! Reserva Client Library
//!
//! Client side of the Reserva resource-reservation system: session handling
//! with JWT refresh, an authenticated HTTP client, and typed services for the
//! backend's REST API.
//!
//! # Modules
//!
//! - `config` - Client configuration
//! - `session` - Session state and deduplicated token refresh
//! - `token_store` - Credential persistence
//! - `api_client` - Authenticated HTTP client with refresh-and-retry
//! - `services` - Typed endpoint wrappers
//! - `models` - Request/response types
//! - `validation` - Form validation
//! - `format` - Date and resource-type display helpers
//! - `errors` - Error types

pub mod api_client;
pub mod config;
pub mod errors;
pub mod format;
pub mod models;
pub mod observability;
pub mod services;
pub mod session;
pub mod token_store;
pub mod validation;

use api_client::ApiClient;
use config::ClientConfig;
use errors::ClientError;
use services::{AuthService, ReservationsService, ResourceTypesService, ResourcesService};
use session::{SessionManager, SessionReceiver, SessionState};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use token_store::CredentialStore;

/// One session plus the services that share it.
///
/// Cloning is cheap; clones share the session and connection pool.
#[derive(Debug, Clone)]
pub struct ReservaClient {
    api: ApiClient,
}

impl ReservaClient {
    /// Build a client. Call [`ReservaClient::bootstrap`] before use so stored
    /// credentials are picked up.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if an HTTP client cannot be built.
    pub fn new(config: &ClientConfig, store: Arc<dyn CredentialStore>) -> Result<Self, ClientError> {
        let session = Arc::new(SessionManager::new(config, store)?);
        let api = ApiClient::new(config, session)?;
        Ok(Self { api })
    }

    /// Restore the stored session, if any.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Refresh` wrapping the storage failure.
    pub async fn bootstrap(&self) -> Result<SessionState, ClientError> {
        Ok(self.api.session().bootstrap().await?)
    }

    /// Start proactive refresh; it runs until `cancel` fires.
    #[must_use]
    pub fn spawn_refresh_scheduler(&self, cancel: CancellationToken) -> JoinHandle<()> {
        session::spawn_refresh_scheduler(Arc::clone(self.api.session()), cancel)
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionManager> {
        self.api.session()
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.api.session().state()
    }

    #[must_use]
    pub fn subscribe(&self) -> SessionReceiver {
        self.api.session().subscribe()
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub fn auth(&self) -> AuthService {
        AuthService::new(self.api.clone())
    }

    #[must_use]
    pub fn resources(&self) -> ResourcesService {
        ResourcesService::new(self.api.clone())
    }

    #[must_use]
    pub fn resource_types(&self) -> ResourceTypesService {
        ResourceTypesService::new(self.api.clone())
    }

    #[must_use]
    pub fn reservations(&self) -> ReservationsService {
        ReservationsService::new(self.api.clone())
    }
}
