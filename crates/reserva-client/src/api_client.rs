//! Authenticated HTTP client for the Reserva REST API.
//!
//! Every request goes through [`ApiClient::send`]:
//!
//! 1. Public auth endpoints go out without credentials; everything else
//!    carries `Authorization: Bearer <access token>` when one is stored.
//! 2. A `401` on a non-auth endpoint triggers one shared refresh via the
//!    [`SessionManager`] and a single replay with the new token.
//! 3. Non-success responses become [`ClientError::Api`] with the backend's
//!    message and a sanitized body.

use crate::config::ClientConfig;
use crate::errors::{sanitize_error_body, ClientError};
use crate::models::ApiErrorBody;
use crate::observability::metrics;
use crate::session::{RefreshTrigger, SessionManager};
use common::secret::{ExposeSecret, SecretString};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

/// Default connection timeout for API requests.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Endpoints reachable without an access token.
pub const PUBLIC_PATHS: [&str; 3] = ["/api/auth/login", "/api/auth/register", "/api/auth/refresh"];

/// Prefix of endpoints that never trigger a refresh-and-retry.
const AUTH_PATH_PREFIX: &str = "/api/auth/";

/// True for endpoints that must not carry an access token.
#[must_use]
pub fn is_public_path(path: &str) -> bool {
    PUBLIC_PATHS.iter().any(|public| path.starts_with(public))
}

fn is_auth_path(path: &str) -> bool {
    path.starts_with(AUTH_PATH_PREFIX)
}

/// HTTP client bound to one backend and one session.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http_client: reqwest::Client,
    base_url: String,
    session: Arc<SessionManager>,
}

impl ApiClient {
    /// Create a client for `config.api_url` sharing `session`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Http` if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig, session: Arc<SessionManager>) -> Result<Self, ClientError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            http_client,
            base_url: config.api_url.clone(),
            session,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    /// `GET` and decode the JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.get_with_query(path, &[]).await
    }

    /// `GET` with query parameters and decode the JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let response = self.send::<()>(Method::GET, path, query, None).await?;
        decode_json(response).await
    }

    /// `POST` a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(Method::POST, path, &[], Some(body)).await?;
        decode_json(response).await
    }

    /// `POST` without a body, ignoring any response body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn post_empty(&self, path: &str) -> Result<(), ClientError> {
        self.send::<()>(Method::POST, path, &[], None).await?;
        Ok(())
    }

    /// `PUT` a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(Method::PUT, path, &[], Some(body)).await?;
        decode_json(response).await
    }

    /// `PATCH` without a body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn patch<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.send::<()>(Method::PATCH, path, &[], None).await?;
        decode_json(response).await
    }

    /// `DELETE`, ignoring any response body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`].
    pub async fn delete(&self, path: &str) -> Result<(), ClientError> {
        self.send::<()>(Method::DELETE, path, &[], None).await?;
        Ok(())
    }

    /// Send a request with auth attached, refreshing once on `401`.
    ///
    /// Returns the successful response.
    ///
    /// # Errors
    ///
    /// - `ClientError::Http` on transport failure
    /// - `ClientError::Api` on a non-success status
    /// - `ClientError::SessionExpired` when the refresh was rejected (credentials cleared)
    /// - `ClientError::Refresh` when the refresh failed transiently
    #[instrument(skip_all, fields(method = %method, path = path))]
    pub async fn send<B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<reqwest::Response, ClientError>
    where
        B: Serialize + ?Sized,
    {
        let token = if is_public_path(path) {
            None
        } else {
            self.session.access_token().await?
        };

        let response = self
            .dispatch(&method, path, query, body, token.as_ref())
            .await?;

        if response.status() != StatusCode::UNAUTHORIZED || is_auth_path(path) {
            return check_status(response).await;
        }

        debug!(target: "reserva.api_client", "Request unauthorized, refreshing session");

        let fresh = self
            .session
            .refresh_as(token.as_ref(), RefreshTrigger::Reactive)
            .await?;

        let retried = self
            .dispatch(&method, path, query, body, Some(&fresh))
            .await?;

        if retried.status() == StatusCode::UNAUTHORIZED {
            warn!(target: "reserva.api_client", "Request still unauthorized after refresh");
        }

        check_status(retried).await
    }

    async fn dispatch<B>(
        &self,
        method: &Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
        token: Option<&SecretString>,
    ) -> Result<reqwest::Response, ClientError>
    where
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http_client.request(method.clone(), &url);

        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = token {
            request = request.bearer_auth(token.expose_secret());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let started = Instant::now();
        let result = request.send().await;
        metrics::record_http_request(
            method.as_str(),
            result.as_ref().ok().map(|r| r.status().as_u16()),
            started.elapsed(),
        );

        result.map_err(|e| {
            debug!(target: "reserva.api_client", error = %e, "HTTP request failed");
            ClientError::Http(e)
        })
    }
}

/// Pass successful responses through; turn everything else into `ClientError::Api`.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .ok()
        .and_then(|parsed| parsed.message)
        .filter(|message| !message.trim().is_empty());

    debug!(
        target: "reserva.api_client",
        status = status.as_u16(),
        "Backend returned error status"
    );

    Err(ClientError::Api {
        status: status.as_u16(),
        message,
        body: sanitize_error_body(&body),
    })
}

async fn decode_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| {
        warn!(target: "reserva.api_client", error = %e, "Failed to parse response body");
        ClientError::InvalidResponse(e.to_string())
    })
}
