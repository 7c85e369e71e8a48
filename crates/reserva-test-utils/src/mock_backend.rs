//! Mock Reserva backend for client tests
//!
//! Wraps a wiremock [`MockServer`] with helpers for the auth endpoints and
//! for bearer-checked API routes.
//!
//! # Example
//! ```rust,ignore
//! let backend = MockBackend::start().await;
//! let old = AuthFixture::new(TEST_EMAIL_ALICE);
//! let new = AuthFixture::new(TEST_EMAIL_ALICE);
//!
//! backend.mount_get_rejecting(&old.access_token, "/api/reservations/my").await;
//! backend.mount_get_with_token(&new.access_token, "/api/reservations/my", json!([])).await;
//! backend.mount_refresh(&old.refresh_token, &new, 1).await;
//! ```

use crate::fixtures::{error_json, AuthFixture};
use serde_json::Value;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const LOGIN_PATH: &str = "/api/auth/login";
pub const REGISTER_PATH: &str = "/api/auth/register";
pub const REFRESH_PATH: &str = "/api/auth/refresh";
pub const LOGOUT_PATH: &str = "/api/auth/logout";

/// Mock backend handle; the server shuts down on drop.
pub struct MockBackend {
    server: MockServer,
}

impl MockBackend {
    /// Start a mock backend on a random local port.
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL, suitable for `ClientConfig::new`.
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// The underlying server, for custom mocks.
    pub fn server(&self) -> &MockServer {
        &self.server
    }

    /// Every request received so far.
    pub async fn received_requests(&self) -> Vec<Request> {
        self.server.received_requests().await.unwrap_or_default()
    }

    /// Requests received for `request_path`.
    pub async fn requests_to(&self, request_path: &str) -> Vec<Request> {
        self.received_requests()
            .await
            .into_iter()
            .filter(|r| r.url.path() == request_path)
            .collect()
    }

    /// `POST /api/auth/login` answers with `session`.
    pub async fn mount_login(&self, session: &AuthFixture) {
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(session.to_json()))
            .mount(&self.server)
            .await;
    }

    /// `POST /api/auth/register` answers with `session`.
    pub async fn mount_register(&self, session: &AuthFixture) {
        Mock::given(method("POST"))
            .and(path(REGISTER_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(session.to_json()))
            .mount(&self.server)
            .await;
    }

    /// `POST /api/auth/logout` answers with `status`.
    pub async fn mount_logout(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path(LOGOUT_PATH))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Exchanging `refresh_token` yields `next`, expected exactly `expected_calls` times.
    pub async fn mount_refresh(&self, refresh_token: &str, next: &AuthFixture, expected_calls: u64) {
        self.mount_refresh_delayed(refresh_token, next, expected_calls, Duration::ZERO)
            .await;
    }

    /// Like [`MockBackend::mount_refresh`] but answers after `delay`, so
    /// concurrent callers overlap with the refresh.
    pub async fn mount_refresh_delayed(
        &self,
        refresh_token: &str,
        next: &AuthFixture,
        expected_calls: u64,
        delay: Duration,
    ) {
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .and(body_partial_json(
                serde_json::json!({ "refreshToken": refresh_token }),
            ))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(next.to_json())
                    .set_delay(delay),
            )
            .expect(expected_calls)
            .mount(&self.server)
            .await;
    }

    /// Refresh answers with `status` and a backend error body.
    pub async fn mount_refresh_failure(&self, status: u16, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .respond_with(
                ResponseTemplate::new(status).set_body_json(error_json(status, "Refresh failed")),
            )
            .expect(expected_calls)
            .mount(&self.server)
            .await;
    }

    /// The first refresh answers with `status`; later ones fall through to
    /// the other refresh mounts.
    pub async fn mount_refresh_failure_once(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path(REFRESH_PATH))
            .respond_with(
                ResponseTemplate::new(status).set_body_json(error_json(status, "Refresh failed")),
            )
            .up_to_n_times(1)
            .with_priority(1)
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// `GET request_path` with `Bearer access_token` answers 200 with `body`.
    pub async fn mount_get_with_token(&self, access_token: &str, request_path: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(request_path))
            .and(header("Authorization", format!("Bearer {access_token}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// `GET request_path` with `Bearer access_token` answers 401.
    pub async fn mount_get_rejecting(&self, access_token: &str, request_path: &str) {
        Mock::given(method("GET"))
            .and(path(request_path))
            .and(header("Authorization", format!("Bearer {access_token}").as_str()))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(error_json(401, "Token expired")),
            )
            .mount(&self.server)
            .await;
    }

    /// `method_name request_path` answers `status` with `body`, for any caller.
    pub async fn mount_json(&self, method_name: &str, request_path: &str, status: u16, body: Value) {
        Mock::given(method(method_name))
            .and(path(request_path))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// Verify `expect` counts now instead of on drop.
    pub async fn verify(&self) {
        self.server.verify().await;
    }
}

/// The `Authorization` header of `request`, if any.
pub fn authorization_header(request: &Request) -> Option<String> {
    request
        .headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}
