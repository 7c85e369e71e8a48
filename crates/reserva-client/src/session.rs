//! Session management with deduplicated token refresh.
//!
//! The session owns the credential store and publishes its state on a
//! `tokio::sync::watch` channel. Access tokens are refreshed two ways:
//!
//! - **Proactive**: [`spawn_refresh_scheduler`] sleeps until
//!   `max(expires_in - refresh_ahead, min_refresh_interval)` and refreshes
//!   before the backend starts rejecting the token.
//! - **Reactive**: [`crate::api_client::ApiClient`] calls
//!   [`SessionManager::refresh`] when a request comes back `401`.
//!
//! # Deduplication
//!
//! At most one `POST /api/auth/refresh` is in flight. The first caller
//! stores the refresh as a [`Shared`] future; every concurrent caller awaits
//! a clone of it and receives the same result. A caller that brings the
//! token its request was rejected with (`stale`) skips the network entirely
//! if the stored token has already moved on.
//!
//! The shared future removes itself from the in-flight slot when it
//! completes, so a finished refresh is never handed to a later caller.
//!
//! # Session epochs
//!
//! `sign_in`, `sign_out` and a forced sign-out each start a new epoch. A
//! refresh records the epoch it started in and discards its outcome if the
//! epoch moved on while the request was in flight: a user who signed out
//! stays signed out, and newer credentials are never overwritten.
//!
//! # Failure handling
//!
//! - Irrecoverable (no refresh token, `400`/`401`/`403`, malformed body):
//!   credentials are cleared and the state becomes `SignedOut`.
//! - Transient (transport, timeout, `5xx`): credentials are kept and the
//!   error is returned; the scheduler retries with exponential backoff
//!   (1s, 2s, 4s, ..., max 30s).

use crate::config::ClientConfig;
use crate::models::{AuthResponse, RefreshTokenRequest};
use crate::observability::metrics;
use crate::token_store::{CredentialStore, StoredCredentials};
use common::jwt;
use common::secret::{same_secret, ExposeSecret, SecretString};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};

// =============================================================================
// Constants
// =============================================================================

/// Refresh endpoint, relative to the API base URL.
pub const REFRESH_PATH: &str = "/api/auth/refresh";

/// Initial backoff delay for scheduler retries.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Maximum backoff delay.
const MAX_BACKOFF_MS: u64 = 30_000;

/// Default connection timeout for the refresh HTTP client.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during session management.
///
/// Payloads are strings so the error is `Clone` and can be handed to every
/// caller awaiting the same shared refresh.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No refresh token is stored; the user must sign in.
    #[error("No refresh token available")]
    NoRefreshToken,

    /// The backend refused the refresh token (400, 401, 403).
    #[error("Refresh rejected: {0}")]
    RefreshRejected(String),

    /// Refresh succeeded but the body could not be parsed.
    #[error("Invalid refresh response: {0}")]
    InvalidResponse(String),

    /// Transport failure or unexpected status.
    #[error("HTTP client error: {0}")]
    HttpError(String),

    /// Credential store failure.
    #[error("Credential storage error: {0}")]
    Storage(String),

    /// HTTP client could not be built.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The session was signed out while the refresh was in flight.
    #[error("Session ended while refreshing")]
    Superseded,

    /// Watch channel closed unexpectedly.
    #[error("Session channel closed")]
    ChannelClosed,
}

impl SessionError {
    /// True when the session cannot be recovered without signing in again.
    #[must_use]
    pub fn is_irrecoverable(&self) -> bool {
        matches!(
            self,
            SessionError::NoRefreshToken
                | SessionError::RefreshRejected(_)
                | SessionError::InvalidResponse(_)
                | SessionError::Superseded
        )
    }
}

// =============================================================================
// Session State
// =============================================================================

/// Authentication state observed by front ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Credentials have not been read yet.
    Loading,
    SignedOut,
    SignedIn {
        email: String,
        /// Advisory, from the access token's roles. The backend enforces access.
        is_admin: bool,
    },
}

impl SessionState {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::SignedIn { .. })
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        match self {
            SessionState::SignedIn { email, .. } => Some(email),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(self, SessionState::SignedIn { is_admin: true, .. })
    }
}

/// What caused a refresh, used for logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    /// Scheduled ahead of expiry.
    Proactive,
    /// A request came back 401.
    Reactive,
    /// Requested directly by the caller.
    Explicit,
}

impl RefreshTrigger {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RefreshTrigger::Proactive => "proactive",
            RefreshTrigger::Reactive => "reactive",
            RefreshTrigger::Explicit => "explicit",
        }
    }
}

/// Wrapper around the watch receiver that hands out cloned state.
///
/// Cloning keeps the borrow short so the sender is never blocked.
#[derive(Debug, Clone)]
pub struct SessionReceiver(watch::Receiver<SessionState>);

impl SessionReceiver {
    /// Current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.0.borrow().clone()
    }

    /// Wait for the state to change.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::ChannelClosed` if the session was dropped.
    pub async fn changed(&mut self) -> Result<(), SessionError> {
        self.0
            .changed()
            .await
            .map_err(|_| SessionError::ChannelClosed)
    }
}

// =============================================================================
// Session Manager
// =============================================================================

type SharedRefresh = Shared<BoxFuture<'static, Result<SecretString, SessionError>>>;

/// Everything a refresh needs, owned so the shared future is `'static`.
struct RefreshContext {
    store: Arc<dyn CredentialStore>,
    http_client: reqwest::Client,
    refresh_url: String,
    state_tx: watch::Sender<SessionState>,
    /// Bumped on every sign-in and sign-out; held while credentials change.
    epoch: Mutex<u64>,
}

impl RefreshContext {
    fn publish_signed_in(&self, email: String, access_token: &SecretString) {
        let next = SessionState::SignedIn {
            email,
            is_admin: jwt::is_admin(access_token.expose_secret()),
        };
        self.state_tx.send_if_modified(|state| {
            if *state == next {
                false
            } else {
                *state = next;
                true
            }
        });
    }

    async fn current_epoch(&self) -> u64 {
        *self.epoch.lock().await
    }

    /// Apply a refresh outcome, unless the session changed since `started_epoch`.
    async fn apply_refresh(
        &self,
        started_epoch: u64,
        result: Result<AuthResponse, SessionError>,
    ) -> Result<SecretString, SessionError> {
        let mut epoch = self.epoch.lock().await;

        if *epoch != started_epoch {
            debug!(
                target: "reserva.session",
                "Session changed during refresh, discarding its outcome"
            );
            return match self.store.access_token().await {
                Ok(Some(current)) => Ok(current),
                Ok(None) => Err(SessionError::Superseded),
                Err(e) => Err(SessionError::Storage(e.to_string())),
            };
        }

        match result {
            Ok(auth) => {
                let access_token = auth.access_token.clone();
                let email = auth.email.clone();

                self.store
                    .save(&StoredCredentials::from(auth))
                    .await
                    .map_err(|e| SessionError::Storage(e.to_string()))?;

                self.publish_signed_in(email, &access_token);
                Ok(access_token)
            }
            Err(e) if e.is_irrecoverable() => {
                if let Err(clear_err) = self.store.clear().await {
                    warn!(
                        target: "reserva.session",
                        error = %clear_err,
                        "Failed to clear credentials during forced sign-out"
                    );
                }
                *epoch += 1;
                info!(target: "reserva.session", error = %e, "Session ended, signing out");
                self.state_tx.send_replace(SessionState::SignedOut);
                Err(e)
            }
            Err(e) => Err(e),
        }
    }
}

type InFlight = Mutex<Option<(u64, SharedRefresh)>>;

/// Owner of the session: credentials, state, and the refresh machinery.
pub struct SessionManager {
    ctx: Arc<RefreshContext>,
    /// In-flight refresh tagged with a generation so only its own future clears it.
    in_flight: Arc<InFlight>,
    next_generation: std::sync::atomic::AtomicU64,
    refresh_ahead: Duration,
    min_refresh_interval: Duration,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("refresh_url", &self.ctx.refresh_url)
            .field("state", &*self.ctx.state_tx.borrow())
            .field("refresh_ahead", &self.refresh_ahead)
            .field("min_refresh_interval", &self.min_refresh_interval)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Create a session manager. The state starts as `Loading` until
    /// [`SessionManager::bootstrap`] runs.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Configuration` if the HTTP client cannot be built.
    pub fn new(
        config: &ClientConfig,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self, SessionError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .map_err(|e| {
                SessionError::Configuration(format!("Failed to build HTTP client: {e}"))
            })?;

        let (state_tx, _) = watch::channel(SessionState::Loading);

        Ok(Self {
            ctx: Arc::new(RefreshContext {
                store,
                http_client,
                refresh_url: format!("{}{REFRESH_PATH}", config.api_url),
                state_tx,
                epoch: Mutex::new(0),
            }),
            in_flight: Arc::new(Mutex::new(None)),
            next_generation: std::sync::atomic::AtomicU64::new(0),
            refresh_ahead: config.refresh_ahead,
            min_refresh_interval: config.min_refresh_interval,
        })
    }

    /// Read stored credentials and publish the initial state.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the store cannot be read; the state
    /// becomes `SignedOut` in that case.
    #[instrument(skip_all)]
    pub async fn bootstrap(&self) -> Result<SessionState, SessionError> {
        let stored = match self.ctx.store.load().await {
            Ok(stored) => stored,
            Err(e) => {
                self.ctx.state_tx.send_replace(SessionState::SignedOut);
                return Err(SessionError::Storage(e.to_string()));
            }
        };

        match stored {
            Some(credentials) => {
                debug!(target: "reserva.session", "Restored stored session");
                self.ctx
                    .publish_signed_in(credentials.email, &credentials.access_token);
            }
            None => {
                debug!(target: "reserva.session", "No stored session");
                self.ctx.state_tx.send_replace(SessionState::SignedOut);
            }
        }

        Ok(self.state())
    }

    /// Persist a freshly issued token pair and mark the session signed in.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the credentials cannot be saved.
    pub async fn sign_in(&self, auth: AuthResponse) -> Result<(), SessionError> {
        let email = auth.email.clone();
        let access_token = auth.access_token.clone();

        {
            let mut epoch = self.ctx.epoch.lock().await;
            self.ctx
                .store
                .save(&StoredCredentials::from(auth))
                .await
                .map_err(|e| SessionError::Storage(e.to_string()))?;
            *epoch += 1;

            info!(target: "reserva.session", "Signed in");
            self.ctx.publish_signed_in(email, &access_token);
        }

        self.abandon_in_flight().await;
        Ok(())
    }

    /// Clear credentials and mark the session signed out.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the store cannot be cleared. The
    /// state is `SignedOut` regardless.
    pub async fn sign_out(&self) -> Result<(), SessionError> {
        let result = {
            let mut epoch = self.ctx.epoch.lock().await;
            let result = self
                .ctx
                .store
                .clear()
                .await
                .map_err(|e| SessionError::Storage(e.to_string()));
            *epoch += 1;

            info!(target: "reserva.session", "Signed out");
            self.ctx.state_tx.send_replace(SessionState::SignedOut);
            result
        };

        self.abandon_in_flight().await;
        result
    }

    /// Stop handing the current in-flight refresh to new callers.
    ///
    /// Callers already awaiting it still get its result, which the epoch
    /// check keeps from touching the new session.
    async fn abandon_in_flight(&self) {
        if self.in_flight.lock().await.take().is_some() {
            debug!(target: "reserva.session", "Detached in-flight refresh from the old session");
        }
    }

    /// The stored access token, if any.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the store cannot be read.
    pub async fn access_token(&self) -> Result<Option<SecretString>, SessionError> {
        self.ctx
            .store
            .access_token()
            .await
            .map_err(|e| SessionError::Storage(e.to_string()))
    }

    /// Current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.ctx.state_tx.borrow().clone()
    }

    /// Subscribe to session state changes.
    #[must_use]
    pub fn subscribe(&self) -> SessionReceiver {
        SessionReceiver(self.ctx.state_tx.subscribe())
    }

    /// Delay before the next proactive refresh of `access_token`.
    ///
    /// `max(expires_in - refresh_ahead, min_refresh_interval)`; an expired
    /// or undecodable token yields the minimum interval.
    #[must_use]
    pub fn next_refresh_delay(&self, access_token: &SecretString) -> Duration {
        jwt::expires_in(access_token.expose_secret())
            .saturating_sub(self.refresh_ahead)
            .max(self.min_refresh_interval)
    }

    /// Refresh the access token on the caller's request, sharing any refresh
    /// already in flight. Recorded with the `explicit` trigger; the API client
    /// and the scheduler go through [`SessionManager::refresh_as`].
    ///
    /// Pass the token a request was rejected with as `stale`: if the stored
    /// token differs, another caller already refreshed and the stored token
    /// is returned without a network call.
    ///
    /// # Errors
    ///
    /// Returns `SessionError`; check [`SessionError::is_irrecoverable`] to
    /// know whether the session was ended.
    pub async fn refresh(&self, stale: Option<&SecretString>) -> Result<SecretString, SessionError> {
        self.refresh_as(stale, RefreshTrigger::Explicit).await
    }

    /// [`SessionManager::refresh`] with an explicit trigger for logs and metrics.
    ///
    /// # Errors
    ///
    /// See [`SessionManager::refresh`].
    pub async fn refresh_as(
        &self,
        stale: Option<&SecretString>,
        trigger: RefreshTrigger,
    ) -> Result<SecretString, SessionError> {
        let shared = {
            let mut slot = self.in_flight.lock().await;

            if let Some((_, pending)) = slot.as_ref() {
                trace!(
                    target: "reserva.session",
                    trigger = trigger.as_str(),
                    "Joining in-flight refresh"
                );
                metrics::record_refresh_joined(trigger.as_str());
                pending.clone()
            } else {
                if let Some(stale) = stale {
                    match self.access_token().await? {
                        Some(current) if !same_secret(&current, stale) => {
                            debug!(
                                target: "reserva.session",
                                trigger = trigger.as_str(),
                                "Token already refreshed by another caller"
                            );
                            return Ok(current);
                        }
                        _ => {}
                    }
                }

                self.start_refresh(&mut slot, trigger)
            }
        };

        shared.await
    }

    /// Create the shared refresh and publish it in `slot`.
    ///
    /// The future clears the slot itself on completion, before any caller
    /// sees its output, so a caller dropped mid-await leaves nothing behind.
    fn start_refresh(
        &self,
        slot: &mut Option<(u64, SharedRefresh)>,
        trigger: RefreshTrigger,
    ) -> SharedRefresh {
        let generation = self
            .next_generation
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let ctx = Arc::clone(&self.ctx);
        let in_flight = Arc::downgrade(&self.in_flight);

        let pending = async move {
            let result = perform_refresh(ctx, trigger).await;
            if let Some(in_flight) = in_flight.upgrade() {
                let mut slot = in_flight.lock().await;
                if slot.as_ref().is_some_and(|(g, _)| *g == generation) {
                    *slot = None;
                }
            }
            result
        }
        .boxed()
        .shared();

        *slot = Some((generation, pending.clone()));
        pending
    }
}

/// Run one refresh against the backend and apply its outcome to the session.
#[instrument(skip_all, fields(trigger = trigger.as_str()))]
async fn perform_refresh(
    ctx: Arc<RefreshContext>,
    trigger: RefreshTrigger,
) -> Result<SecretString, SessionError> {
    let started = std::time::Instant::now();
    let started_epoch = ctx.current_epoch().await;
    let response = request_refresh(&ctx).await;
    let result = ctx.apply_refresh(started_epoch, response).await;

    let outcome = match &result {
        Ok(_) => "success",
        Err(SessionError::Superseded) => "superseded",
        Err(e) if e.is_irrecoverable() => "rejected",
        Err(_) => "error",
    };
    metrics::record_refresh(trigger.as_str(), outcome, started.elapsed());

    match &result {
        Ok(_) => {
            debug!(target: "reserva.session", trigger = trigger.as_str(), "Token refreshed successfully");
        }
        Err(SessionError::Superseded) => {
            debug!(target: "reserva.session", trigger = trigger.as_str(), "Refresh outlived its session");
        }
        Err(e) if e.is_irrecoverable() => {
            warn!(
                target: "reserva.session",
                trigger = trigger.as_str(),
                error = %e,
                "Token refresh failed irrecoverably"
            );
        }
        Err(e) => {
            warn!(
                target: "reserva.session",
                trigger = trigger.as_str(),
                error = %e,
                "Token refresh failed, credentials kept"
            );
        }
    }

    result
}

/// `POST /api/auth/refresh` with the stored refresh token. Applying the
/// outcome to the session is left to [`RefreshContext::apply_refresh`].
async fn request_refresh(ctx: &RefreshContext) -> Result<AuthResponse, SessionError> {
    let refresh_token = ctx
        .store
        .refresh_token()
        .await
        .map_err(|e| SessionError::Storage(e.to_string()))?
        .ok_or(SessionError::NoRefreshToken)?;

    let request = RefreshTokenRequest {
        refresh_token: refresh_token.expose_secret().to_string(),
    };

    debug!(target: "reserva.session", url = %ctx.refresh_url, "Requesting token refresh");

    let response = ctx
        .http_client
        .post(&ctx.refresh_url)
        .json(&request)
        .send()
        .await
        .map_err(|e| {
            debug!(target: "reserva.session", error = %e, "HTTP request failed");
            SessionError::HttpError(e.to_string())
        })?;

    let status = response.status();

    if status.is_success() {
        let auth: AuthResponse = response.json().await.map_err(|e| {
            warn!(target: "reserva.session", error = %e, "Failed to parse refresh response");
            SessionError::InvalidResponse(e.to_string())
        })?;

        if auth.access_token.expose_secret().is_empty() {
            return Err(SessionError::InvalidResponse(
                "empty access token".to_string(),
            ));
        }

        Ok(auth)
    } else if matches!(status.as_u16(), 400 | 401 | 403) {
        // Body only at trace level: it may echo the token back
        let body = response.text().await.unwrap_or_else(|e| {
            trace!(target: "reserva.session", error = %e, "Failed to read error response body");
            "<failed to read body>".to_string()
        });
        warn!(target: "reserva.session", status = %status, "Refresh token rejected");
        trace!(target: "reserva.session", body = %body, "Refresh rejection response body");
        Err(SessionError::RefreshRejected(format!("Status {status}")))
    } else if status.is_server_error() {
        warn!(target: "reserva.session", status = %status, "Backend returned server error on refresh");
        Err(SessionError::HttpError(format!("server error: {status}")))
    } else {
        warn!(target: "reserva.session", status = %status, "Unexpected refresh response");
        Err(SessionError::HttpError(format!("Unexpected status: {status}")))
    }
}

// =============================================================================
// Proactive refresh
// =============================================================================

/// Spawn the proactive refresh task.
///
/// The task runs until `cancel` fires. While signed out it idles until the
/// session state changes.
#[must_use]
pub fn spawn_refresh_scheduler(
    session: Arc<SessionManager>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        refresh_loop(session, cancel).await;
    })
}

#[instrument(skip_all)]
async fn refresh_loop(session: Arc<SessionManager>, cancel: CancellationToken) {
    let mut state_rx = session.ctx.state_tx.subscribe();
    let mut backoff = INITIAL_BACKOFF_MS;

    loop {
        drop(state_rx.borrow_and_update());

        let token = match session.access_token().await {
            Ok(Some(token)) => token,
            Ok(None) => {
                trace!(target: "reserva.session", "No session, waiting for sign-in");
                tokio::select! {
                    () = cancel.cancelled() => break,
                    changed = state_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        continue;
                    }
                }
            }
            Err(e) => {
                warn!(target: "reserva.session", error = %e, "Failed to read access token");
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(session.min_refresh_interval) => continue,
                }
            }
        };

        let delay = session.next_refresh_delay(&token);
        debug!(
            target: "reserva.session",
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "Scheduled proactive refresh"
        );

        tokio::select! {
            () = cancel.cancelled() => break,
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                continue;
            }
            () = tokio::time::sleep(delay) => {}
        }

        match session
            .refresh_as(Some(&token), RefreshTrigger::Proactive)
            .await
        {
            Ok(_) => backoff = INITIAL_BACKOFF_MS,
            Err(e) if e.is_irrecoverable() => backoff = INITIAL_BACKOFF_MS,
            Err(e) => {
                warn!(
                    target: "reserva.session",
                    error = %e,
                    backoff_ms = backoff,
                    "Proactive refresh failed, will retry"
                );
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(Duration::from_millis(backoff)) => {}
                }
                backoff = (backoff * 2).min(MAX_BACKOFF_MS);
            }
        }
    }

    debug!(target: "reserva.session", "Refresh scheduler stopped");
}

// =============================================================================
// Tests
// =============================================================================
