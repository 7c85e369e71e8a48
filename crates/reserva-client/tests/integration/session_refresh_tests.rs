//! Integration tests for reactive refresh
//!
//! A `401` from the API triggers one shared refresh and a single replay;
//! the outcome of a failed refresh decides whether the session survives.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use crate::helpers::{signed_in_client, test_config};
use common::secret::ExposeSecret;
use reserva_client::errors::ClientError;
use reserva_client::session::{SessionError, SessionState};
use reserva_client::token_store::CredentialStore;
use reserva_test_utils::*;
use serde_json::json;
use std::time::Duration;

const MY_RESERVATIONS: &str = "/api/reservations/my";

// ============================================================================
// Deduplication
// ============================================================================

/// Five requests rejected with the same expired token share one refresh and
/// all succeed on replay with the new token.
#[tokio::test]
async fn test_concurrent_unauthorized_requests_share_one_refresh() {
    let backend = MockBackend::start().await;
    let old = AuthFixture::new(TEST_EMAIL_ALICE);
    let new = AuthFixture::new(TEST_EMAIL_ALICE);

    backend.mount_get_rejecting(&old.access_token, MY_RESERVATIONS).await;
    backend
        .mount_get_with_token(&new.access_token, MY_RESERVATIONS, json!([]))
        .await;
    backend
        .mount_refresh_delayed(&old.refresh_token, &new, 1, Duration::from_millis(200))
        .await;

    let (client, store) = signed_in_client(&test_config(&backend), &old).await;
    let reservations = client.reservations();

    let results =
        futures::future::join_all((0..5).map(|_| reservations.my_active())).await;

    for result in results {
        assert!(result.unwrap().is_empty());
    }

    let stored = store.load().await.unwrap().unwrap();
    assert_eq!(stored.access_token.expose_secret(), new.access_token);
    assert_eq!(stored.refresh_token.expose_secret(), new.refresh_token);

    backend.verify().await;
}

/// A request rejected with a token that was already replaced skips the
/// network refresh and replays with the stored token.
#[tokio::test]
async fn test_stale_rejection_reuses_already_refreshed_token() {
    let backend = MockBackend::start().await;
    let old = AuthFixture::new(TEST_EMAIL_ALICE);
    let new = AuthFixture::new(TEST_EMAIL_ALICE);

    backend.mount_refresh(&old.refresh_token, &new, 0).await;

    let (client, store) = signed_in_client(&test_config(&backend), &new).await;

    let token = client
        .session()
        .refresh(Some(&common::secret::SecretString::from(old.access_token.clone())))
        .await
        .unwrap();

    assert_eq!(token.expose_secret(), new.access_token);
    assert!(store.load().await.unwrap().is_some());
    backend.verify().await;
}

/// The replayed request carries the refreshed token.
#[tokio::test]
async fn test_retry_uses_refreshed_token() {
    let backend = MockBackend::start().await;
    let old = AuthFixture::new(TEST_EMAIL_ALICE);
    let new = AuthFixture::new(TEST_EMAIL_ALICE);

    backend.mount_get_rejecting(&old.access_token, MY_RESERVATIONS).await;
    backend
        .mount_get_with_token(&new.access_token, MY_RESERVATIONS, json!([]))
        .await;
    backend.mount_refresh(&old.refresh_token, &new, 1).await;

    let (client, _store) = signed_in_client(&test_config(&backend), &old).await;
    client.reservations().my_active().await.unwrap();

    let headers: Vec<_> = backend
        .requests_to(MY_RESERVATIONS)
        .await
        .iter()
        .filter_map(authorization_header)
        .collect();
    assert_eq!(
        headers,
        vec![
            format!("Bearer {}", old.access_token),
            format!("Bearer {}", new.access_token),
        ]
    );
}

/// A request that is still unauthorized after the refresh fails with 401
/// instead of refreshing again.
#[tokio::test]
async fn test_second_unauthorized_is_not_retried() {
    let backend = MockBackend::start().await;
    let old = AuthFixture::new(TEST_EMAIL_ALICE);
    let new = AuthFixture::new(TEST_EMAIL_ALICE);

    backend.mount_get_rejecting(&old.access_token, MY_RESERVATIONS).await;
    backend.mount_get_rejecting(&new.access_token, MY_RESERVATIONS).await;
    backend.mount_refresh(&old.refresh_token, &new, 1).await;

    let (client, _store) = signed_in_client(&test_config(&backend), &old).await;
    let err = client.reservations().my_active().await.unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert_eq!(backend.requests_to(MY_RESERVATIONS).await.len(), 2);
    backend.verify().await;
}

// ============================================================================
// Failure handling
// ============================================================================

/// A rejected refresh token ends the session: credentials cleared, state
/// signed out, caller told to sign in again.
#[tokio::test]
async fn test_rejected_refresh_signs_out() {
    let backend = MockBackend::start().await;
    let old = AuthFixture::new(TEST_EMAIL_ALICE);

    backend.mount_get_rejecting(&old.access_token, MY_RESERVATIONS).await;
    backend.mount_refresh_failure(401, 1).await;

    let (client, store) = signed_in_client(&test_config(&backend), &old).await;
    let mut state = client.subscribe();

    let err = client.reservations().my_active().await.unwrap_err();

    assert!(matches!(err, ClientError::SessionExpired(_)), "got {err:?}");
    assert_eq!(err.user_message(), "Session expired. Please log in again");
    assert!(store.load().await.unwrap().is_none());
    assert_eq!(client.state(), SessionState::SignedOut);

    tokio::time::timeout(Duration::from_secs(1), state.changed())
        .await
        .expect("state change published")
        .unwrap();
    assert_eq!(state.state(), SessionState::SignedOut);

    backend.verify().await;
}

/// A backend outage during refresh keeps the session for a later retry.
#[tokio::test]
async fn test_transient_refresh_failure_keeps_credentials() {
    let backend = MockBackend::start().await;
    let old = AuthFixture::new(TEST_EMAIL_ALICE);

    backend.mount_get_rejecting(&old.access_token, MY_RESERVATIONS).await;
    backend.mount_refresh_failure(503, 1).await;

    let (client, store) = signed_in_client(&test_config(&backend), &old).await;
    let err = client.reservations().my_active().await.unwrap_err();

    assert!(matches!(err, ClientError::Refresh(_)), "got {err:?}");
    assert_eq!(err.user_message(), "Network error. Please try again");

    let stored = store.load().await.unwrap().unwrap();
    assert_eq!(stored.access_token.expose_secret(), old.access_token);
    assert!(client.state().is_authenticated());

    backend.verify().await;
}

/// With nothing stored, a 401 cannot be recovered and no refresh is sent.
#[tokio::test]
async fn test_unauthorized_without_session_does_not_call_refresh() {
    let backend = MockBackend::start().await;
    backend
        .mount_json("GET", MY_RESERVATIONS, 401, error_json(401, "Unauthorized"))
        .await;
    backend.mount_refresh_failure(500, 0).await;

    let (client, _store) = crate::helpers::signed_out_client(&test_config(&backend)).await;
    let err = client.reservations().my_active().await.unwrap_err();

    assert!(matches!(err, ClientError::SessionExpired(_)), "got {err:?}");
    let requests = backend.requests_to(MY_RESERVATIONS).await;
    assert_eq!(authorization_header(requests.first().unwrap()), None);
    backend.verify().await;
}

// ============================================================================
// Session changes during a refresh
// ============================================================================

/// Signing out while a refresh is on the wire wins: the late response is
/// discarded and nothing is written back.
#[tokio::test]
async fn test_sign_out_during_refresh_stays_signed_out() {
    let backend = MockBackend::start().await;
    let old = AuthFixture::new(TEST_EMAIL_ALICE);
    let new = AuthFixture::new(TEST_EMAIL_ALICE);

    backend
        .mount_refresh_delayed(&old.refresh_token, &new, 1, Duration::from_millis(300))
        .await;

    let (client, store) = signed_in_client(&test_config(&backend), &old).await;
    let session = client.session().clone();
    let refresh = tokio::spawn(async move { session.refresh(None).await });

    tokio::time::sleep(Duration::from_millis(50)).await;
    client.session().sign_out().await.unwrap();

    let err = refresh.await.unwrap().unwrap_err();
    assert_eq!(err, SessionError::Superseded);
    assert_eq!(client.state(), SessionState::SignedOut);
    assert!(store.load().await.unwrap().is_none());

    backend.verify().await;
}

/// A sign-in that lands while an older refresh is in flight keeps its own
/// credentials; the refresh caller is handed the new session's token.
#[tokio::test]
async fn test_sign_in_during_refresh_keeps_new_credentials() {
    let backend = MockBackend::start().await;
    let old = AuthFixture::new(TEST_EMAIL_ALICE);
    let refreshed = AuthFixture::new(TEST_EMAIL_ALICE);
    let bob = AuthFixture::new(TEST_EMAIL_BOB);

    backend
        .mount_refresh_delayed(&old.refresh_token, &refreshed, 1, Duration::from_millis(300))
        .await;

    let (client, store) = signed_in_client(&test_config(&backend), &old).await;
    let session = client.session().clone();
    let refresh = tokio::spawn(async move { session.refresh(None).await });

    tokio::time::sleep(Duration::from_millis(50)).await;
    let auth = serde_json::from_value(bob.to_json()).unwrap();
    client.session().sign_in(auth).await.unwrap();

    let token = refresh.await.unwrap().unwrap();
    assert_eq!(token.expose_secret(), bob.access_token);

    let stored = store.load().await.unwrap().unwrap();
    assert_eq!(stored.access_token.expose_secret(), bob.access_token);
    assert_eq!(stored.refresh_token.expose_secret(), bob.refresh_token);
    assert_eq!(client.state().email(), Some(TEST_EMAIL_BOB));

    backend.verify().await;
}

/// An explicit refresh issued while a 401-triggered refresh is in flight
/// joins it instead of sending a second request.
#[tokio::test]
async fn test_explicit_refresh_joins_reactive_refresh() {
    let backend = MockBackend::start().await;
    let old = AuthFixture::new(TEST_EMAIL_ALICE);
    let new = AuthFixture::new(TEST_EMAIL_ALICE);

    backend.mount_get_rejecting(&old.access_token, MY_RESERVATIONS).await;
    backend
        .mount_get_with_token(&new.access_token, MY_RESERVATIONS, json!([]))
        .await;
    backend
        .mount_refresh_delayed(&old.refresh_token, &new, 1, Duration::from_millis(300))
        .await;

    let (client, _store) = signed_in_client(&test_config(&backend), &old).await;
    let listing_client = client.clone();
    let listing =
        tokio::spawn(async move { listing_client.reservations().my_active().await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    let token = client.auth().refresh().await.unwrap();

    assert_eq!(token.expose_secret(), new.access_token);
    assert!(listing.await.unwrap().unwrap().is_empty());
    assert_eq!(backend.requests_to(REFRESH_PATH).await.len(), 1);

    backend.verify().await;
}
