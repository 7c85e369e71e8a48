//! Integration tests for the proactive refresh scheduler

#![allow(clippy::unwrap_used, clippy::expect_used)]

use crate::helpers::{signed_in_client, signed_out_client, test_config};
use common::secret::ExposeSecret;
use reserva_client::session::SessionState;
use reserva_client::token_store::CredentialStore;
use reserva_test_utils::*;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Poll `check` every 20ms until it holds or `limit` passes.
async fn wait_until<F, Fut>(limit: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}

#[tokio::test]
async fn test_scheduler_refreshes_token_inside_refresh_window() {
    let backend = MockBackend::start().await;
    let expiring = AuthFixture::with_access_token(
        TEST_EMAIL_ALICE,
        TestTokenBuilder::new().for_user(TEST_EMAIL_ALICE).expires_in(30).build(),
    );
    let next = AuthFixture::new(TEST_EMAIL_ALICE);
    backend.mount_refresh(&expiring.refresh_token, &next, 1).await;

    let config = test_config(&backend)
        .with_refresh_ahead(Duration::from_secs(60))
        .with_min_refresh_interval(Duration::from_millis(100));
    let (client, store) = signed_in_client(&config, &expiring).await;

    let cancel = CancellationToken::new();
    let handle = client.spawn_refresh_scheduler(cancel.clone());

    let refreshed = wait_until(Duration::from_secs(3), || {
        let store = store.clone();
        let expected = next.access_token.clone();
        async move {
            store
                .access_token()
                .await
                .unwrap()
                .is_some_and(|token| token.expose_secret() == expected)
        }
    })
    .await;
    assert!(refreshed, "scheduler should refresh the expiring token");

    // The new token is good for an hour, so nothing else is due
    tokio::time::sleep(Duration::from_millis(300)).await;

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("scheduler stops on cancel")
        .unwrap();

    backend.verify().await;
}

#[tokio::test]
async fn test_scheduler_signs_out_when_refresh_rejected() {
    let backend = MockBackend::start().await;
    let expiring = AuthFixture::with_access_token(
        TEST_EMAIL_ALICE,
        TestTokenBuilder::new().expires_in(-5).build(),
    );
    backend.mount_refresh_failure(401, 1).await;

    let config = test_config(&backend).with_min_refresh_interval(Duration::from_millis(50));
    let (client, store) = signed_in_client(&config, &expiring).await;
    let mut state = client.subscribe();

    let cancel = CancellationToken::new();
    let handle = client.spawn_refresh_scheduler(cancel.clone());

    tokio::time::timeout(Duration::from_secs(2), state.changed())
        .await
        .expect("session state should change")
        .unwrap();
    assert_eq!(state.state(), SessionState::SignedOut);
    assert!(store.load().await.unwrap().is_none());

    // Signed out: the scheduler idles instead of hammering the backend
    tokio::time::sleep(Duration::from_millis(200)).await;

    cancel.cancel();
    handle.await.unwrap();
    backend.verify().await;
}

#[tokio::test]
async fn test_scheduler_retries_after_transient_failure() {
    let backend = MockBackend::start().await;
    let expiring = AuthFixture::with_access_token(
        TEST_EMAIL_ALICE,
        TestTokenBuilder::new().expires_in(-5).build(),
    );
    let next = AuthFixture::new(TEST_EMAIL_ALICE);
    backend.mount_refresh_failure_once(503).await;
    backend.mount_refresh(&expiring.refresh_token, &next, 1).await;

    let config = test_config(&backend).with_min_refresh_interval(Duration::from_millis(50));
    let (client, store) = signed_in_client(&config, &expiring).await;

    let cancel = CancellationToken::new();
    let handle = client.spawn_refresh_scheduler(cancel.clone());

    // First attempt fails, the retry comes after the 1s initial backoff
    let refreshed = wait_until(Duration::from_secs(4), || {
        let store = store.clone();
        let expected = next.access_token.clone();
        async move {
            store
                .access_token()
                .await
                .unwrap()
                .is_some_and(|token| token.expose_secret() == expected)
        }
    })
    .await;
    assert!(refreshed, "scheduler should retry and refresh after a 503");
    assert!(client.state().is_authenticated());
    assert_eq!(backend.requests_to(REFRESH_PATH).await.len(), 2);

    cancel.cancel();
    handle.await.unwrap();
    backend.verify().await;
}

#[tokio::test]
async fn test_scheduler_picks_up_later_sign_in() {
    let backend = MockBackend::start().await;
    let expiring = AuthFixture::with_access_token(
        TEST_EMAIL_ALICE,
        TestTokenBuilder::new().expires_in(10).build(),
    );
    let next = AuthFixture::new(TEST_EMAIL_ALICE);
    backend.mount_refresh(&expiring.refresh_token, &next, 1).await;

    let config = test_config(&backend).with_min_refresh_interval(Duration::from_millis(50));
    let (client, store) = signed_out_client(&config).await;

    let cancel = CancellationToken::new();
    let handle = client.spawn_refresh_scheduler(cancel.clone());

    tokio::time::sleep(Duration::from_millis(100)).await;
    let auth = serde_json::from_value(expiring.to_json()).unwrap();
    client.session().sign_in(auth).await.unwrap();

    let refreshed = wait_until(Duration::from_secs(3), || {
        let store = store.clone();
        let expected = next.access_token.clone();
        async move {
            store
                .load()
                .await
                .unwrap()
                .is_some_and(|c| c.access_token.expose_secret() == expected)
        }
    })
    .await;
    assert!(refreshed, "scheduler should refresh after sign-in");
    assert_eq!(
        client.state(),
        SessionState::SignedIn {
            email: TEST_EMAIL_ALICE.to_string(),
            is_admin: false,
        }
    );

    cancel.cancel();
    handle.await.unwrap();
    backend.verify().await;
}

#[tokio::test]
async fn test_scheduler_stops_on_cancel_while_idle() {
    let backend = MockBackend::start().await;
    let session = AuthFixture::new(TEST_EMAIL_BOB);
    let (client, store) = signed_in_client(&test_config(&backend), &session).await;

    let cancel = CancellationToken::new();
    let handle = client.spawn_refresh_scheduler(cancel.clone());
    cancel.cancel();

    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("scheduler stops on cancel")
        .unwrap();

    // Nothing was due, nothing was sent
    assert!(backend.received_requests().await.is_empty());
    assert_eq!(store.load().await.unwrap().unwrap().email, TEST_EMAIL_BOB);
}
