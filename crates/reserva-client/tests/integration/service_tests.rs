//! Integration tests for the resource, resource type and reservation services
//!
//! Checks paths, methods, query parameters and the mapping of backend errors.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use crate::helpers::{signed_in_client, test_config};
use chrono::NaiveDate;
use common::types::{ReservationId, ResourceId, ResourceTypeId};
use reserva_client::models::{
    CreateReservationRequest, ReservationStatus, ResourceFilters, ResourceRequest,
    ResourceTypeRequest,
};
use reserva_client::ReservaClient;
use reserva_test_utils::*;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

async fn client_for(backend: &MockBackend) -> (ReservaClient, AuthFixture) {
    let session = AuthFixture::new(TEST_EMAIL_ALICE);
    let (client, _store) = signed_in_client(&test_config(backend), &session).await;
    (client, session)
}

// ============================================================================
// Resources
// ============================================================================

#[tokio::test]
async fn test_list_resources_with_filters() {
    let backend = MockBackend::start().await;
    let (client, session) = client_for(&backend).await;

    Mock::given(method("GET"))
        .and(path("/api/resources"))
        .and(query_param("active", "true"))
        .and(query_param("typeId", "1"))
        .and(header(
            "Authorization",
            format!("Bearer {}", session.access_token).as_str(),
        ))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([resource_json(TEST_RESOURCE_ROOM_A, "Room A")])),
        )
        .expect(1)
        .mount(backend.server())
        .await;

    let resources = client
        .resources()
        .list(&ResourceFilters {
            active: Some(true),
            type_id: Some(ResourceTypeId(TEST_TYPE_ROOM)),
        })
        .await
        .unwrap();

    assert_eq!(resources.len(), 1);
    let room = resources.first().unwrap();
    assert_eq!(room.id, ResourceId(TEST_RESOURCE_ROOM_A));
    assert_eq!(room.resource_type.name, "ROOM");
    assert!(room.active);
    backend.verify().await;
}

#[tokio::test]
async fn test_list_resources_without_filters_sends_no_query() {
    let backend = MockBackend::start().await;
    let (client, _session) = client_for(&backend).await;
    backend.mount_json("GET", "/api/resources", 200, json!([])).await;

    let resources = client
        .resources()
        .list(&ResourceFilters::default())
        .await
        .unwrap();

    assert!(resources.is_empty());
    let requests = backend.requests_to("/api/resources").await;
    assert_eq!(requests.first().unwrap().url.query(), None);
}

#[tokio::test]
async fn test_create_update_delete_resource() {
    let backend = MockBackend::start().await;
    let (client, _session) = client_for(&backend).await;
    let resource_path = format!("/api/resources/{TEST_RESOURCE_VAN}");

    Mock::given(method("POST"))
        .and(path("/api/resources"))
        .and(body_json(json!({
            "name": "Van",
            "resourceTypeId": TEST_TYPE_VEHICLE,
            "location": "Garage",
        })))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(resource_json(TEST_RESOURCE_VAN, "Van")),
        )
        .expect(1)
        .mount(backend.server())
        .await;
    Mock::given(method("PUT"))
        .and(path(resource_path.as_str()))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(resource_json(TEST_RESOURCE_VAN, "Van 2")),
        )
        .expect(1)
        .mount(backend.server())
        .await;
    Mock::given(method("DELETE"))
        .and(path(resource_path.as_str()))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(backend.server())
        .await;

    let mut request = ResourceRequest {
        name: "Van".to_string(),
        description: None,
        resource_type_id: ResourceTypeId(TEST_TYPE_VEHICLE),
        location: Some("Garage".to_string()),
    };
    let created = client.resources().create(&request).await.unwrap();
    assert_eq!(created.name, "Van");

    request.name = "Van 2".to_string();
    let updated = client.resources().update(created.id, &request).await.unwrap();
    assert_eq!(updated.name, "Van 2");

    client.resources().delete(created.id).await.unwrap();
    backend.verify().await;
}

#[tokio::test]
async fn test_forbidden_resource_create() {
    let backend = MockBackend::start().await;
    let (client, _session) = client_for(&backend).await;
    backend
        .mount_json("POST", "/api/resources", 403, json!({ "status": 403 }))
        .await;

    let err = client
        .resources()
        .create(&ResourceRequest {
            name: "Van".to_string(),
            description: None,
            resource_type_id: ResourceTypeId(TEST_TYPE_VEHICLE),
            location: None,
        })
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(403));
    assert_eq!(err.user_message(), "You don't have permission to do that");
}

// ============================================================================
// Resource types
// ============================================================================

#[tokio::test]
async fn test_resource_type_crud_paths() {
    let backend = MockBackend::start().await;
    let (client, _session) = client_for(&backend).await;

    backend
        .mount_json(
            "GET",
            "/api/resource-types",
            200,
            json!([
                resource_type_json(TEST_TYPE_ROOM, "ROOM"),
                resource_type_json(TEST_TYPE_VEHICLE, "CORPORATE_VEHICLE"),
            ]),
        )
        .await;
    backend
        .mount_json(
            "GET",
            "/api/resource-types/6",
            200,
            resource_type_json(TEST_TYPE_VEHICLE, "CORPORATE_VEHICLE"),
        )
        .await;
    backend
        .mount_json(
            "POST",
            "/api/resource-types",
            201,
            resource_type_json(7, "PARKING_SPOT"),
        )
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/resource-types/7"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(backend.server())
        .await;

    let types = client.resource_types().list().await.unwrap();
    assert_eq!(types.len(), 2);

    let vehicle = client
        .resource_types()
        .get(ResourceTypeId(TEST_TYPE_VEHICLE))
        .await
        .unwrap();
    assert_eq!(vehicle.name, "CORPORATE_VEHICLE");

    let created = client
        .resource_types()
        .create(&ResourceTypeRequest {
            name: "PARKING_SPOT".to_string(),
            description: None,
        })
        .await
        .unwrap();
    assert_eq!(created.id, ResourceTypeId(7));

    client.resource_types().delete(created.id).await.unwrap();
    backend.verify().await;
}

// ============================================================================
// Reservations
// ============================================================================

#[tokio::test]
async fn test_create_reservation_body() {
    let backend = MockBackend::start().await;
    let (client, _session) = client_for(&backend).await;

    Mock::given(method("POST"))
        .and(path("/api/reservations"))
        .and(body_json(json!({
            "resourceId": TEST_RESOURCE_ROOM_A,
            "startTime": "2026-02-12T09:00:00",
            "endTime": "2026-02-12T10:00:00",
            "notes": "Standup",
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(reservation_json(
            TEST_RESERVATION_1,
            TEST_RESOURCE_ROOM_A,
            "ACTIVE",
        )))
        .expect(1)
        .mount(backend.server())
        .await;

    let day = NaiveDate::from_ymd_opt(2026, 2, 12).unwrap();
    let reservation = client
        .reservations()
        .create(&CreateReservationRequest {
            resource_id: ResourceId(TEST_RESOURCE_ROOM_A),
            start_time: day.and_hms_opt(9, 0, 0).unwrap(),
            end_time: day.and_hms_opt(10, 0, 0).unwrap(),
            notes: Some("Standup".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(reservation.id, ReservationId(TEST_RESERVATION_1));
    assert!(reservation.is_active());
    backend.verify().await;
}

#[tokio::test]
async fn test_overlapping_reservation_is_reported() {
    let backend = MockBackend::start().await;
    let (client, _session) = client_for(&backend).await;
    backend
        .mount_json(
            "POST",
            "/api/reservations",
            409,
            error_json(409, "Reservation overlaps with an existing reservation"),
        )
        .await;

    let day = NaiveDate::from_ymd_opt(2026, 2, 12).unwrap();
    let err = client
        .reservations()
        .create(&CreateReservationRequest {
            resource_id: ResourceId(TEST_RESOURCE_ROOM_A),
            start_time: day.and_hms_opt(9, 0, 0).unwrap(),
            end_time: day.and_hms_opt(10, 0, 0).unwrap(),
            notes: None,
        })
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(409));
    assert!(err.is_overlap());
    assert_eq!(
        err.user_message(),
        "Reservation overlaps with an existing reservation"
    );
}

#[tokio::test]
async fn test_cancel_reservation_uses_patch() {
    let backend = MockBackend::start().await;
    let (client, _session) = client_for(&backend).await;
    backend
        .mount_json(
            "PATCH",
            &format!("/api/reservations/{TEST_RESERVATION_2}/cancel"),
            200,
            reservation_json(TEST_RESERVATION_2, TEST_RESOURCE_ROOM_A, "CANCELLED"),
        )
        .await;

    let cancelled = client
        .reservations()
        .cancel(ReservationId(TEST_RESERVATION_2))
        .await
        .unwrap();

    assert_eq!(cancelled.status, ReservationStatus::Cancelled);
    assert!(!cancelled.is_active());
}

#[tokio::test]
async fn test_reservation_listing_paths() {
    let backend = MockBackend::start().await;
    let (client, _session) = client_for(&backend).await;
    let active = json!([reservation_json(TEST_RESERVATION_1, TEST_RESOURCE_ROOM_A, "ACTIVE")]);
    let history = json!([
        reservation_json(TEST_RESERVATION_1, TEST_RESOURCE_ROOM_A, "ACTIVE"),
        reservation_json(TEST_RESERVATION_2, TEST_RESOURCE_ROOM_A, "CANCELLED"),
    ]);

    backend
        .mount_json("GET", "/api/reservations/active", 200, active.clone())
        .await;
    backend
        .mount_json("GET", "/api/reservations/my", 200, active.clone())
        .await;
    backend
        .mount_json("GET", "/api/reservations/my/history", 200, history.clone())
        .await;
    backend
        .mount_json(
            "GET",
            &format!("/api/reservations/resource/{TEST_RESOURCE_ROOM_A}/history"),
            200,
            history,
        )
        .await;

    let service = client.reservations();
    assert_eq!(service.active().await.unwrap().len(), 1);
    assert_eq!(service.my_active().await.unwrap().len(), 1);
    assert_eq!(service.my_history().await.unwrap().len(), 2);
    assert_eq!(
        service
            .resource_history(ResourceId(TEST_RESOURCE_ROOM_A))
            .await
            .unwrap()
            .len(),
        2
    );
}

#[tokio::test]
async fn test_resource_availability_query() {
    let backend = MockBackend::start().await;
    let (client, _session) = client_for(&backend).await;

    Mock::given(method("GET"))
        .and(path(
            format!("/api/reservations/resource/{TEST_RESOURCE_ROOM_A}/availability").as_str(),
        ))
        .and(query_param("start", "2026-02-12T00:00:00"))
        .and(query_param("end", "2026-02-12T23:59:59"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "start": "2026-02-12T09:00:00", "end": "2026-02-12T10:00:00", "available": false },
            { "start": "2026-02-12T10:00:00", "end": "2026-02-12T11:00:00", "available": true },
        ])))
        .expect(1)
        .mount(backend.server())
        .await;

    let day = NaiveDate::from_ymd_opt(2026, 2, 12).unwrap();
    let slots = client
        .reservations()
        .resource_availability(
            ResourceId(TEST_RESOURCE_ROOM_A),
            reserva_client::format::start_of_day(day),
            reserva_client::format::end_of_day(day),
        )
        .await
        .unwrap();

    assert_eq!(slots.len(), 2);
    assert_eq!(slots.iter().filter(|s| s.available).count(), 1);
    backend.verify().await;
}

#[tokio::test]
async fn test_not_found_maps_to_api_error() {
    let backend = MockBackend::start().await;
    let (client, _session) = client_for(&backend).await;
    backend
        .mount_json(
            "GET",
            &format!("/api/reservations/{TEST_RESERVATION_1}"),
            404,
            json!({ "status": 404, "error": "Not Found" }),
        )
        .await;

    let err = client
        .reservations()
        .get(ReservationId(TEST_RESERVATION_1))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(404));
    assert_eq!(err.user_message(), "Request failed with status code 404");
}
