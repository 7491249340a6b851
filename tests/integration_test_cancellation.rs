mod common;

use axum::http::StatusCode;
use common::{next_monday, parse_body, TestApp};
use reservation_backend::domain::models::slot::SlotStatus;
use serde_json::json;
use std::sync::atomic::Ordering;

async fn book_next_monday(app: &TestApp, location_id: &str, client_id: &str) -> (String, String, String) {
    let res = app
        .post_json(
            &format!("/api/v1/locations/{}/reservations", location_id),
            json!({
                "client_id": client_id,
                "date": next_monday().to_string(),
                "start": "10:00",
                "duration_min": 60
            }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = parse_body(res).await;
    (
        body["reservation_id"].as_str().unwrap().to_string(),
        body["slot_id"].as_str().unwrap().to_string(),
        body["external_event_id"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn test_cancellation_releases_slot_and_event() {
    let app = TestApp::new().await;
    let location_id = app.create_location("Cancel Clinic").await;
    app.publish_monday_schedule(&location_id, 2).await;

    let (reservation_id, slot_id, event_id) = book_next_monday(&app, &location_id, "client-1").await;

    let res = app
        .post_json(
            &format!("/api/v1/reservations/{}/cancel", reservation_id),
            json!({ "client_id": "client-1" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await["status"].as_str().unwrap(), "cancelled");

    let slot = app.state.slot_repo.find_by_id(&slot_id).await.unwrap().unwrap();
    assert_eq!(slot.status, SlotStatus::Available);
    assert!(slot.reservation.is_none(), "Reservation fields are cleared on release");

    assert!(app.calendar.event(&event_id).is_none(), "Calendar event retracted");
    assert!(app.calendar.deleted_ids().contains(&event_id));
}

#[tokio::test]
async fn test_cancellation_is_idempotent_at_slot_level() {
    let app = TestApp::new().await;
    let location_id = app.create_location("Retry Clinic").await;
    app.publish_monday_schedule(&location_id, 2).await;

    let (reservation_id, slot_id, _) = book_next_monday(&app, &location_id, "client-1").await;

    let first = app
        .post_json(
            &format!("/api/v1/reservations/{}/cancel", reservation_id),
            json!({ "client_id": "client-1" }),
        )
        .await;
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .post_json(
            &format!("/api/v1/reservations/{}/cancel", reservation_id),
            json!({ "client_id": "client-1" }),
        )
        .await;
    assert_eq!(second.status(), StatusCode::NOT_FOUND);

    let slot = app.state.slot_repo.find_by_id(&slot_id).await.unwrap().unwrap();
    assert_eq!(slot.status, SlotStatus::Available);
}

#[tokio::test]
async fn test_only_the_owner_may_cancel() {
    let app = TestApp::new().await;
    let location_id = app.create_location("Strict Clinic").await;
    app.publish_monday_schedule(&location_id, 2).await;

    let (reservation_id, slot_id, event_id) = book_next_monday(&app, &location_id, "client-1").await;

    let res = app
        .post_json(
            &format!("/api/v1/reservations/{}/cancel", reservation_id),
            json!({ "client_id": "intruder" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let slot = app.state.slot_repo.find_by_id(&slot_id).await.unwrap().unwrap();
    assert_eq!(slot.status, SlotStatus::Booked);
    assert!(app.calendar.event(&event_id).is_some(), "Nothing was retracted");
}

#[tokio::test]
async fn test_unknown_reservation_is_not_found() {
    let app = TestApp::new().await;
    let res = app
        .post_json(
            "/api/v1/reservations/no-such-reservation/cancel",
            json!({ "client_id": "client-1" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_event_delete_failure_does_not_block_cancellation() {
    let app = TestApp::new().await;
    let location_id = app.create_location("Leaky Clinic").await;
    app.publish_monday_schedule(&location_id, 2).await;

    let (reservation_id, slot_id, event_id) = book_next_monday(&app, &location_id, "client-1").await;

    app.calendar.fail_delete.store(true, Ordering::SeqCst);

    let res = app
        .post_json(
            &format!("/api/v1/reservations/{}/cancel", reservation_id),
            json!({ "client_id": "client-1" }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let slot = app.state.slot_repo.find_by_id(&slot_id).await.unwrap().unwrap();
    assert_eq!(slot.status, SlotStatus::Available);
    // The stray event is a tolerated, bounded leak for reconciliation.
    assert!(app.calendar.event(&event_id).is_some());
}
