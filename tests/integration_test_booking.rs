mod common;

use axum::http::StatusCode;
use chrono::{Days, TimeZone, Utc};
use common::{next_monday, parse_body, TestApp};
use reservation_backend::domain::models::calendar::AvailabilityWindow;
use reservation_backend::domain::models::slot::SlotStatus;
use reservation_backend::error::AppError;
use serde_json::json;
use std::sync::atomic::Ordering;
use tokio::task::JoinSet;

#[tokio::test]
async fn test_booking_happy_path() {
    let app = TestApp::new().await;
    let location_id = app.create_location("Happy Clinic").await;
    app.publish_monday_schedule(&location_id, 3).await;

    let monday = next_monday();
    let res = app
        .post_json(
            &format!("/api/v1/locations/{}/reservations", location_id),
            json!({
                "client_id": "client-1",
                "date": monday.to_string(),
                "start": "10:00",
                "duration_min": 60
            }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let body = parse_body(res).await;
    assert_eq!(body["client_id"].as_str().unwrap(), "client-1");
    assert_eq!(body["date"].as_str().unwrap(), monday.to_string());
    assert_eq!(body["start"].as_str().unwrap(), "10:00:00");
    assert_eq!(body["end"].as_str().unwrap(), "11:00:00");
    assert!(body["external_event_link"].as_str().unwrap().starts_with("https://"));

    let reservation_id = body["reservation_id"].as_str().unwrap();
    let slot = app
        .state
        .slot_repo
        .find_by_reservation(reservation_id)
        .await
        .unwrap()
        .expect("Slot must hold the reservation");
    assert_eq!(slot.status, SlotStatus::Booked);
    let reservation = slot.reservation.unwrap();
    assert_eq!(reservation.start_time.to_string(), "10:00:00");
    assert_eq!(reservation.end_time.to_string(), "11:00:00");

    let event = app.calendar.event(&reservation.external_event_id).expect("Event must exist");
    assert_eq!(event.start, Utc.from_utc_datetime(&monday.and_hms_opt(10, 0, 0).unwrap()));
    assert!(
        !event.summary.contains("Pending"),
        "Event is confirmed once the claim succeeds"
    );
}

#[tokio::test]
async fn test_losing_the_race_compensates_the_event() {
    let app = TestApp::new().await;
    let location_id = app.create_location("Race Clinic").await;
    app.publish_monday_schedule(&location_id, 2).await;

    let monday = next_monday();
    let payload = json!({
        "client_id": "client-1",
        "date": monday.to_string(),
        "start": "10:00",
        "duration_min": 120
    });

    let first = app
        .post_json(&format!("/api/v1/locations/{}/reservations", location_id), payload.clone())
        .await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app
        .post_json(
            &format!("/api/v1/locations/{}/reservations", location_id),
            json!({
                "client_id": "client-2",
                "date": monday.to_string(),
                "start": "10:00",
                "duration_min": 120
            }),
        )
        .await;
    assert_eq!(second.status(), StatusCode::CONFLICT);

    // The loser's tentative event was retracted; the winner's remains.
    assert_eq!(app.calendar.deleted_ids().len(), 1);
    assert_eq!(app.calendar.event_count(), 1);
}

#[tokio::test]
async fn test_calendar_create_failure_aborts_before_any_claim() {
    let app = TestApp::new().await;
    let location_id = app.create_location("Outage Clinic").await;
    app.publish_monday_schedule(&location_id, 2).await;

    app.calendar.fail_create.store(true, Ordering::SeqCst);

    let monday = next_monday();
    let res = app
        .post_json(
            &format!("/api/v1/locations/{}/reservations", location_id),
            json!({
                "client_id": "client-1",
                "date": monday.to_string(),
                "start": "10:00",
                "duration_min": 60
            }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);

    assert_eq!(app.calendar.event_count(), 0);
    let yesterday = Utc::now().date_naive() - Days::new(1);
    let open = app.state.slot_repo.find_open(&location_id, yesterday).await.unwrap();
    assert!(
        open.iter().all(|s| s.status == SlotStatus::Available),
        "No slot may be mutated when the calendar call fails"
    );
}

#[tokio::test]
async fn test_past_date_rejected_without_side_effects() {
    let app = TestApp::new().await;
    let location_id = app.create_location("Past Clinic").await;
    app.publish_monday_schedule(&location_id, 2).await;

    let res = app
        .post_json(
            &format!("/api/v1/locations/{}/reservations", location_id),
            json!({
                "client_id": "client-1",
                "date": "2020-01-06",
                "start": "10:00",
                "duration_min": 60
            }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.calendar.event_count(), 0, "Validation happens before any calendar I/O");
}

#[tokio::test]
async fn test_window_outside_any_slot_is_conflict() {
    let app = TestApp::new().await;
    let location_id = app.create_location("Edge Clinic").await;
    app.publish_monday_schedule(&location_id, 2).await;

    let monday = next_monday();
    // 11:30 + 60min spills past the 12:00 window end.
    let res = app
        .post_json(
            &format!("/api/v1/locations/{}/reservations", location_id),
            json!({
                "client_id": "client-1",
                "date": monday.to_string(),
                "start": "11:30",
                "duration_min": 60
            }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    // The tentative event was created, then retracted on the failed claim.
    assert_eq!(app.calendar.deleted_ids().len(), 1);
    assert_eq!(app.calendar.event_count(), 0);
}

#[tokio::test]
async fn test_exactly_one_concurrent_claim_succeeds() {
    let app = TestApp::new().await;
    let location_id = app.create_location("Stampede Clinic").await;
    app.publish_monday_schedule(&location_id, 2).await;

    let monday = next_monday();
    let window = AvailabilityWindow {
        date: monday,
        start: "10:00:00".parse().unwrap(),
        end: "11:00:00".parse().unwrap(),
    };

    let mut set = JoinSet::new();
    for i in 0..10 {
        let service = app.state.reservation_service.clone();
        let location_id = location_id.clone();
        let window = window.clone();
        set.spawn(async move {
            service.book(&location_id, &format!("client-{}", i), window).await
        });
    }

    let mut won = 0;
    let mut lost = 0;
    while let Some(result) = set.join_next().await {
        match result.unwrap() {
            Ok(_) => won += 1,
            Err(AppError::NoAvailability(_)) => lost += 1,
            Err(e) => panic!("Unexpected booking failure: {:?}", e),
        }
    }

    assert_eq!(won, 1, "Exactly one concurrent claim may succeed");
    assert_eq!(lost, 9);
    assert_eq!(app.calendar.event_count(), 1, "Every losing event was retracted");
    assert_eq!(app.calendar.deleted_ids().len(), 9);
}
