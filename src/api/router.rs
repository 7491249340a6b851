use axum::{
    body::Body,
    extract::Request,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use crate::state::AppState;
use crate::api::handlers::{availability, health, location, reservation, schedule};
use tower_http::{
    trace::TraceLayer,
    classify::ServerErrorsFailureClass,
};
use tracing::{info_span, Span, error, info};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Locations & schedules
        .route("/api/v1/locations", post(location::create_location).get(location::list_locations))
        .route("/api/v1/locations/{location_id}", get(location::get_location))
        .route("/api/v1/locations/{location_id}/schedule", put(schedule::publish_schedule))

        // Booking flow
        .route("/api/v1/locations/{location_id}/availability", get(availability::list_availability))
        .route("/api/v1/locations/{location_id}/reservations", post(reservation::create_reservation))
        .route("/api/v1/reservations/{reservation_id}/cancel", post(reservation::cancel_reservation))
        .route("/api/v1/reservations/{reservation_id}/reschedule", post(reservation::reschedule_reservation))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                })
        )
        .with_state(state)
}
