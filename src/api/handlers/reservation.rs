use axum::{extract::{Path, State}, http::StatusCode, response::IntoResponse, Json};
use chrono::{NaiveDate, NaiveTime};
use std::sync::Arc;
use tracing::info;

use crate::api::dtos::requests::{
    CancelReservationRequest, CreateReservationRequest, RescheduleReservationRequest,
};
use crate::api::dtos::responses::ReservationResponse;
use crate::domain::services::reservation::build_window;
use crate::error::AppError;
use crate::state::AppState;

fn parse_date(value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| AppError::Validation("Invalid date format (YYYY-MM-DD)".into()))
}

fn parse_time(value: &str) -> Result<NaiveTime, AppError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| AppError::Validation("Invalid time format (HH:MM)".into()))
}

pub async fn create_reservation(
    State(state): State<Arc<AppState>>,
    Path(location_id): Path<String>,
    Json(payload): Json<CreateReservationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let date = parse_date(&payload.date)?;
    let start = parse_time(&payload.start)?;
    let window = build_window(date, start, payload.duration_min)?;

    let slot = state
        .reservation_service
        .book(&location_id, &payload.client_id, window)
        .await?;

    let response = ReservationResponse::from_slot(&slot).ok_or(AppError::Internal)?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn cancel_reservation(
    State(state): State<Arc<AppState>>,
    Path(reservation_id): Path<String>,
    Json(payload): Json<CancelReservationRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .reservation_service
        .cancel(&payload.client_id, &reservation_id)
        .await?;

    info!("Reservation cancelled: {}", reservation_id);
    Ok(Json(serde_json::json!({ "status": "cancelled" })))
}

pub async fn reschedule_reservation(
    State(state): State<Arc<AppState>>,
    Path(reservation_id): Path<String>,
    Json(payload): Json<RescheduleReservationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let date = parse_date(&payload.date)?;
    let start = parse_time(&payload.start)?;

    // Unless told otherwise the appointment keeps its original length.
    let duration_min = match payload.duration_min {
        Some(duration) => duration,
        None => {
            let slot = state.slot_repo.find_by_reservation(&reservation_id).await?
                .ok_or_else(|| AppError::NotFound("Reservation not found".into()))?;
            let reservation = slot.reservation.ok_or(AppError::Internal)?;
            (reservation.end_time - reservation.start_time).num_minutes()
        }
    };
    let window = build_window(date, start, duration_min)?;

    let slot = state
        .reservation_service
        .reschedule(
            &payload.client_id,
            &reservation_id,
            window,
            payload.location_id.as_deref(),
        )
        .await?;

    let response = ReservationResponse::from_slot(&slot).ok_or(AppError::Internal)?;
    info!("Reservation rescheduled: {}", reservation_id);
    Ok(Json(response))
}
