use axum::{extract::{Path, State}, http::StatusCode, response::IntoResponse, Json};
use chrono_tz::Tz;
use std::sync::Arc;
use tracing::info;

use crate::api::dtos::requests::CreateLocationRequest;
use crate::domain::models::location::Location;
use crate::error::AppError;
use crate::state::AppState;

pub async fn create_location(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateLocationRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("Name must not be empty".into()));
    }
    if payload.timezone.parse::<Tz>().is_err() {
        return Err(AppError::Validation(format!("Unknown timezone: {}", payload.timezone)));
    }
    if payload.calendar_id.trim().is_empty() {
        return Err(AppError::Validation("calendar_id must not be empty".into()));
    }

    let location = Location::new(payload.name, payload.timezone, payload.calendar_id);
    let created = state.location_repo.create(&location).await?;

    info!("Location created: {}", created.id);
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_location(
    State(state): State<Arc<AppState>>,
    Path(location_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let location = state.location_repo.find_by_id(&location_id).await?
        .ok_or_else(|| AppError::NotFound("Location not found".into()))?;
    Ok(Json(location))
}

pub async fn list_locations(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let locations = state.location_repo.list().await?;
    Ok(Json(locations))
}
