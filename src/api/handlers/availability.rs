use axum::{extract::{Path, Query, State}, response::IntoResponse, Json};
use std::sync::Arc;

use crate::api::dtos::requests::AvailabilityQuery;
use crate::api::dtos::responses::AvailabilityResponse;
use crate::error::AppError;
use crate::state::AppState;

pub async fn list_availability(
    State(state): State<Arc<AppState>>,
    Path(location_id): Path<String>,
    Query(params): Query<AvailabilityQuery>,
) -> Result<impl IntoResponse, AppError> {
    let windows = state
        .availability_service
        .list_availability(
            &location_id,
            params.duration_min,
            params.exclude_event.as_deref(),
        )
        .await?;
    Ok(Json(AvailabilityResponse { windows }))
}
