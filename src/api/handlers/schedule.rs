use axum::{extract::{Path, State}, response::IntoResponse, Json};
use chrono::Utc;
use chrono_tz::Tz;
use std::sync::Arc;
use tracing::info;

use crate::api::dtos::requests::PublishScheduleRequest;
use crate::api::dtos::responses::PublishScheduleResponse;
use crate::domain::services::scheduling::expand_schedule;
use crate::error::AppError;
use crate::state::AppState;

/// Publishes a weekly template for a location and expands it into dated
/// slots over the rolling horizon. Expansion is all-or-nothing; re-running
/// it for an unchanged template creates nothing thanks to the slots'
/// natural-key uniqueness.
pub async fn publish_schedule(
    State(state): State<Arc<AppState>>,
    Path(location_id): Path<String>,
    Json(payload): Json<PublishScheduleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let location = state.location_repo.find_by_id(&location_id).await?
        .ok_or_else(|| AppError::NotFound("Location not found".into()))?;

    let horizon_weeks = payload.horizon_weeks.unwrap_or(state.config.slot_horizon_weeks);
    if horizon_weeks == 0 || horizon_weeks > 52 {
        return Err(AppError::Validation("Horizon must be between 1 and 52 weeks".into()));
    }

    let tz: Tz = location.timezone.parse().unwrap_or(chrono_tz::UTC);
    let now_local = Utc::now().with_timezone(&tz).naive_local();

    let slots = expand_schedule(&location.id, &payload.schedule, horizon_weeks, now_local)?;

    let schedule_json = serde_json::to_string(&payload.schedule)
        .map_err(|e| AppError::InternalWithMsg(format!("Could not serialize schedule: {}", e)))?;
    state.location_repo.update_schedule(&location.id, &schedule_json).await?;

    let created_slots = state.slot_repo.insert_batch(&slots).await?;

    info!(
        "Published schedule for {}: {} new slots over {} weeks",
        location.id, created_slots, horizon_weeks
    );
    Ok(Json(PublishScheduleResponse {
        horizon_weeks,
        created_slots,
    }))
}
