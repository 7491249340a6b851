use crate::domain::models::schedule::WeeklySchedule;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct CreateLocationRequest {
    pub name: String,
    pub timezone: String,
    pub calendar_id: String,
}

#[derive(Deserialize)]
pub struct PublishScheduleRequest {
    pub schedule: WeeklySchedule,
    pub horizon_weeks: Option<u32>,
}

#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub duration_min: i64,
    pub exclude_event: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateReservationRequest {
    pub client_id: String,
    pub date: String,
    pub start: String,
    pub duration_min: i64,
}

#[derive(Deserialize)]
pub struct CancelReservationRequest {
    pub client_id: String,
}

#[derive(Deserialize)]
pub struct RescheduleReservationRequest {
    pub client_id: String,
    pub date: String,
    pub start: String,
    pub duration_min: Option<i64>,
    pub location_id: Option<String>,
}
