use crate::domain::models::calendar::AvailabilityWindow;
use crate::domain::models::slot::Slot;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

#[derive(Serialize)]
pub struct PublishScheduleResponse {
    pub horizon_weeks: u32,
    pub created_slots: u64,
}

#[derive(Serialize)]
pub struct AvailabilityResponse {
    pub windows: Vec<AvailabilityWindow>,
}

#[derive(Serialize)]
pub struct ReservationResponse {
    pub reservation_id: String,
    pub slot_id: String,
    pub location_id: String,
    pub client_id: String,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub external_event_id: String,
    pub external_event_link: Option<String>,
    pub booked_at: DateTime<Utc>,
}

impl ReservationResponse {
    pub fn from_slot(slot: &Slot) -> Option<Self> {
        let reservation = slot.reservation.as_ref()?;
        Some(Self {
            reservation_id: reservation.id.clone(),
            slot_id: slot.id.clone(),
            location_id: slot.location_id.clone(),
            client_id: reservation.client_id.clone(),
            date: slot.date,
            start: reservation.start_time,
            end: reservation.end_time,
            external_event_id: reservation.external_event_id.clone(),
            external_event_link: reservation.external_event_link.clone(),
            booked_at: reservation.booked_at,
        })
    }
}
