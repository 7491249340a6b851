pub mod postgres_location_repo;
pub mod postgres_slot_repo;
pub mod sqlite_location_repo;
pub mod sqlite_slot_repo;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::FromRow;

use crate::domain::models::slot::{Reservation, Slot, SlotStatus};
use crate::error::AppError;

/// Raw `slots` row. Reservation columns are nullable in the store; the
/// conversion below refuses to produce a claimed slot with missing
/// reservation data, so that state stays unrepresentable in the domain.
#[derive(FromRow)]
pub(crate) struct SlotRow {
    pub id: String,
    pub location_id: String,
    pub date: NaiveDate,
    pub window_start: NaiveTime,
    pub window_end: NaiveTime,
    pub status: String,
    pub expiry: NaiveDate,
    pub reservation_id: Option<String>,
    pub client_id: Option<String>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub external_event_id: Option<String>,
    pub external_event_link: Option<String>,
    pub booked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<SlotRow> for Slot {
    type Error = AppError;

    fn try_from(row: SlotRow) -> Result<Self, Self::Error> {
        let status = SlotStatus::parse(&row.status).ok_or_else(|| {
            AppError::InternalWithMsg(format!(
                "Slot {} has unknown status {}",
                row.id, row.status
            ))
        })?;

        let reservation = match (
            row.reservation_id,
            row.client_id,
            row.start_time,
            row.end_time,
            row.external_event_id,
        ) {
            (
                Some(id),
                Some(client_id),
                Some(start_time),
                Some(end_time),
                Some(external_event_id),
            ) => Some(Reservation {
                id,
                client_id,
                start_time,
                end_time,
                external_event_id,
                external_event_link: row.external_event_link,
                booked_at: row.booked_at.unwrap_or(row.created_at),
            }),
            // A parked (RESCHEDULING) slot legitimately carries no
            // reservation mid-transition; a BOOKED one never may.
            _ if status == SlotStatus::Booked => {
                return Err(AppError::InternalWithMsg(format!(
                    "Slot {} is BOOKED without reservation data",
                    row.id
                )));
            }
            _ => None,
        };

        Ok(Slot {
            id: row.id,
            location_id: row.location_id,
            date: row.date,
            window_start: row.window_start,
            window_end: row.window_end,
            status,
            expiry: row.expiry,
            reservation,
            created_at: row.created_at,
        })
    }
}
