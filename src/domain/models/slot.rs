use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};

/// Days an unclaimed slot survives past its own date before reclamation.
pub const EXPIRY_GRACE_DAYS: u64 = 7;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotStatus {
    Available,
    Booked,
    Rescheduling,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStatus::Available => "AVAILABLE",
            SlotStatus::Booked => "BOOKED",
            SlotStatus::Rescheduling => "RESCHEDULING",
        }
    }

    pub fn parse(value: &str) -> Option<SlotStatus> {
        match value {
            "AVAILABLE" => Some(SlotStatus::Available),
            "BOOKED" => Some(SlotStatus::Booked),
            "RESCHEDULING" => Some(SlotStatus::Rescheduling),
            _ => None,
        }
    }
}

/// The claim of a slot by a client for a sub-interval of its window.
/// Exists only while the owning slot is `Booked` or `Rescheduling`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Reservation {
    pub id: String,
    pub client_id: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub external_event_id: String,
    pub external_event_link: Option<String>,
    pub booked_at: DateTime<Utc>,
}

impl Reservation {
    pub fn new(
        client_id: String,
        start_time: NaiveTime,
        end_time: NaiveTime,
        external_event_id: String,
        external_event_link: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            client_id,
            start_time,
            end_time,
            external_event_id,
            external_event_link,
            booked_at: Utc::now(),
        }
    }
}

/// A dated, bounded-lifetime availability window. The window is the raw
/// bookable range published by the schedule; reservations claim a
/// sub-interval of it.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Slot {
    pub id: String,
    pub location_id: String,
    pub date: NaiveDate,
    pub window_start: NaiveTime,
    pub window_end: NaiveTime,
    pub status: SlotStatus,
    pub expiry: NaiveDate,
    pub reservation: Option<Reservation>,
    pub created_at: DateTime<Utc>,
}

impl Slot {
    pub fn new(
        location_id: String,
        date: NaiveDate,
        window_start: NaiveTime,
        window_end: NaiveTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            location_id,
            date,
            window_start,
            window_end,
            status: SlotStatus::Available,
            expiry: date.checked_add_days(Days::new(EXPIRY_GRACE_DAYS)).unwrap_or(date),
            reservation: None,
            created_at: Utc::now(),
        }
    }
}
