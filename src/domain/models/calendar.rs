use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Time already committed on the external calendar. Fetched per query,
/// never persisted.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BusyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCalendarEvent {
    pub summary: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub color_id: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CreatedEvent {
    pub id: String,
    pub html_link: Option<String>,
}

/// Partial update of an existing calendar event. `None` fields are left
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub summary: Option<String>,
    pub color_id: Option<String>,
}

/// A duration-sized bookable period, derived on every availability query.
/// Ordering is chronological by `(date, start)`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct AvailabilityWindow {
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
}
