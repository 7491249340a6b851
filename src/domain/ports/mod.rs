use crate::domain::models::{
    calendar::{BusyInterval, CreatedEvent, EventPatch, NewCalendarEvent},
    location::Location,
    slot::{Reservation, Slot},
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

#[async_trait]
pub trait LocationRepository: Send + Sync {
    async fn create(&self, location: &Location) -> Result<Location, AppError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Location>, AppError>;
    async fn list(&self) -> Result<Vec<Location>, AppError>;
    async fn update_schedule(&self, id: &str, schedule_json: &str) -> Result<(), AppError>;
}

/// Predicate for the conditional claim update. The claimed slot must contain
/// `[start, end]` within its window and be `AVAILABLE`; `reclaim_slot_id`
/// additionally admits that one slot while it is parked in `RESCHEDULING`,
/// which is what lets a reschedule move a reservation inside its own slot.
#[derive(Debug, Clone)]
pub struct ClaimRequest {
    pub location_id: String,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub reclaim_slot_id: Option<String>,
}

#[async_trait]
pub trait SlotRepository: Send + Sync {
    /// Inserts a batch inside one transaction. Rows colliding on the natural
    /// key `(location_id, date, window_start, window_end)` are skipped;
    /// any other failure aborts the whole batch. Returns rows inserted.
    async fn insert_batch(&self, slots: &[Slot]) -> Result<u64, AppError>;

    /// Slots still open for claiming (`AVAILABLE` or `RESCHEDULING`) with a
    /// date strictly after `after`, ordered chronologically.
    async fn find_open(&self, location_id: &str, after: NaiveDate) -> Result<Vec<Slot>, AppError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Slot>, AppError>;
    async fn find_by_reservation(&self, reservation_id: &str) -> Result<Option<Slot>, AppError>;
    async fn find_by_event(&self, external_event_id: &str) -> Result<Option<Slot>, AppError>;

    /// The single atomic compare-and-swap this engine coordinates on: one
    /// conditional update that finds a matching open slot and writes the
    /// reservation in the same statement. Returns the claimed slot, or
    /// `None` when zero rows matched (lost the race, or the window no
    /// longer fits any open slot).
    async fn claim(&self, claim: &ClaimRequest, reservation: &Reservation) -> Result<Option<Slot>, AppError>;

    /// `BOOKED -> RESCHEDULING` with the reservation columns cleared (at
    /// most one row ever holds a reservation id). Returns matched count;
    /// zero means the reservation is gone or already moving.
    async fn begin_reschedule(&self, slot_id: &str, reservation_id: &str) -> Result<u64, AppError>;

    /// Rollback flip `RESCHEDULING -> BOOKED`, rebinding the original
    /// reservation. The parked slot is invisible to claims, so a zero
    /// match here signals a compensation anomaly.
    async fn restore_booked(&self, slot_id: &str, reservation: &Reservation) -> Result<u64, AppError>;

    /// Cancellation release: `BOOKED -> AVAILABLE` with all reservation
    /// fields cleared, conditional on the reservation id still matching.
    async fn release(&self, slot_id: &str, reservation_id: &str) -> Result<u64, AppError>;

    /// Post-reschedule release of the vacated slot: `RESCHEDULING ->
    /// AVAILABLE` with reservation fields cleared.
    async fn release_rescheduling(&self, slot_id: &str) -> Result<u64, AppError>;

    /// Dead-slot reclamation: deletes slots still `AVAILABLE` whose expiry
    /// date has passed. Returns rows deleted.
    async fn purge_expired(&self, today: NaiveDate) -> Result<u64, AppError>;
}

/// The external calendar oracle. Injected so the concurrency and
/// compensation paths can run against a fake.
#[async_trait]
pub trait CalendarService: Send + Sync {
    async fn query_busy(
        &self,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<BusyInterval>, AppError>;

    async fn create_event(
        &self,
        calendar_id: &str,
        event: &NewCalendarEvent,
    ) -> Result<CreatedEvent, AppError>;

    async fn update_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        patch: &EventPatch,
    ) -> Result<(), AppError>;

    /// Idempotent: deleting an already-deleted event id is not an error.
    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<(), AppError>;
}
