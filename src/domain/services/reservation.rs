use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::{error, info, warn};

use crate::domain::models::calendar::{AvailabilityWindow, EventPatch, NewCalendarEvent};
use crate::domain::models::location::Location;
use crate::domain::models::slot::{Reservation, Slot, SlotStatus};
use crate::domain::ports::{CalendarService, ClaimRequest, LocationRepository, SlotRepository};
use crate::domain::services::availability::MAX_DURATION_MIN;
use crate::error::AppError;

const PENDING_PREFIX: &str = "[Pending confirmation]";
// Google Calendar palette: 5 = banana, 10 = basil.
const PENDING_COLOR_ID: &str = "5";
const CONFIRMED_COLOR_ID: &str = "10";

pub fn build_window(
    date: NaiveDate,
    start: NaiveTime,
    duration_min: i64,
) -> Result<AvailabilityWindow, AppError> {
    if duration_min <= 0 || duration_min > MAX_DURATION_MIN {
        return Err(AppError::Validation(format!(
            "Duration must be between 1 and {} minutes",
            MAX_DURATION_MIN
        )));
    }
    let (end, wrapped) = start.overflowing_add_signed(Duration::minutes(duration_min));
    if wrapped != 0 {
        return Err(AppError::Validation(
            "Appointment cannot cross midnight".to_string(),
        ));
    }
    Ok(AvailabilityWindow { date, start, end })
}

/// Coordinates the booking, cancellation and reschedule sagas. Requests can
/// race arbitrarily: the only coordination point is the store's conditional
/// claim, every external write has a named compensation, and a compensation
/// failure is logged for reconciliation instead of surfacing to the client.
pub struct ReservationService {
    location_repo: Arc<dyn LocationRepository>,
    slot_repo: Arc<dyn SlotRepository>,
    calendar: Arc<dyn CalendarService>,
}

impl ReservationService {
    pub fn new(
        location_repo: Arc<dyn LocationRepository>,
        slot_repo: Arc<dyn SlotRepository>,
        calendar: Arc<dyn CalendarService>,
    ) -> Self {
        Self {
            location_repo,
            slot_repo,
            calendar,
        }
    }

    /// Books `window` for the client. The calendar event is created first,
    /// marked pending: a lost claim then only leaves a transient event we
    /// retract, never a slot marked taken that nobody was told about.
    pub async fn book(
        &self,
        location_id: &str,
        client_id: &str,
        window: AvailabilityWindow,
    ) -> Result<Slot, AppError> {
        if client_id.is_empty() {
            return Err(AppError::Validation("client_id must not be empty".to_string()));
        }

        let location = self
            .location_repo
            .find_by_id(location_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Location not found".to_string()))?;
        let tz = timezone_of(&location);
        ensure_future(&window, &tz)?;

        let start_utc = to_utc(&tz, window.date, window.start)?;
        let end_utc = to_utc(&tz, window.date, window.end)?;

        let created = self
            .calendar
            .create_event(
                &location.calendar_id,
                &NewCalendarEvent {
                    summary: format!("{} Appointment at {}", PENDING_PREFIX, location.name),
                    description: format!("Client: {}", client_id),
                    start: start_utc,
                    end: end_utc,
                    color_id: Some(PENDING_COLOR_ID.to_string()),
                },
            )
            .await?;

        let reservation = Reservation::new(
            client_id.to_string(),
            window.start,
            window.end,
            created.id.clone(),
            created.html_link.clone(),
        );
        let claim = ClaimRequest {
            location_id: location_id.to_string(),
            date: window.date,
            start: window.start,
            end: window.end,
            reclaim_slot_id: None,
        };

        let claimed = match self.slot_repo.claim(&claim, &reservation).await {
            Ok(claimed) => claimed,
            Err(e) => {
                self.retract_event(&location.calendar_id, &created.id).await;
                return Err(e);
            }
        };

        match claimed {
            Some(slot) => {
                self.confirm_event(&location.calendar_id, &created.id, &location.name)
                    .await;
                info!(
                    "Reservation {} confirmed: slot {} on {} {}-{}",
                    reservation.id, slot.id, window.date, window.start, window.end
                );
                Ok(slot)
            }
            None => {
                warn!(
                    "Claim lost for {} {}-{} at {}; retracting event {}",
                    window.date, window.start, window.end, location_id, created.id
                );
                self.retract_event(&location.calendar_id, &created.id).await;
                Err(AppError::NoAvailability(
                    "Selected window is no longer available".to_string(),
                ))
            }
        }
    }

    /// Releases the reservation's slot and retracts its calendar event.
    /// Safe to retry: a second call finds nothing and reports not-found.
    pub async fn cancel(&self, client_id: &str, reservation_id: &str) -> Result<(), AppError> {
        let slot = self
            .slot_repo
            .find_by_reservation(reservation_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Reservation not found".to_string()))?;
        let reservation = slot.reservation.clone().ok_or(AppError::Internal)?;

        if reservation.client_id != client_id {
            return Err(AppError::Forbidden(
                "Reservation belongs to a different client".to_string(),
            ));
        }
        if slot.status != SlotStatus::Booked {
            return Err(AppError::NotFound(
                "Reservation is being rescheduled; retry shortly".to_string(),
            ));
        }

        let location = self
            .location_repo
            .find_by_id(&slot.location_id)
            .await?
            .ok_or(AppError::Internal)?;

        // Best effort: a calendar outage must not trap the client in a
        // booking they asked to drop.
        if let Err(e) = self
            .calendar
            .delete_event(&location.calendar_id, &reservation.external_event_id)
            .await
        {
            warn!(
                "Could not delete calendar event {} during cancellation: {}",
                reservation.external_event_id, e
            );
        }

        let released = self.slot_repo.release(&slot.id, reservation_id).await?;
        if released == 0 {
            return Err(AppError::NotFound("Reservation not found".to_string()));
        }

        info!("Reservation {} cancelled, slot {} released", reservation_id, slot.id);
        Ok(())
    }

    /// Two-phase move with rollback. The old slot is parked in
    /// `RESCHEDULING` for the whole transition; claims require `AVAILABLE`,
    /// so nothing can take the old slot out from under the rollback path
    /// and a failed move always restores the original reservation.
    pub async fn reschedule(
        &self,
        client_id: &str,
        reservation_id: &str,
        new_window: AvailabilityWindow,
        new_location_id: Option<&str>,
    ) -> Result<Slot, AppError> {
        let old_slot = self
            .slot_repo
            .find_by_reservation(reservation_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Reservation not found".to_string()))?;
        let reservation = old_slot.reservation.clone().ok_or(AppError::Internal)?;

        if reservation.client_id != client_id {
            return Err(AppError::Forbidden(
                "Reservation belongs to a different client".to_string(),
            ));
        }
        if old_slot.status != SlotStatus::Booked {
            return Err(AppError::NoAvailability(
                "Reservation is already being modified".to_string(),
            ));
        }

        let old_location = self
            .location_repo
            .find_by_id(&old_slot.location_id)
            .await?
            .ok_or(AppError::Internal)?;
        let target_location = match new_location_id {
            Some(id) if id != old_slot.location_id => self
                .location_repo
                .find_by_id(id)
                .await?
                .ok_or_else(|| AppError::NotFound("Location not found".to_string()))?,
            _ => old_location.clone(),
        };

        let tz = timezone_of(&target_location);
        ensure_future(&new_window, &tz)?;
        let new_start_utc = to_utc(&tz, new_window.date, new_window.start)?;
        let new_end_utc = to_utc(&tz, new_window.date, new_window.end)?;

        let old_tz = timezone_of(&old_location);
        let old_start_utc = to_utc(&old_tz, old_slot.date, reservation.start_time)?;
        let old_end_utc = to_utc(&old_tz, old_slot.date, reservation.end_time)?;

        // Phase one: park the old slot. Zero matched rows means another
        // request got here first (cancel or concurrent reschedule).
        let parked = self
            .slot_repo
            .begin_reschedule(&old_slot.id, reservation_id)
            .await?;
        if parked == 0 {
            return Err(AppError::NoAvailability(
                "Reservation is already being modified".to_string(),
            ));
        }

        // The event keeps living on the calendar it was created on; only
        // its time moves. Best effort, reverted on rollback.
        if let Err(e) = self
            .calendar
            .update_event(
                &old_location.calendar_id,
                &reservation.external_event_id,
                &EventPatch {
                    start: Some(new_start_utc),
                    end: Some(new_end_utc),
                    ..Default::default()
                },
            )
            .await
        {
            warn!(
                "Could not move calendar event {}; continuing reschedule: {}",
                reservation.external_event_id, e
            );
        }

        let moved = Reservation {
            start_time: new_window.start,
            end_time: new_window.end,
            ..reservation.clone()
        };
        let claim = ClaimRequest {
            location_id: target_location.id.clone(),
            date: new_window.date,
            start: new_window.start,
            end: new_window.end,
            reclaim_slot_id: Some(old_slot.id.clone()),
        };

        let claimed = match self.slot_repo.claim(&claim, &moved).await {
            Ok(claimed) => claimed,
            Err(e) => {
                self.rollback(&old_slot, &reservation, &old_location.calendar_id, old_start_utc, old_end_utc)
                    .await;
                return Err(e);
            }
        };

        match claimed {
            Some(new_slot) => {
                if new_slot.id != old_slot.id {
                    match self.slot_repo.release_rescheduling(&old_slot.id).await {
                        Ok(0) => error!(
                            "Compensation anomaly: slot {} was not RESCHEDULING after move",
                            old_slot.id
                        ),
                        Ok(_) => {}
                        Err(e) => error!(
                            "Compensation failure: could not release vacated slot {}: {}",
                            old_slot.id, e
                        ),
                    }
                }
                info!(
                    "Reservation {} moved from slot {} to slot {}",
                    reservation_id, old_slot.id, new_slot.id
                );
                Ok(new_slot)
            }
            None => {
                self.rollback(&old_slot, &reservation, &old_location.calendar_id, old_start_utc, old_end_utc)
                    .await;
                Err(AppError::NoAvailability(
                    "New window is no longer available; the original reservation was kept"
                        .to_string(),
                ))
            }
        }
    }

    /// Compensation for a failed booking claim: drop the pending event.
    async fn retract_event(&self, calendar_id: &str, event_id: &str) {
        if let Err(e) = self.calendar.delete_event(calendar_id, event_id).await {
            error!(
                "Compensation failure: could not delete calendar event {}: {}",
                event_id, e
            );
        }
    }

    /// Post-claim marking of the event as confirmed. Purely cosmetic for
    /// the calendar owner, so failure only warns.
    async fn confirm_event(&self, calendar_id: &str, event_id: &str, location_name: &str) {
        let patch = EventPatch {
            summary: Some(format!("Appointment at {}", location_name)),
            color_id: Some(CONFIRMED_COLOR_ID.to_string()),
            ..Default::default()
        };
        if let Err(e) = self.calendar.update_event(calendar_id, event_id, &patch).await {
            warn!("Could not confirm calendar event {}: {}", event_id, e);
        }
    }

    /// Compensation for a failed reschedule claim: revert the event time
    /// and flip the parked slot back to `BOOKED` with its original
    /// reservation. The parked slot is invisible to claims, so the restore
    /// cannot lose a race; zero matched rows is an anomaly worth a page.
    async fn rollback(
        &self,
        old_slot: &Slot,
        reservation: &Reservation,
        calendar_id: &str,
        old_start: DateTime<Utc>,
        old_end: DateTime<Utc>,
    ) {
        if let Err(e) = self
            .calendar
            .update_event(
                calendar_id,
                &reservation.external_event_id,
                &EventPatch {
                    start: Some(old_start),
                    end: Some(old_end),
                    ..Default::default()
                },
            )
            .await
        {
            error!(
                "Compensation failure: could not revert calendar event {}: {}",
                reservation.external_event_id, e
            );
        }

        match self.slot_repo.restore_booked(&old_slot.id, reservation).await {
            Ok(0) => error!(
                "Compensation failure: slot {} was not RESCHEDULING during rollback",
                old_slot.id
            ),
            Ok(_) => {}
            Err(e) => error!(
                "Compensation failure: could not restore slot {}: {}",
                old_slot.id, e
            ),
        }
    }
}

fn timezone_of(location: &Location) -> Tz {
    location.timezone.parse().unwrap_or(chrono_tz::UTC)
}

fn ensure_future(window: &AvailabilityWindow, tz: &Tz) -> Result<(), AppError> {
    if window.start >= window.end {
        return Err(AppError::Validation(
            "Window start must precede its end".to_string(),
        ));
    }
    let today = Utc::now().with_timezone(tz).date_naive();
    if window.date <= today {
        return Err(AppError::Validation("Date must be in the future".to_string()));
    }
    Ok(())
}

fn to_utc(tz: &Tz, date: NaiveDate, time: NaiveTime) -> Result<DateTime<Utc>, AppError> {
    tz.from_local_datetime(&date.and_time(time))
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| {
            AppError::Validation("Invalid local time (ambiguous or skipped due to DST)".to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn build_window_derives_end_from_duration() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 9).unwrap();
        let window = build_window(date, "10:00:00".parse().unwrap(), 60).unwrap();
        assert_eq!(window.end.to_string(), "11:00:00");
    }

    #[test]
    fn build_window_rejects_bad_durations() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 9).unwrap();
        let start: NaiveTime = "10:00:00".parse().unwrap();
        assert!(matches!(build_window(date, start, 0), Err(AppError::Validation(_))));
        assert!(matches!(build_window(date, start, -30), Err(AppError::Validation(_))));
        assert!(matches!(build_window(date, start, 481), Err(AppError::Validation(_))));
    }

    #[test]
    fn build_window_rejects_midnight_crossing() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 9).unwrap();
        let start: NaiveTime = "23:30:00".parse().unwrap();
        assert!(matches!(build_window(date, start, 60), Err(AppError::Validation(_))));
    }
}
