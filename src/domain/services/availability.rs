use std::sync::Arc;

use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;

use crate::domain::models::calendar::AvailabilityWindow;
use crate::domain::models::slot::{Slot, SlotStatus};
use crate::domain::ports::{CalendarService, LocationRepository, SlotRepository};
use crate::error::AppError;

/// Bookable start times are aligned to this step within an open window.
pub const SLOT_GRANULARITY_MIN: u32 = 30;
/// Busy periods are widened by this margin on both sides before comparison.
pub const BUSY_BUFFER_MIN: i64 = 30;
/// Covers the 8-week slot horizon plus the expiry grace period.
pub const BUSY_HORIZON_WEEKS: i64 = 11;
pub const MAX_DURATION_MIN: i64 = 480;

/// Subdivides open slot windows into duration-sized candidates and drops
/// every candidate overlapping a buffered busy interval. Busy intervals are
/// location-local naive datetimes so periods spanning midnight compare
/// correctly. Overlap is `a.start < b.end && a.end > b.start`: touching
/// boundaries do not conflict.
pub fn resolve_windows(
    slots: &[Slot],
    busy_local: &[(NaiveDateTime, NaiveDateTime)],
    duration_min: u32,
    now_local: NaiveDateTime,
) -> Vec<AvailabilityWindow> {
    let today = now_local.date();
    let buffer = Duration::minutes(BUSY_BUFFER_MIN);
    let buffered: Vec<(NaiveDateTime, NaiveDateTime)> = busy_local
        .iter()
        .map(|(start, end)| (*start - buffer, *end + buffer))
        .collect();

    let mut windows = Vec::new();

    for slot in slots {
        if !matches!(slot.status, SlotStatus::Available | SlotStatus::Rescheduling) {
            continue;
        }
        if slot.date <= today {
            continue;
        }

        let win_start = minutes_of(slot.window_start);
        let win_end = minutes_of(slot.window_end);

        let mut cursor = win_start;
        while cursor + duration_min <= win_end {
            if let Some(start) = time_of(cursor)
                && let Some(end) = time_of(cursor + duration_min)
            {
                let start_dt = slot.date.and_time(start);
                let end_dt = slot.date.and_time(end);

                let blocked = buffered
                    .iter()
                    .any(|(busy_start, busy_end)| start_dt < *busy_end && end_dt > *busy_start);

                if !blocked {
                    windows.push(AvailabilityWindow {
                        date: slot.date,
                        start,
                        end,
                    });
                }
            }
            cursor += SLOT_GRANULARITY_MIN;
        }
    }

    windows.sort();
    windows.dedup();
    windows
}

fn minutes_of(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

fn time_of(minutes: u32) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)
}

pub struct AvailabilityService {
    location_repo: Arc<dyn LocationRepository>,
    slot_repo: Arc<dyn SlotRepository>,
    calendar: Arc<dyn CalendarService>,
}

impl AvailabilityService {
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

    /// Lists every bookable window for the location, strictly in the
    /// future, reconciled against the live external calendar. A calendar
    /// failure fails the whole query: availability is never reported
    /// without having checked real busy state.
    pub async fn list_availability(
        &self,
        location_id: &str,
        duration_min: i64,
        exclude_event_id: Option<&str>,
    ) -> Result<Vec<AvailabilityWindow>, AppError> {
        if duration_min <= 0 || duration_min > MAX_DURATION_MIN {
            return Err(AppError::Validation(format!(
                "Duration must be between 1 and {} minutes",
                MAX_DURATION_MIN
            )));
        }

        let location = self
            .location_repo
            .find_by_id(location_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Location not found".to_string()))?;

        let tz: Tz = location.timezone.parse().unwrap_or(chrono_tz::UTC);
        let now_utc = Utc::now();
        let now_local = now_utc.with_timezone(&tz).naive_local();

        let slots = self.slot_repo.find_open(location_id, now_local.date()).await?;

        let busy = self
            .calendar
            .query_busy(
                &location.calendar_id,
                now_utc,
                now_utc + Duration::weeks(BUSY_HORIZON_WEEKS),
            )
            .await?;

        // A reservation must never be blocked by its own calendar event.
        // The oracle reports bare intervals, so the caller's event is
        // recovered by exact time match against the reservation that owns
        // the excluded id.
        let own_interval = match exclude_event_id {
            Some(event_id) => self
                .slot_repo
                .find_by_event(event_id)
                .await?
                .and_then(|slot| {
                    slot.reservation.map(|r| {
                        (
                            slot.date.and_time(r.start_time),
                            slot.date.and_time(r.end_time),
                        )
                    })
                }),
            None => None,
        };

        let busy_local: Vec<(NaiveDateTime, NaiveDateTime)> = busy
            .iter()
            .map(|b| {
                (
                    b.start.with_timezone(&tz).naive_local(),
                    b.end.with_timezone(&tz).naive_local(),
                )
            })
            .filter(|interval| own_interval.as_ref().is_none_or(|own| interval != own))
            .collect();

        Ok(resolve_windows(
            &slots,
            &busy_local,
            duration_min as u32,
            now_local,
        ))
    }
}
