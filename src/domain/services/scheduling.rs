use chrono::{Datelike, Days, NaiveDateTime, NaiveTime, Weekday};

use crate::domain::models::schedule::WeeklySchedule;
use crate::domain::models::slot::Slot;
use crate::error::AppError;

pub const DEFAULT_HORIZON_WEEKS: u32 = 8;

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Expands a weekly work-day template into dated slots for the next
/// `horizon_weeks` occurrences of each weekday. Today counts as the first
/// occurrence only while the window has not yet elapsed. Duplicate
/// suppression happens at insert time via the slots' natural key, so running
/// this twice over the same template is harmless.
pub fn expand_schedule(
    location_id: &str,
    schedule: &WeeklySchedule,
    horizon_weeks: u32,
    now_local: NaiveDateTime,
) -> Result<Vec<Slot>, AppError> {
    let today = now_local.date();
    let mut slots = Vec::new();

    for weekday in WEEKDAYS {
        let Some(windows) = schedule.windows_for(weekday) else {
            continue;
        };

        for window in windows {
            let start = parse_hhmm(&window.start)?;
            let end = parse_hhmm(&window.end)?;
            if start >= end {
                return Err(AppError::Validation(format!(
                    "Window {}-{} is empty or inverted",
                    window.start, window.end
                )));
            }

            let offset = (weekday.num_days_from_monday() + 7
                - today.weekday().num_days_from_monday())
                % 7;
            let mut date = today + Days::new(offset as u64);
            if offset == 0 && end <= now_local.time() {
                date = date + Days::new(7);
            }

            for _ in 0..horizon_weeks {
                slots.push(Slot::new(location_id.to_string(), date, start, end));
                date = date + Days::new(7);
            }
        }
    }

    Ok(slots)
}

pub fn parse_hhmm(value: &str) -> Result<NaiveTime, AppError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| AppError::Validation(format!("Invalid time format (HH:MM): {}", value)))
}
