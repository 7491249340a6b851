use chrono::Weekday;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ScheduleWindow {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct WeeklySchedule {
    pub monday: Option<Vec<ScheduleWindow>>,
    pub tuesday: Option<Vec<ScheduleWindow>>,
    pub wednesday: Option<Vec<ScheduleWindow>>,
    pub thursday: Option<Vec<ScheduleWindow>>,
    pub friday: Option<Vec<ScheduleWindow>>,
    pub saturday: Option<Vec<ScheduleWindow>>,
    pub sunday: Option<Vec<ScheduleWindow>>,
}

impl WeeklySchedule {
    pub fn windows_for(&self, weekday: Weekday) -> Option<&Vec<ScheduleWindow>> {
        match weekday {
            Weekday::Mon => self.monday.as_ref(),
            Weekday::Tue => self.tuesday.as_ref(),
            Weekday::Wed => self.wednesday.as_ref(),
            Weekday::Thu => self.thursday.as_ref(),
            Weekday::Fri => self.friday.as_ref(),
            Weekday::Sat => self.saturday.as_ref(),
            Weekday::Sun => self.sunday.as_ref(),
        }
    }
}
