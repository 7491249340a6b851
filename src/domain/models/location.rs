use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub timezone: String,
    pub calendar_id: String,
    pub schedule_json: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Location {
    pub fn new(name: String, timezone: String, calendar_id: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            timezone,
            calendar_id,
            schedule_json: None,
            created_at: Utc::now(),
        }
    }
}
