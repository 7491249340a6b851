use std::env;

use crate::domain::services::scheduling::DEFAULT_HORIZON_WEEKS;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub calendar_api_url: String,
    pub calendar_api_token: String,
    pub slot_horizon_weeks: u32,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            calendar_api_url: env::var("CALENDAR_API_URL").unwrap_or_else(|_| "https://www.googleapis.com/calendar/v3".to_string()),
            calendar_api_token: env::var("CALENDAR_API_TOKEN").unwrap_or_else(|_| "test-token-1".to_string()),
            slot_horizon_weeks: env::var("SLOT_HORIZON_WEEKS").unwrap_or_else(|_| DEFAULT_HORIZON_WEEKS.to_string()).parse().expect("SLOT_HORIZON_WEEKS must be a number"),
        }
    }
}
