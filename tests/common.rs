use reservation_backend::{
    api::router::create_router,
    config::Config,
    domain::models::calendar::{BusyInterval, CreatedEvent, EventPatch, NewCalendarEvent},
    domain::ports::CalendarService,
    domain::services::availability::AvailabilityService,
    domain::services::reservation::ReservationService,
    error::AppError,
    infra::repositories::{
        sqlite_location_repo::SqliteLocationRepo,
        sqlite_slot_repo::SqliteSlotRepo,
    },
    state::AppState,
};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request},
    Router,
};
use chrono::{DateTime, Datelike, Days, NaiveDate, Utc, Weekday};
use serde_json::{json, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct FakeEvent {
    pub summary: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub color_id: Option<String>,
}

/// In-process calendar oracle. Created events count as busy time, exactly
/// like a real calendar reporting its own appointments; failures are
/// injectable per operation.
#[derive(Default)]
pub struct FakeCalendarService {
    pub events: Mutex<HashMap<String, FakeEvent>>,
    pub extra_busy: Mutex<Vec<BusyInterval>>,
    pub deleted: Mutex<Vec<String>>,
    pub fail_query: AtomicBool,
    pub fail_create: AtomicBool,
    pub fail_update: AtomicBool,
    pub fail_delete: AtomicBool,
}

#[allow(dead_code)]
impl FakeCalendarService {
    pub fn event(&self, id: &str) -> Option<FakeEvent> {
        self.events.lock().unwrap().get(id).cloned()
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn push_busy(&self, start: DateTime<Utc>, end: DateTime<Utc>) {
        self.extra_busy.lock().unwrap().push(BusyInterval { start, end });
    }

    pub fn deleted_ids(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl CalendarService for FakeCalendarService {
    async fn query_busy(
        &self,
        _calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<BusyInterval>, AppError> {
        if self.fail_query.load(Ordering::SeqCst) {
            return Err(AppError::ExternalService("calendar is down".to_string()));
        }
        let mut busy: Vec<BusyInterval> = self.extra_busy.lock().unwrap().clone();
        busy.extend(
            self.events
                .lock()
                .unwrap()
                .values()
                .map(|e| BusyInterval { start: e.start, end: e.end }),
        );
        busy.retain(|b| b.start < time_max && b.end > time_min);
        Ok(busy)
    }

    async fn create_event(
        &self,
        _calendar_id: &str,
        event: &NewCalendarEvent,
    ) -> Result<CreatedEvent, AppError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(AppError::ExternalService("calendar is down".to_string()));
        }
        let id = Uuid::new_v4().to_string();
        self.events.lock().unwrap().insert(
            id.clone(),
            FakeEvent {
                summary: event.summary.clone(),
                description: event.description.clone(),
                start: event.start,
                end: event.end,
                color_id: event.color_id.clone(),
            },
        );
        Ok(CreatedEvent {
            id: id.clone(),
            html_link: Some(format!("https://calendar.local/event/{}", id)),
        })
    }

    async fn update_event(
        &self,
        _calendar_id: &str,
        event_id: &str,
        patch: &EventPatch,
    ) -> Result<(), AppError> {
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(AppError::ExternalService("calendar is down".to_string()));
        }
        let mut events = self.events.lock().unwrap();
        let event = events
            .get_mut(event_id)
            .ok_or_else(|| AppError::ExternalService(format!("No such event: {}", event_id)))?;
        if let Some(start) = patch.start {
            event.start = start;
        }
        if let Some(end) = patch.end {
            event.end = end;
        }
        if let Some(ref summary) = patch.summary {
            event.summary = summary.clone();
        }
        if let Some(ref color_id) = patch.color_id {
            event.color_id = Some(color_id.clone());
        }
        Ok(())
    }

    async fn delete_event(&self, _calendar_id: &str, event_id: &str) -> Result<(), AppError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(AppError::ExternalService("calendar is down".to_string()));
        }
        self.events.lock().unwrap().remove(event_id);
        self.deleted.lock().unwrap().push(event_id.to_string());
        Ok(())
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub calendar: Arc<FakeCalendarService>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            calendar_api_url: "http://localhost".to_string(),
            calendar_api_token: "token".to_string(),
            slot_horizon_weeks: 8,
        };

        let calendar = Arc::new(FakeCalendarService::default());
        let location_repo = Arc::new(SqliteLocationRepo::new(pool.clone()));
        let slot_repo = Arc::new(SqliteSlotRepo::new(pool.clone()));

        let state = Arc::new(AppState {
            config,
            location_repo: location_repo.clone(),
            slot_repo: slot_repo.clone(),
            calendar: calendar.clone(),
            availability_service: Arc::new(AvailabilityService::new(
                location_repo.clone(),
                slot_repo.clone(),
                calendar.clone(),
            )),
            reservation_service: Arc::new(ReservationService::new(
                location_repo,
                slot_repo,
                calendar.clone(),
            )),
        });

        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
            calendar,
        }
    }

    pub async fn get(&self, uri: &str) -> axum::response::Response {
        self.router
            .clone()
            .oneshot(Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> axum::response::Response {
        self.router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    pub async fn put_json(&self, uri: &str, body: Value) -> axum::response::Response {
        self.router
            .clone()
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    pub async fn create_location(&self, name: &str) -> String {
        let res = self
            .post_json(
                "/api/v1/locations",
                json!({ "name": name, "timezone": "UTC", "calendar_id": "primary" }),
            )
            .await;
        assert!(res.status().is_success(), "create_location failed: {}", res.status());
        parse_body(res).await["id"].as_str().unwrap().to_string()
    }

    /// Publishes a Monday 09:00-12:00 template. Horizon 2 or more makes the
    /// strictly-future "next Monday" bookable no matter what weekday the
    /// suite runs on.
    pub async fn publish_monday_schedule(&self, location_id: &str, horizon_weeks: u32) -> Value {
        let res = self
            .put_json(
                &format!("/api/v1/locations/{}/schedule", location_id),
                json!({
                    "schedule": { "monday": [{ "start": "09:00", "end": "12:00" }] },
                    "horizon_weeks": horizon_weeks
                }),
            )
            .await;
        assert!(res.status().is_success(), "publish_schedule failed: {}", res.status());
        parse_body(res).await
    }

    pub async fn slot_count(&self) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM slots")
            .fetch_one(&self.pool)
            .await
            .unwrap()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}

#[allow(dead_code)]
pub async fn parse_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// First Monday strictly after today.
#[allow(dead_code)]
pub fn next_monday() -> NaiveDate {
    let mut date = Utc::now().date_naive() + Days::new(1);
    while date.weekday() != Weekday::Mon {
        date = date + Days::new(1);
    }
    date
}
