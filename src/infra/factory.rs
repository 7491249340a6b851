use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::info;
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::domain::ports::CalendarService;
use crate::domain::services::availability::AvailabilityService;
use crate::domain::services::reservation::ReservationService;
use crate::infra::calendar::google_calendar::GoogleCalendarService;
use crate::infra::repositories::{
    postgres_location_repo::PostgresLocationRepo, postgres_slot_repo::PostgresSlotRepo,
    sqlite_location_repo::SqliteLocationRepo, sqlite_slot_repo::SqliteSlotRepo,
};
use crate::state::AppState;

pub async fn bootstrap_state(config: &Config) -> AppState {
    let database_url = &config.database_url;
    let calendar: Arc<dyn CalendarService> = Arc::new(GoogleCalendarService::new(
        config.calendar_api_url.clone(),
        config.calendar_api_token.clone(),
    ));

    if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
        opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .expect("Failed to connect to Postgres");

        run_postgres_migrations(&pool).await;

        let location_repo = Arc::new(PostgresLocationRepo::new(pool.clone()));
        let slot_repo = Arc::new(PostgresSlotRepo::new(pool.clone()));

        AppState {
            config: config.clone(),
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
                calendar,
            )),
        }
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .expect("Invalid SQLite connection string")
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .expect("Failed to connect to SQLite");

        run_sqlite_migrations(&pool).await;

        let location_repo = Arc::new(SqliteLocationRepo::new(pool.clone()));
        let slot_repo = Arc::new(SqliteSlotRepo::new(pool.clone()));

        AppState {
            config: config.clone(),
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
                calendar,
            )),
        }
    }
}

async fn run_postgres_migrations(pool: &PgPool) {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .expect("Failed to run Postgres migrations");
}

async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
