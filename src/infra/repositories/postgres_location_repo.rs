use crate::domain::models::location::Location;
use crate::domain::ports::LocationRepository;
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::PgPool;

pub struct PostgresLocationRepo {
    pool: PgPool,
}

impl PostgresLocationRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LocationRepository for PostgresLocationRepo {
    async fn create(&self, location: &Location) -> Result<Location, AppError> {
        sqlx::query_as::<_, Location>(
            "INSERT INTO locations (id, name, timezone, calendar_id, schedule_json, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *"
        )
            .bind(&location.id).bind(&location.name).bind(&location.timezone)
            .bind(&location.calendar_id).bind(&location.schedule_json).bind(location.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Location>, AppError> {
        sqlx::query_as::<_, Location>("SELECT * FROM locations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list(&self) -> Result<Vec<Location>, AppError> {
        sqlx::query_as::<_, Location>("SELECT * FROM locations ORDER BY name")
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn update_schedule(&self, id: &str, schedule_json: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE locations SET schedule_json = $1 WHERE id = $2")
            .bind(schedule_json).bind(id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Location not found".into()));
        }
        Ok(())
    }
}
