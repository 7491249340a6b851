use crate::domain::models::location::Location;
use crate::domain::ports::LocationRepository;
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteLocationRepo {
    pool: SqlitePool,
}

impl SqliteLocationRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LocationRepository for SqliteLocationRepo {
    async fn create(&self, location: &Location) -> Result<Location, AppError> {
        sqlx::query_as::<_, Location>(
            "INSERT INTO locations (id, name, timezone, calendar_id, schedule_json, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&location.id).bind(&location.name).bind(&location.timezone)
            .bind(&location.calendar_id).bind(&location.schedule_json).bind(location.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Location>, AppError> {
        sqlx::query_as::<_, Location>("SELECT * FROM locations WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }

    async fn list(&self) -> Result<Vec<Location>, AppError> {
        sqlx::query_as::<_, Location>("SELECT * FROM locations ORDER BY name")
            .fetch_all(&self.pool).await.map_err(AppError::Database)
    }

    async fn update_schedule(&self, id: &str, schedule_json: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE locations SET schedule_json = ? WHERE id = ?")
            .bind(schedule_json).bind(id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Location not found".into()));
        }
        Ok(())
    }
}
