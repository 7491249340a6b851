use crate::domain::models::slot::{Reservation, Slot};
use crate::domain::ports::{ClaimRequest, SlotRepository};
use crate::error::AppError;
use crate::infra::repositories::SlotRow;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;

pub struct PostgresSlotRepo {
    pool: PgPool,
}

impl PostgresSlotRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SlotRepository for PostgresSlotRepo {
    async fn insert_batch(&self, slots: &[Slot]) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let mut inserted = 0;
        for slot in slots {
            let result = sqlx::query(
                "INSERT INTO slots (id, location_id, date, window_start, window_end, status, expiry, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                 ON CONFLICT (location_id, date, window_start, window_end) DO NOTHING"
            )
                .bind(&slot.id).bind(&slot.location_id).bind(slot.date)
                .bind(slot.window_start).bind(slot.window_end)
                .bind(slot.status.as_str()).bind(slot.expiry).bind(slot.created_at)
                .execute(&mut *tx).await.map_err(AppError::Database)?;
            inserted += result.rows_affected();
        }
        tx.commit().await.map_err(AppError::Database)?;
        Ok(inserted)
    }

    async fn find_open(&self, location_id: &str, after: NaiveDate) -> Result<Vec<Slot>, AppError> {
        let rows = sqlx::query_as::<_, SlotRow>(
            "SELECT * FROM slots
             WHERE location_id = $1 AND status IN ('AVAILABLE', 'RESCHEDULING') AND date > $2
             ORDER BY date, window_start"
        )
            .bind(location_id).bind(after)
            .fetch_all(&self.pool).await.map_err(AppError::Database)?;
        rows.into_iter().map(Slot::try_from).collect()
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Slot>, AppError> {
        let row = sqlx::query_as::<_, SlotRow>("SELECT * FROM slots WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?;
        row.map(Slot::try_from).transpose()
    }

    async fn find_by_reservation(&self, reservation_id: &str) -> Result<Option<Slot>, AppError> {
        let row = sqlx::query_as::<_, SlotRow>("SELECT * FROM slots WHERE reservation_id = $1")
            .bind(reservation_id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?;
        row.map(Slot::try_from).transpose()
    }

    async fn find_by_event(&self, external_event_id: &str) -> Result<Option<Slot>, AppError> {
        let row = sqlx::query_as::<_, SlotRow>("SELECT * FROM slots WHERE external_event_id = $1")
            .bind(external_event_id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?;
        row.map(Slot::try_from).transpose()
    }

    async fn claim(&self, claim: &ClaimRequest, reservation: &Reservation) -> Result<Option<Slot>, AppError> {
        // Under READ COMMITTED a writer blocked on the selected row
        // re-evaluates the outer status predicate after the winner commits
        // and matches zero rows, so each slot is claimed at most once.
        let row = sqlx::query_as::<_, SlotRow>(
            "UPDATE slots
             SET status = 'BOOKED', reservation_id = $1, client_id = $2, start_time = $3, end_time = $4,
                 external_event_id = $5, external_event_link = $6, booked_at = $7
             WHERE id = (
                 SELECT id FROM slots
                 WHERE location_id = $8 AND date = $9
                   AND window_start <= $10 AND window_end >= $11
                   AND (status = 'AVAILABLE' OR (status = 'RESCHEDULING' AND id = $12))
                 ORDER BY window_start
                 LIMIT 1
             )
             AND (status = 'AVAILABLE' OR (status = 'RESCHEDULING' AND id = $12))
             RETURNING *"
        )
            .bind(&reservation.id).bind(&reservation.client_id)
            .bind(reservation.start_time).bind(reservation.end_time)
            .bind(&reservation.external_event_id).bind(&reservation.external_event_link)
            .bind(reservation.booked_at)
            .bind(&claim.location_id).bind(claim.date).bind(claim.start).bind(claim.end)
            .bind(&claim.reclaim_slot_id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?;
        row.map(Slot::try_from).transpose()
    }

    async fn begin_reschedule(&self, slot_id: &str, reservation_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE slots
             SET status = 'RESCHEDULING', reservation_id = NULL, client_id = NULL, start_time = NULL,
                 end_time = NULL, external_event_id = NULL, external_event_link = NULL, booked_at = NULL
             WHERE id = $1 AND reservation_id = $2 AND status = 'BOOKED'"
        )
            .bind(slot_id).bind(reservation_id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }

    async fn restore_booked(&self, slot_id: &str, reservation: &Reservation) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE slots
             SET status = 'BOOKED', reservation_id = $1, client_id = $2, start_time = $3, end_time = $4,
                 external_event_id = $5, external_event_link = $6, booked_at = $7
             WHERE id = $8 AND status = 'RESCHEDULING'"
        )
            .bind(&reservation.id).bind(&reservation.client_id)
            .bind(reservation.start_time).bind(reservation.end_time)
            .bind(&reservation.external_event_id).bind(&reservation.external_event_link)
            .bind(reservation.booked_at)
            .bind(slot_id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }

    async fn release(&self, slot_id: &str, reservation_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE slots
             SET status = 'AVAILABLE', reservation_id = NULL, client_id = NULL, start_time = NULL,
                 end_time = NULL, external_event_id = NULL, external_event_link = NULL, booked_at = NULL
             WHERE id = $1 AND reservation_id = $2 AND status = 'BOOKED'"
        )
            .bind(slot_id).bind(reservation_id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }

    async fn release_rescheduling(&self, slot_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE slots SET status = 'AVAILABLE' WHERE id = $1 AND status = 'RESCHEDULING'"
        )
            .bind(slot_id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }

    async fn purge_expired(&self, today: NaiveDate) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM slots WHERE status = 'AVAILABLE' AND expiry < $1")
            .bind(today)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }
}
