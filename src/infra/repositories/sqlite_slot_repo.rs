use crate::domain::models::slot::{Reservation, Slot};
use crate::domain::ports::{ClaimRequest, SlotRepository};
use crate::error::AppError;
use crate::infra::repositories::SlotRow;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::SqlitePool;

pub struct SqliteSlotRepo {
    pool: SqlitePool,
}

impl SqliteSlotRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SlotRepository for SqliteSlotRepo {
    async fn insert_batch(&self, slots: &[Slot]) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let mut inserted = 0;
        for slot in slots {
            let result = sqlx::query(
                "INSERT INTO slots (id, location_id, date, window_start, window_end, status, expiry, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)
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
             WHERE location_id = ? AND status IN ('AVAILABLE', 'RESCHEDULING') AND date > ?
             ORDER BY date, window_start"
        )
            .bind(location_id).bind(after)
            .fetch_all(&self.pool).await.map_err(AppError::Database)?;
        rows.into_iter().map(Slot::try_from).collect()
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Slot>, AppError> {
        let row = sqlx::query_as::<_, SlotRow>("SELECT * FROM slots WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?;
        row.map(Slot::try_from).transpose()
    }

    async fn find_by_reservation(&self, reservation_id: &str) -> Result<Option<Slot>, AppError> {
        let row = sqlx::query_as::<_, SlotRow>("SELECT * FROM slots WHERE reservation_id = ?")
            .bind(reservation_id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?;
        row.map(Slot::try_from).transpose()
    }

    async fn find_by_event(&self, external_event_id: &str) -> Result<Option<Slot>, AppError> {
        let row = sqlx::query_as::<_, SlotRow>("SELECT * FROM slots WHERE external_event_id = ?")
            .bind(external_event_id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?;
        row.map(Slot::try_from).transpose()
    }

    async fn claim(&self, claim: &ClaimRequest, reservation: &Reservation) -> Result<Option<Slot>, AppError> {
        // Single conditional update: the status predicate is re-checked on
        // the row being written, so of N concurrent claimants exactly one
        // observes AVAILABLE and the rest match zero rows.
        let row = sqlx::query_as::<_, SlotRow>(
            "UPDATE slots
             SET status = 'BOOKED', reservation_id = ?, client_id = ?, start_time = ?, end_time = ?,
                 external_event_id = ?, external_event_link = ?, booked_at = ?
             WHERE id = (
                 SELECT id FROM slots
                 WHERE location_id = ? AND date = ?
                   AND window_start <= ? AND window_end >= ?
                   AND (status = 'AVAILABLE' OR (status = 'RESCHEDULING' AND id = ?))
                 ORDER BY window_start
                 LIMIT 1
             )
             AND (status = 'AVAILABLE' OR (status = 'RESCHEDULING' AND id = ?))
             RETURNING *"
        )
            .bind(&reservation.id).bind(&reservation.client_id)
            .bind(reservation.start_time).bind(reservation.end_time)
            .bind(&reservation.external_event_id).bind(&reservation.external_event_link)
            .bind(reservation.booked_at)
            .bind(&claim.location_id).bind(claim.date).bind(claim.start).bind(claim.end)
            .bind(&claim.reclaim_slot_id).bind(&claim.reclaim_slot_id)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?;
        row.map(Slot::try_from).transpose()
    }

    async fn begin_reschedule(&self, slot_id: &str, reservation_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE slots
             SET status = 'RESCHEDULING', reservation_id = NULL, client_id = NULL, start_time = NULL,
                 end_time = NULL, external_event_id = NULL, external_event_link = NULL, booked_at = NULL
             WHERE id = ? AND reservation_id = ? AND status = 'BOOKED'"
        )
            .bind(slot_id).bind(reservation_id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }

    async fn restore_booked(&self, slot_id: &str, reservation: &Reservation) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE slots
             SET status = 'BOOKED', reservation_id = ?, client_id = ?, start_time = ?, end_time = ?,
                 external_event_id = ?, external_event_link = ?, booked_at = ?
             WHERE id = ? AND status = 'RESCHEDULING'"
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
             WHERE id = ? AND reservation_id = ? AND status = 'BOOKED'"
        )
            .bind(slot_id).bind(reservation_id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }

    async fn release_rescheduling(&self, slot_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE slots SET status = 'AVAILABLE' WHERE id = ? AND status = 'RESCHEDULING'"
        )
            .bind(slot_id)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }

    async fn purge_expired(&self, today: NaiveDate) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM slots WHERE status = 'AVAILABLE' AND expiry < ?")
            .bind(today)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(result.rows_affected())
    }
}
