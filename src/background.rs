use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use tokio::time::sleep;
use tracing::{error, info};
use crate::state::AppState;

const RECLAIM_INTERVAL_SECS: u64 = 3600;

/// Dead-slot reclamation: slots that passed their expiry date while still
/// `AVAILABLE` are purged so the store does not accumulate stale windows.
/// Booked slots are never touched.
pub async fn start_background_worker(state: Arc<AppState>) {
    info!("Starting slot reclamation worker...");

    loop {
        match state.slot_repo.purge_expired(Utc::now().date_naive()).await {
            Ok(0) => {}
            Ok(purged) => info!("Reclaimed {} expired slots", purged),
            Err(e) => error!("Failed to purge expired slots: {:?}", e),
        }
        sleep(Duration::from_secs(RECLAIM_INTERVAL_SECS)).await;
    }
}
