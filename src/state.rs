use std::sync::Arc;
use crate::config::Config;
use crate::domain::ports::{CalendarService, LocationRepository, SlotRepository};
use crate::domain::services::availability::AvailabilityService;
use crate::domain::services::reservation::ReservationService;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub location_repo: Arc<dyn LocationRepository>,
    pub slot_repo: Arc<dyn SlotRepository>,
    pub calendar: Arc<dyn CalendarService>,
    pub availability_service: Arc<AvailabilityService>,
    pub reservation_service: Arc<ReservationService>,
}
