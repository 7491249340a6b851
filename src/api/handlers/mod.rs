pub mod availability;
pub mod health;
pub mod location;
pub mod reservation;
pub mod schedule;
