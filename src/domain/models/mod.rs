pub mod calendar;
pub mod location;
pub mod schedule;
pub mod slot;
