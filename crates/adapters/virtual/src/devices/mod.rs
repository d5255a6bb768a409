//! Simulated peripherals.

mod indicator;
mod occupancy;
mod sensor;

pub use indicator::LoggingIndicator;
pub use occupancy::{OccupancyPattern, VirtualOccupancy};
pub use sensor::{ClimateProfile, VirtualClimateSensor};
