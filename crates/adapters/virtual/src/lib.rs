//! # dhtnode-adapter-virtual
//!
//! Virtual hardware that lets the node run on any host.
//!
//! ## Provided devices
//!
//! | Device | Port | Behaviour |
//! |--------|------|-----------|
//! | [`VirtualClimateSensor`] | `ClimateSensor` | Deterministic slow drift, optional periodic bus fault |
//! | [`VirtualOccupancy`] | `DigitalInput` | Repeating occupied/vacant pattern |
//! | [`LoggingIndicator`] | `StatusIndicator` | Logs each flash |
//! | [`SystemClock`] | `Clock` | Milliseconds since creation, wrapping |
//!
//! ## Dependency rule
//!
//! Depends on `dhtnode-app` (port traits) and `dhtnode-domain` only.

mod clock;
mod devices;

pub use clock::SystemClock;
pub use devices::{
    ClimateProfile, LoggingIndicator, OccupancyPattern, VirtualClimateSensor, VirtualOccupancy,
};
