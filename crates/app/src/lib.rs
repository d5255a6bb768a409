//! # dhtnode-app
//!
//! Application layer — the control loop and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement:
//!   - `Broker` — publish/subscribe transport with last will
//!   - `ClimateSensor`, `DigitalInput`, `StatusIndicator`, `Clock` — hardware
//!   - `SettingsRepository` — persisted broker settings
//!   - `Provisioner` — network association and settings entry
//! - Multiplex the sensor, input and network tasks on one cooperative loop
//! - Drive the broker session state machine and the change-driven publishing
//!
//! ## Dependency rule
//! Depends on `dhtnode-domain` only (plus `tokio::time` for the backoff wait).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod node;
pub mod ports;
pub mod sampler;
pub mod scheduler;
pub mod services;

#[cfg(test)]
mod test_support;
