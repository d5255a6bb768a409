//! # dhtnode-domain
//!
//! Pure domain model for the dhtnode sensor firmware.
//!
//! ## Responsibilities
//! - Foundational types: error conventions, wrapping tick arithmetic
//! - Define **Readings** (temperature, humidity, occupancy) and their validity
//! - Define the [`ChangeDetector`](change::ChangeDetector) (hysteresis) and
//!   last-published bookkeeping
//! - Define [`Settings`](settings::Settings) and
//!   [`DeviceIdentity`](settings::DeviceIdentity) (broker address, device id)
//! - Derive the [`TopicSet`](topics::TopicSet) and the hub **discovery descriptors**
//! - Define [`SessionState`](session::SessionState) and the payload literals
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod time;

pub mod capability;
pub mod change;
pub mod discovery;
pub mod payload;
pub mod reading;
pub mod session;
pub mod settings;
pub mod topics;
