//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod broker;
pub mod hardware;
pub mod provisioning;
pub mod storage;

pub use broker::{Broker, ConnectOptions, InboundMessage, LastWill};
pub use hardware::{ClimateSensor, Clock, DigitalInput, StatusIndicator};
pub use provisioning::{Provisioner, ProvisioningOutcome};
pub use storage::SettingsRepository;
