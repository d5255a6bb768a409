//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`NodeError`]
//! when crossing a port boundary.

/// Boxed source error carried by the IO-facing variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error for the sensor node.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// A domain invariant was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// Persisted settings could not be read or written.
    #[error("storage error")]
    Storage(#[source] BoxError),

    /// The broker transport failed (connect, publish, subscribe, poll).
    #[error("transport error")]
    Transport(#[source] BoxError),

    /// A hardware collaborator (sensor bus, input line, LED) failed.
    #[error("hardware error")]
    Hardware(#[source] BoxError),

    /// The node could not be provisioned onto the network.
    #[error("provisioning error")]
    Provisioning(#[source] BoxError),
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The device identifier is empty.
    #[error("device id must not be empty")]
    EmptyDeviceId,

    /// The device identifier contains characters that are not valid in a
    /// topic level.
    #[error("device id {0:?} contains a topic separator or wildcard")]
    InvalidDeviceId(String),

    /// The broker host is empty.
    #[error("broker host must not be empty")]
    EmptyBrokerHost,

    /// The broker port is zero or not a number.
    #[error("invalid broker port {0:?}")]
    InvalidBrokerPort(String),
}
