//! Persisted device settings and the identity derived from them.
//!
//! The settings object is what the provisioning surface edits and what the
//! settings store persists across power cycles. [`DeviceIdentity`] is the
//! validated, immutable view the runtime uses for the rest of a run.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;

pub const DEFAULT_BROKER_HOST: &str = "localhost";
pub const DEFAULT_BROKER_PORT: u16 = 1883;
pub const DEFAULT_DEVICE_ID: &str = "dht22-node";

/// Broker connection settings as persisted on disk.
///
/// `brokerPort` is accepted either as a JSON number or a numeric string, and
/// missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub broker_host: String,
    #[serde(deserialize_with = "deserialize_port")]
    pub broker_port: u16,
    pub device_id: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            broker_host: DEFAULT_BROKER_HOST.to_string(),
            broker_port: DEFAULT_BROKER_PORT,
            device_id: DEFAULT_DEVICE_ID.to_string(),
        }
    }
}

impl Settings {
    /// Check the invariants the runtime relies on.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when a field is empty, the port is zero,
    /// or the device id cannot be used as a topic level.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.broker_host.trim().is_empty() {
            return Err(ValidationError::EmptyBrokerHost);
        }
        if self.broker_port == 0 {
            return Err(ValidationError::InvalidBrokerPort("0".to_string()));
        }
        if self.device_id.trim().is_empty() {
            return Err(ValidationError::EmptyDeviceId);
        }
        if self
            .device_id
            .chars()
            .any(|c| matches!(c, '/' | '+' | '#') || c.is_whitespace())
        {
            return Err(ValidationError::InvalidDeviceId(self.device_id.clone()));
        }
        Ok(())
    }

    /// Freeze these settings into the identity used for the current run.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when [`validate`](Self::validate) fails.
    pub fn into_identity(self) -> Result<DeviceIdentity, ValidationError> {
        self.validate()?;
        Ok(DeviceIdentity {
            broker_host: self.broker_host,
            broker_port: self.broker_port,
            device_id: self.device_id,
        })
    }
}

/// Immutable identity of the node for the lifetime of a run.
///
/// Changes to the persisted settings only take effect after a restart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    broker_host: String,
    broker_port: u16,
    device_id: String,
}

impl DeviceIdentity {
    #[must_use]
    pub fn broker_host(&self) -> &str {
        &self.broker_host
    }

    #[must_use]
    pub fn broker_port(&self) -> u16 {
        self.broker_port
    }

    #[must_use]
    pub fn device_id(&self) -> &str {
        &self.device_id
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PortRepr {
    Number(u16),
    Text(String),
}

fn deserialize_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    match PortRepr::deserialize(deserializer)? {
        PortRepr::Number(port) => Ok(port),
        PortRepr::Text(text) => text.trim().parse().map_err(|_| {
            serde::de::Error::custom(ValidationError::InvalidBrokerPort(text.clone()))
        }),
    }
}
