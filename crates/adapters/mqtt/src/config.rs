//! MQTT transport configuration.

use std::time::Duration;

use serde::Deserialize;

/// Timeouts and buffer sizes of the rumqttc transport.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// Upper bound on waiting for the broker's `CONNACK`, in seconds.
    pub connect_timeout_secs: u64,
    /// Upper bound on flushing one outgoing packet, in milliseconds.
    pub publish_timeout_ms: u64,
    /// Capacity of the request channel between client and event loop.
    pub channel_capacity: usize,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 5,
            publish_timeout_ms: 500,
            channel_capacity: 10,
        }
    }
}

impl MqttConfig {
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    #[must_use]
    pub fn publish_timeout(&self) -> Duration {
        Duration::from_millis(self.publish_timeout_ms)
    }
}
