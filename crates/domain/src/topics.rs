//! Topic layout — a pure function of the device identifier.
//!
//! | Topic | Format |
//! |-------|--------|
//! | State | `<prefix>/<device_id>/status` |
//! | Availability | `<prefix>/<device_id>/online` |
//! | Motion | `<prefix>/<device_id>/motion` |
//! | Command | `<prefix>/command` |
//! | Discovery | `<discovery_prefix>/<component>/<device_id>/<object_id>/config` |
//!
//! Topics must stay stable for a given device id so that the hub keeps the
//! entities it registered across reconnects.

use crate::capability::Capability;

pub const DEFAULT_TOPIC_PREFIX: &str = "dhtnode";
pub const DEFAULT_DISCOVERY_PREFIX: &str = "homeassistant";

/// All topics used by one device, derived once from its identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSet {
    device_id: String,
    discovery_prefix: String,
    state: String,
    availability: String,
    motion: String,
    command: String,
}

impl TopicSet {
    /// Derive the topic set for `device_id` under the given namespaces.
    #[must_use]
    pub fn new(prefix: &str, discovery_prefix: &str, device_id: &str) -> Self {
        Self {
            device_id: device_id.to_string(),
            discovery_prefix: discovery_prefix.to_string(),
            state: format!("{prefix}/{device_id}/status"),
            availability: format!("{prefix}/{device_id}/online"),
            motion: format!("{prefix}/{device_id}/motion"),
            command: format!("{prefix}/command"),
        }
    }

    /// Derive the topic set under the default namespaces.
    #[must_use]
    pub fn with_defaults(device_id: &str) -> Self {
        Self::new(DEFAULT_TOPIC_PREFIX, DEFAULT_DISCOVERY_PREFIX, device_id)
    }

    #[must_use]
    pub fn state(&self) -> &str {
        &self.state
    }

    #[must_use]
    pub fn availability(&self) -> &str {
        &self.availability
    }

    #[must_use]
    pub fn motion(&self) -> &str {
        &self.motion
    }

    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Topic a capability's discovery descriptor is published to.
    #[must_use]
    pub fn discovery(&self, capability: Capability) -> String {
        format!(
            "{}/{}/{}/{}/config",
            self.discovery_prefix,
            capability.component(),
            self.device_id,
            capability.object_id()
        )
    }

    /// Topic carrying live values for a capability.
    #[must_use]
    pub fn value_topic(&self, capability: Capability) -> &str {
        match capability {
            Capability::Temperature | Capability::Humidity => &self.state,
            Capability::Motion => &self.motion,
        }
    }
}
