//! Hub autodiscovery descriptors.
//!
//! Builds one retained registration message per enabled capability so that a
//! home-automation hub can create UI entities without manual configuration.
//! Construction is pure; publishing is the session manager's job.

use serde::Serialize;

use crate::capability::{Capability, CapabilitySet};
use crate::payload::{AVAILABILITY_OFFLINE, AVAILABILITY_ONLINE, MOTION_OFF, MOTION_ON};
use crate::settings::DeviceIdentity;
use crate::topics::TopicSet;

pub const DEVICE_MANUFACTURER: &str = "dhtnode";
pub const DEVICE_MODEL: &str = "DHT22 sensor node";
pub const SW_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Device block shared by every descriptor of this node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceInfo {
    pub identifiers: Vec<String>,
    pub name: String,
    pub manufacturer: &'static str,
    pub model: &'static str,
    pub sw_version: &'static str,
}

/// Registration payload for one capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryDescriptor {
    pub name: String,
    pub unique_id: String,
    pub state_topic: String,
    pub availability_topic: String,
    pub payload_available: &'static str,
    pub payload_not_available: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_of_measurement: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_template: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_class: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_on: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_off: Option<&'static str>,
    pub device: DeviceInfo,
}

impl DiscoveryDescriptor {
    /// Encode as a JSON object.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// A descriptor together with the topic it is published to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryMessage {
    pub capability: Capability,
    pub topic: String,
    pub descriptor: DiscoveryDescriptor,
}

/// Build the descriptor for a single capability.
#[must_use]
pub fn describe(
    capability: Capability,
    identity: &DeviceIdentity,
    topics: &TopicSet,
) -> DiscoveryDescriptor {
    let device_id = identity.device_id();
    let object_prefix = device_id.replace('-', "_");
    let (label, unit, template, class) = match capability {
        Capability::Temperature => (
            "Temperature",
            Some("\u{b0}C"),
            Some("{{ value_json.temperature }}"),
            Some("temperature"),
        ),
        Capability::Humidity => (
            "Humidity",
            Some("%"),
            Some("{{ value_json.humidity }}"),
            Some("humidity"),
        ),
        Capability::Motion => ("Motion", None, None, Some("motion")),
    };
    let (payload_on, payload_off) = match capability {
        Capability::Motion => (Some(MOTION_ON), Some(MOTION_OFF)),
        Capability::Temperature | Capability::Humidity => (None, None),
    };

    DiscoveryDescriptor {
        name: format!("{device_id} {label}"),
        unique_id: format!("{object_prefix}_{}", capability.object_id()),
        state_topic: topics.value_topic(capability).to_string(),
        availability_topic: topics.availability().to_string(),
        payload_available: AVAILABILITY_ONLINE,
        payload_not_available: AVAILABILITY_OFFLINE,
        unit_of_measurement: unit,
        value_template: template,
        device_class: class,
        payload_on,
        payload_off,
        device: DeviceInfo {
            identifiers: vec![object_prefix],
            name: device_id.to_string(),
            manufacturer: DEVICE_MANUFACTURER,
            model: DEVICE_MODEL,
            sw_version: SW_VERSION,
        },
    }
}

/// Build one discovery message per enabled capability, in announcement order.
#[must_use]
pub fn build_messages(
    capabilities: &CapabilitySet,
    identity: &DeviceIdentity,
    topics: &TopicSet,
) -> Vec<DiscoveryMessage> {
    capabilities
        .iter()
        .map(|capability| DiscoveryMessage {
            capability,
            topic: topics.discovery(capability),
            descriptor: describe(capability, identity, topics),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    fn identity() -> DeviceIdentity {
        Settings {
            device_id: "attic-node".to_string(),
            ..Settings::default()
        }
        .into_identity()
        .unwrap()
    }

    fn topics() -> TopicSet {
        TopicSet::new("dht", "homeassistant", "attic-node")
    }

    #[test]
    fn should_describe_temperature_with_unit_and_template() {
        let descriptor = describe(Capability::Temperature, &identity(), &topics());
        assert_eq!(descriptor.name, "attic-node Temperature");
        assert_eq!(descriptor.unique_id, "attic_node_temperature");
        assert_eq!(descriptor.state_topic, "dht/attic-node/status");
        assert_eq!(descriptor.availability_topic, "dht/attic-node/online");
        assert_eq!(descriptor.unit_of_measurement, Some("\u{b0}C"));
        assert_eq!(
            descriptor.value_template,
            Some("{{ value_json.temperature }}")
        );
    }

    #[test]
    fn should_describe_motion_with_category_instead_of_unit() {
        let descriptor = describe(Capability::Motion, &identity(), &topics());
        assert_eq!(descriptor.state_topic, "dht/attic-node/motion");
        assert_eq!(descriptor.unit_of_measurement, None);
        assert_eq!(descriptor.value_template, None);
        assert_eq!(descriptor.device_class, Some("motion"));
        assert_eq!(descriptor.payload_on, Some("ON"));
        assert_eq!(descriptor.payload_off, Some("OFF"));
    }

    #[test]
    fn should_use_true_false_availability_literals() {
        let descriptor = describe(Capability::Humidity, &identity(), &topics());
        let raw = descriptor.to_json().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["payload_available"], "true");
        assert_eq!(json["payload_not_available"], "false");
        assert_eq!(json["unit_of_measurement"], "%");
        assert!(json.get("payload_on").is_none());
    }

    #[test]
    fn should_build_one_message_per_enabled_capability() {
        let capabilities = CapabilitySet {
            temperature: true,
            humidity: true,
            motion: true,
        };
        let messages = build_messages(&capabilities, &identity(), &topics());
        let topics: Vec<_> = messages.iter().map(|m| m.topic.as_str()).collect();
        assert_eq!(
            topics,
            vec![
                "homeassistant/sensor/attic-node/temperature/config",
                "homeassistant/sensor/attic-node/humidity/config",
                "homeassistant/binary_sensor/attic-node/motion/config",
            ]
        );
    }

    #[test]
    fn should_be_deterministic() {
        let capabilities = CapabilitySet::default();
        assert_eq!(
            build_messages(&capabilities, &identity(), &topics()),
            build_messages(&capabilities, &identity(), &topics())
        );
    }

    #[test]
    fn should_share_device_block_across_descriptors() {
        let messages = build_messages(&CapabilitySet::default(), &identity(), &topics());
        assert_eq!(messages[0].descriptor.device, messages[1].descriptor.device);
        assert_eq!(
            messages[0].descriptor.device.identifiers,
            vec!["attic_node".to_string()]
        );
    }
}
