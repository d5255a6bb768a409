//! Payloads published on the state, availability and motion topics.

use serde::Serialize;

/// Availability payload when the node is online.
pub const AVAILABILITY_ONLINE: &str = "true";
/// Availability payload when the node is offline (also the last will).
pub const AVAILABILITY_OFFLINE: &str = "false";
/// Motion payload when occupancy is detected.
pub const MOTION_ON: &str = "ON";
/// Motion payload when the area is clear.
pub const MOTION_OFF: &str = "OFF";

/// Climate state message; values are numeric text with two decimals.
///
/// A channel with no valid reading yet is left out of the object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub humidity: Option<String>,
}

impl StatePayload {
    #[must_use]
    pub fn new(temperature: Option<f64>, humidity: Option<f64>) -> Self {
        Self {
            temperature: temperature.map(format_value),
            humidity: humidity.map(format_value),
        }
    }

    /// Whether there is nothing to report.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none() && self.humidity.is_none()
    }

    /// Encode as a JSON object.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Motion payload for an occupancy state.
#[must_use]
pub fn motion_payload(occupied: bool) -> &'static str {
    if occupied { MOTION_ON } else { MOTION_OFF }
}

fn format_value(value: f64) -> String {
    format!("{value:.2}")
}
