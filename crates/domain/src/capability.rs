//! Exposed capabilities — the fixed set of data channels this node announces.

use serde::Deserialize;

use crate::reading::ReadingKind;

/// One data channel exposed to the automation hub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Temperature,
    Humidity,
    Motion,
}

impl Capability {
    /// Reading kind that feeds this capability.
    #[must_use]
    pub fn reading_kind(self) -> ReadingKind {
        match self {
            Self::Temperature => ReadingKind::Temperature,
            Self::Humidity => ReadingKind::Humidity,
            Self::Motion => ReadingKind::Occupancy,
        }
    }

    /// Object id used in the discovery topic and unique id.
    #[must_use]
    pub fn object_id(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Motion => "motion",
        }
    }

    /// Hub component type announced for this capability.
    #[must_use]
    pub fn component(self) -> &'static str {
        match self {
            Self::Temperature | Self::Humidity => "sensor",
            Self::Motion => "binary_sensor",
        }
    }
}

/// Capabilities enabled for this build/configuration.
///
/// Resolved once at boot; never changes at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CapabilitySet {
    pub temperature: bool,
    pub humidity: bool,
    pub motion: bool,
}

impl Default for CapabilitySet {
    fn default() -> Self {
        Self {
            temperature: true,
            humidity: true,
            motion: false,
        }
    }
}

impl CapabilitySet {
    /// Enabled capabilities, in announcement order.
    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        [
            (self.temperature, Capability::Temperature),
            (self.humidity, Capability::Humidity),
            (self.motion, Capability::Motion),
        ]
        .into_iter()
        .filter_map(|(enabled, capability)| enabled.then_some(capability))
    }

    /// Whether the given capability is enabled.
    #[must_use]
    pub fn contains(&self, capability: Capability) -> bool {
        match capability {
            Capability::Temperature => self.temperature,
            Capability::Humidity => self.humidity,
            Capability::Motion => self.motion,
        }
    }

    /// Whether any climate channel is enabled.
    #[must_use]
    pub fn has_climate(&self) -> bool {
        self.temperature || self.humidity
    }
}
