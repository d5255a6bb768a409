//! Sensor readings and their validity rules.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::time::Tick;

/// Lowest physically valid relative humidity, in percent.
pub const HUMIDITY_MIN: f64 = 0.0;
/// Highest physically valid relative humidity, in percent.
pub const HUMIDITY_MAX: f64 = 100.0;

/// The channel a reading belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingKind {
    Temperature,
    Humidity,
    Occupancy,
}

impl ReadingKind {
    /// Field name used for this channel in payloads and topics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Occupancy => "occupancy",
        }
    }
}

impl fmt::Display for ReadingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single sampled value. Lives for one scheduler tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub kind: ReadingKind,
    pub value: f64,
    /// `false` when the transducer returned NaN or an out-of-range value.
    pub valid: bool,
    pub timestamp: Tick,
}

impl Reading {
    /// Build a temperature reading; non-finite values are invalid.
    #[must_use]
    pub fn temperature(value: f64, timestamp: Tick) -> Self {
        Self {
            kind: ReadingKind::Temperature,
            value,
            valid: value.is_finite(),
            timestamp,
        }
    }

    /// Build a humidity reading; non-finite values and values outside
    /// `[0, 100]` are invalid.
    #[must_use]
    pub fn humidity(value: f64, timestamp: Tick) -> Self {
        Self {
            kind: ReadingKind::Humidity,
            value,
            valid: value.is_finite() && (HUMIDITY_MIN..=HUMIDITY_MAX).contains(&value),
            timestamp,
        }
    }

    /// Build an occupancy reading from the state of a binary input line.
    #[must_use]
    pub fn occupancy(occupied: bool, timestamp: Tick) -> Self {
        Self {
            kind: ReadingKind::Occupancy,
            value: if occupied { 1.0 } else { 0.0 },
            valid: true,
            timestamp,
        }
    }
}

/// Raw output of one climate transducer read. Either field may be NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateSample {
    pub temperature: f64,
    pub humidity: f64,
}

impl ClimateSample {
    /// A sample where the transducer did not answer.
    #[must_use]
    pub fn failed() -> Self {
        Self {
            temperature: f64::NAN,
            humidity: f64::NAN,
        }
    }

    /// Split into one reading per channel, each with its own validity.
    #[must_use]
    pub fn into_readings(self, timestamp: Tick) -> [Reading; 2] {
        [
            Reading::temperature(self.temperature, timestamp),
            Reading::humidity(self.humidity, timestamp),
        ]
    }
}
