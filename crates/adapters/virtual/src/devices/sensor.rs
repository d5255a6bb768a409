//! Simulated DHT22 — slow deterministic drift around a base point.

use dhtnode_app::ports::ClimateSensor;
use dhtnode_domain::error::NodeError;
use dhtnode_domain::reading::ClimateSample;
use serde::Deserialize;

/// Shape of the simulated climate.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ClimateProfile {
    pub base_temperature: f64,
    pub temperature_swing: f64,
    pub base_humidity: f64,
    pub humidity_swing: f64,
    /// Reads per full oscillation.
    pub period_reads: u32,
    /// Every n-th read fails like a bus timeout; `0` disables faults.
    pub fault_every: u32,
}

impl Default for ClimateProfile {
    fn default() -> Self {
        Self {
            base_temperature: 21.5,
            temperature_swing: 1.5,
            base_humidity: 45.0,
            humidity_swing: 6.0,
            period_reads: 90,
            fault_every: 0,
        }
    }
}

#[derive(Debug)]
pub struct VirtualClimateSensor {
    profile: ClimateProfile,
    reads: u32,
}

impl VirtualClimateSensor {
    #[must_use]
    pub fn new(profile: ClimateProfile) -> Self {
        Self { profile, reads: 0 }
    }
}

impl ClimateSensor for VirtualClimateSensor {
    fn read(&mut self) -> Result<ClimateSample, NodeError> {
        let index = self.reads;
        self.reads = self.reads.wrapping_add(1);

        let fault_every = self.profile.fault_every;
        if fault_every > 0 && index.wrapping_add(1) % fault_every == 0 {
            return Err(NodeError::Hardware("simulated bus timeout".into()));
        }

        let period = f64::from(self.profile.period_reads.max(1));
        let phase = std::f64::consts::TAU * f64::from(index) / period;
        let sample = ClimateSample {
            temperature: round_tenth(
                self.profile.base_temperature + self.profile.temperature_swing * phase.sin(),
            ),
            humidity: round_tenth(
                self.profile.base_humidity + self.profile.humidity_swing * phase.cos(),
            ),
        };
        tracing::trace!(
            temperature = sample.temperature,
            humidity = sample.humidity,
            "simulated climate read"
        );
        Ok(sample)
    }
}

/// The DHT22 reports one decimal.
fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
