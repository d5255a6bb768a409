//! # dhtnode-adapter-sysfs
//!
//! Linux sysfs hardware — the node running on a single-board computer.
//!
//! ## Provided devices
//!
//! | Device | Port | Attribute files |
//! |--------|------|-----------------|
//! | [`IioClimateSensor`] | `ClimateSensor` | `in_temp_input`, `in_humidityrelative_input` (milli-units) |
//! | [`GpioInput`] | `DigitalInput` | GPIO `value` (`0` / `1`) |
//! | [`LedIndicator`] | `StatusIndicator` | LED class `brightness` |
//!
//! ```text
//! /sys/bus/iio/devices/iio:device0/
//!   in_temp_input               <- 21300 for 21.3 °C
//!   in_humidityrelative_input   <- 45600 for 45.6 %
//! ```
//!
//! ## Dependency rule
//!
//! Depends on `dhtnode-app` (port traits) and `dhtnode-domain` only.

pub mod config;
pub mod error;

use std::path::{Path, PathBuf};
use std::time::Duration;

use dhtnode_app::ports::{ClimateSensor, DigitalInput, StatusIndicator};
use dhtnode_domain::error::NodeError;
use dhtnode_domain::reading::ClimateSample;

pub use config::SysfsConfig;
pub use error::SysfsError;

const TEMPERATURE_ATTRIBUTE: &str = "in_temp_input";
const HUMIDITY_ATTRIBUTE: &str = "in_humidityrelative_input";

fn read_attribute(path: &Path) -> Result<i64, SysfsError> {
    let raw = std::fs::read_to_string(path).map_err(|source| SysfsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value = raw.trim();
    value.parse().map_err(|_| SysfsError::Parse {
        path: path.to_path_buf(),
        value: value.to_string(),
    })
}

fn write_attribute(path: &Path, value: &str) -> Result<(), SysfsError> {
    std::fs::write(path, value).map_err(|source| SysfsError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Converts a milli-unit attribute to its unit value.
#[allow(clippy::cast_precision_loss)]
fn from_milli(value: i64) -> f64 {
    value as f64 / 1000.0
}

/// DHT transducer bound to the kernel IIO driver.
#[derive(Debug, Clone)]
pub struct IioClimateSensor {
    temperature: PathBuf,
    humidity: PathBuf,
}

impl IioClimateSensor {
    #[must_use]
    pub fn new(device: &Path) -> Self {
        Self {
            temperature: device.join(TEMPERATURE_ATTRIBUTE),
            humidity: device.join(HUMIDITY_ATTRIBUTE),
        }
    }

    fn channel(path: &Path) -> Result<f64, SysfsError> {
        read_attribute(path).map(from_milli)
    }
}

impl ClimateSensor for IioClimateSensor {
    /// A single failed channel is reported as NaN; both failing is a bus
    /// error.
    fn read(&mut self) -> Result<ClimateSample, NodeError> {
        match (
            Self::channel(&self.temperature),
            Self::channel(&self.humidity),
        ) {
            (Ok(temperature), Ok(humidity)) => Ok(ClimateSample {
                temperature,
                humidity,
            }),
            (Ok(temperature), Err(err)) => {
                tracing::debug!(%err, "humidity channel unreadable");
                Ok(ClimateSample {
                    temperature,
                    humidity: f64::NAN,
                })
            }
            (Err(err), Ok(humidity)) => {
                tracing::debug!(%err, "temperature channel unreadable");
                Ok(ClimateSample {
                    temperature: f64::NAN,
                    humidity,
                })
            }
            (Err(err), Err(_)) => Err(err.into()),
        }
    }
}

/// Exported GPIO line.
#[derive(Debug, Clone)]
pub struct GpioInput {
    value: PathBuf,
}

impl GpioInput {
    #[must_use]
    pub fn new(value: PathBuf) -> Self {
        Self { value }
    }
}

impl DigitalInput for GpioInput {
    fn is_high(&mut self) -> Result<bool, NodeError> {
        match read_attribute(&self.value)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(SysfsError::Parse {
                path: self.value.clone(),
                value: other.to_string(),
            }
            .into()),
        }
    }
}

/// LED class device, lit for a short pulse on every flash.
///
/// The pulse is a timer sleep, so the control loop is held for its length
/// but the runtime stays free.
#[derive(Debug, Clone)]
pub struct LedIndicator {
    brightness: PathBuf,
    pulse: Duration,
}

impl LedIndicator {
    #[must_use]
    pub fn new(brightness: PathBuf, pulse: Duration) -> Self {
        Self { brightness, pulse }
    }
}

impl StatusIndicator for LedIndicator {
    async fn flash(&mut self) -> Result<(), NodeError> {
        write_attribute(&self.brightness, "1")?;
        if !self.pulse.is_zero() {
            tokio::time::sleep(self.pulse).await;
        }
        write_attribute(&self.brightness, "0")?;
        Ok(())
    }
}
