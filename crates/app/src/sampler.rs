//! Sensor sampling and digital input polling.

use dhtnode_domain::reading::{ClimateSample, Reading};
use dhtnode_domain::time::{self, Tick};

use crate::ports::{ClimateSensor, DigitalInput};

/// Minimum spacing between two transducer reads mandated by the DHT22.
pub const DHT22_MIN_SPACING: Tick = 2000;

/// Wraps the climate transducer and enforces its minimum read spacing.
pub struct SensorSampler<S> {
    sensor: S,
    min_spacing: Tick,
    last_read: Option<Tick>,
}

impl<S: ClimateSensor> SensorSampler<S> {
    #[must_use]
    pub fn new(sensor: S, min_spacing: Tick) -> Self {
        Self {
            sensor,
            min_spacing,
            last_read: None,
        }
    }

    /// Read the transducer if the spacing allows it.
    ///
    /// Returns `None` when called too soon after the previous read. A bus
    /// failure or an out-of-range value yields invalid readings rather than
    /// an error; both are logged at warn level on every read.
    pub fn sample(&mut self, now: Tick) -> Option<[Reading; 2]> {
        if let Some(last) = self.last_read
            && !time::has_elapsed(now, last, self.min_spacing)
        {
            tracing::trace!(now, last, "transducer read skipped, spacing not elapsed");
            return None;
        }
        self.last_read = Some(now);

        let readings = match self.sensor.read() {
            Ok(sample) => {
                let readings = sample.into_readings(now);
                for reading in readings.iter().filter(|reading| !reading.valid) {
                    tracing::warn!(
                        kind = %reading.kind,
                        value = reading.value,
                        "invalid climate reading"
                    );
                }
                readings
            }
            Err(err) => {
                tracing::warn!(%err, "climate sensor read failed");
                ClimateSample::failed().into_readings(now)
            }
        };
        Some(readings)
    }

    #[must_use]
    pub fn sensor(&self) -> &S {
        &self.sensor
    }
}

/// Samples the occupancy input line.
pub struct DigitalInputPoller<I> {
    input: I,
}

impl<I: DigitalInput> DigitalInputPoller<I> {
    #[must_use]
    pub fn new(input: I) -> Self {
        Self { input }
    }

    /// Sample the line; `None` when it could not be read.
    pub fn poll(&mut self, now: Tick) -> Option<Reading> {
        match self.input.is_high() {
            Ok(level) => Some(Reading::occupancy(level, now)),
            Err(err) => {
                tracing::warn!(%err, "occupancy input read failed");
                None
            }
        }
    }
}
