//! Hysteresis-based change detection and the last-published bookkeeping.
//!
//! A new value is worth publishing when it differs from the value last
//! *sent* to the broker by strictly more than the channel threshold. The
//! bookkeeping in [`PublishedState`] only moves forward after a publish call
//! succeeded, so a failed publish is retried on the next reading.

use serde::Deserialize;

use crate::reading::{Reading, ReadingKind};

/// Threshold applied to occupancy (values are `0.0` / `1.0`).
pub const OCCUPANCY_THRESHOLD: f64 = 0.5;

/// Absorbs float representation noise so that a difference equal to the
/// threshold never counts as a change (`20.2 - 20.0` vs `0.2`).
const COMPARISON_EPSILON: f64 = 1e-9;

/// Per-channel hysteresis thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Minimum temperature change, in degrees Celsius.
    pub temperature: f64,
    /// Minimum relative humidity change, in percent.
    pub humidity: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            humidity: 1.0,
        }
    }
}

impl Thresholds {
    /// Threshold for the given channel.
    #[must_use]
    pub fn for_kind(&self, kind: ReadingKind) -> f64 {
        match kind {
            ReadingKind::Temperature => self.temperature,
            ReadingKind::Humidity => self.humidity,
            ReadingKind::Occupancy => OCCUPANCY_THRESHOLD,
        }
    }
}

/// Outcome of comparing a new value against the last published one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeDecision {
    /// Nothing was ever published on this channel: the value is eligible
    /// whatever its magnitude.
    Initial,
    /// The value moved by more than the threshold.
    Changed,
    /// The value stayed within the threshold.
    Unchanged,
}

impl ChangeDecision {
    /// Whether the decision calls for a publish.
    #[must_use]
    pub fn is_publish(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Stateless filter applying per-channel thresholds.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeDetector {
    thresholds: Thresholds,
}

impl ChangeDetector {
    #[must_use]
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    #[must_use]
    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Compare `new_value` to the last published value of the channel.
    #[must_use]
    pub fn evaluate(
        &self,
        kind: ReadingKind,
        new_value: f64,
        last_published: Option<f64>,
    ) -> ChangeDecision {
        let Some(last) = last_published else {
            return ChangeDecision::Initial;
        };
        let delta = (new_value - last).abs();
        if delta - self.thresholds.for_kind(kind) > COMPARISON_EPSILON {
            ChangeDecision::Changed
        } else {
            ChangeDecision::Unchanged
        }
    }

    /// Shorthand for `evaluate(..).is_publish()`.
    #[must_use]
    pub fn should_publish(
        &self,
        kind: ReadingKind,
        new_value: f64,
        last_published: Option<f64>,
    ) -> bool {
        self.evaluate(kind, new_value, last_published).is_publish()
    }
}

/// Tracking for one channel.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChannelState {
    /// Most recent valid reading, published or not.
    pub latest: Option<f64>,
    /// Value last sent to the broker successfully.
    pub published: Option<f64>,
}

/// Latest and last-published values for every channel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PublishedState {
    temperature: ChannelState,
    humidity: ChannelState,
    occupancy: ChannelState,
}

impl PublishedState {
    #[must_use]
    pub fn channel(&self, kind: ReadingKind) -> &ChannelState {
        match kind {
            ReadingKind::Temperature => &self.temperature,
            ReadingKind::Humidity => &self.humidity,
            ReadingKind::Occupancy => &self.occupancy,
        }
    }

    fn channel_mut(&mut self, kind: ReadingKind) -> &mut ChannelState {
        match kind {
            ReadingKind::Temperature => &mut self.temperature,
            ReadingKind::Humidity => &mut self.humidity,
            ReadingKind::Occupancy => &mut self.occupancy,
        }
    }

    /// Cache a reading as the latest local value.
    ///
    /// Invalid readings are ignored; returns whether the reading was kept.
    pub fn observe(&mut self, reading: &Reading) -> bool {
        if !reading.valid {
            return false;
        }
        self.channel_mut(reading.kind).latest = Some(reading.value);
        true
    }

    #[must_use]
    pub fn latest(&self, kind: ReadingKind) -> Option<f64> {
        self.channel(kind).latest
    }

    #[must_use]
    pub fn last_published(&self, kind: ReadingKind) -> Option<f64> {
        self.channel(kind).published
    }

    #[must_use]
    pub fn has_ever_published(&self, kind: ReadingKind) -> bool {
        self.channel(kind).published.is_some()
    }

    /// Record that `value` reached the broker. Call only after a successful
    /// publish.
    pub fn mark_published(&mut self, kind: ReadingKind, value: f64) {
        self.channel_mut(kind).published = Some(value);
    }
}
