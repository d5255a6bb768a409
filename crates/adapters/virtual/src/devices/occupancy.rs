//! Simulated occupancy line.

use dhtnode_app::ports::DigitalInput;
use dhtnode_domain::error::NodeError;
use serde::Deserialize;

/// Repeating pattern: the line is high for `occupied_polls` out of every
/// `period_polls` samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OccupancyPattern {
    pub period_polls: u32,
    pub occupied_polls: u32,
}

impl Default for OccupancyPattern {
    fn default() -> Self {
        // 100 ms polls: one minute cycle, twenty seconds occupied
        Self {
            period_polls: 600,
            occupied_polls: 200,
        }
    }
}

#[derive(Debug)]
pub struct VirtualOccupancy {
    pattern: OccupancyPattern,
    polls: u32,
}

impl VirtualOccupancy {
    #[must_use]
    pub fn new(pattern: OccupancyPattern) -> Self {
        Self { pattern, polls: 0 }
    }
}

impl DigitalInput for VirtualOccupancy {
    fn is_high(&mut self) -> Result<bool, NodeError> {
        let period = self.pattern.period_polls.max(1);
        let phase = self.polls % period;
        self.polls = self.polls.wrapping_add(1);
        Ok(phase < self.pattern.occupied_polls)
    }
}
