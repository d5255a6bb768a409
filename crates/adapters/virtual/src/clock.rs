//! Host tick source.

use std::time::Instant;

use dhtnode_app::ports::Clock;
use dhtnode_domain::time::Tick;

/// Milliseconds elapsed since the clock was created, wrapping like a
/// microcontroller counter.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    #[allow(clippy::cast_possible_truncation)]
    fn now(&self) -> Tick {
        // truncation is the wrap
        self.origin.elapsed().as_millis() as Tick
    }
}
