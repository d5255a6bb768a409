//! Hardware ports — transducer, input line, status LED, tick source.
//!
//! Bus timing and electrical details live in the adapters; reads are
//! treated as plain function calls by the control loop. The LED flash is
//! awaited so a timed pulse never blocks the executor.

use std::future::Future;

use dhtnode_domain::error::NodeError;
use dhtnode_domain::reading::ClimateSample;
use dhtnode_domain::time::Tick;

/// Combined temperature/humidity transducer.
pub trait ClimateSensor {
    /// Read both channels. Channels the transducer could not measure are
    /// reported as NaN; a bus failure is reported as an error.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::Hardware`] when the transducer did not answer.
    fn read(&mut self) -> Result<ClimateSample, NodeError>;
}

/// Binary input line (occupancy detector).
pub trait DigitalInput {
    /// Current level of the line; `true` means occupied.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::Hardware`] when the line cannot be read.
    fn is_high(&mut self) -> Result<bool, NodeError>;
}

/// Status LED. Pure side effect, never part of a decision.
pub trait StatusIndicator {
    /// Flash the indicator once.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::Hardware`] when the LED cannot be driven.
    fn flash(&mut self) -> impl Future<Output = Result<(), NodeError>> + Send;
}

/// Monotonic, wrapping millisecond tick source.
pub trait Clock {
    fn now(&self) -> Tick;
}
