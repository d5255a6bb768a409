//! Status LED that only logs.

use dhtnode_app::ports::StatusIndicator;
use dhtnode_domain::error::NodeError;

#[derive(Debug, Default)]
pub struct LoggingIndicator {
    flashes: u64,
}

impl LoggingIndicator {
    #[must_use]
    pub fn flashes(&self) -> u64 {
        self.flashes
    }
}

impl StatusIndicator for LoggingIndicator {
    async fn flash(&mut self) -> Result<(), NodeError> {
        self.flashes += 1;
        tracing::trace!(flashes = self.flashes, "status led flash");
        Ok(())
    }
}
