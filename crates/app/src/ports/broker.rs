//! Broker port — the single publish/subscribe connection of the node.
//!
//! The wire protocol lives behind this trait. The session manager drives it
//! from the control loop and never assumes a push notification for
//! disconnects: it asks [`Broker::is_connected`] at the top of each
//! network-service tick.

use std::future::Future;
use std::time::Duration;

use dhtnode_domain::error::NodeError;

/// Message the broker publishes on behalf of the node when the transport
/// drops without a clean disconnect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastWill {
    pub topic: String,
    pub payload: String,
    pub retain: bool,
}

/// Parameters for one connection attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub keep_alive: Duration,
    pub last_will: LastWill,
}

/// A message received on a subscribed topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// Broker transport.
pub trait Broker {
    /// Open a session with the broker, registering the last will.
    ///
    /// Resolves once the broker acknowledged the session, or fails.
    fn connect(
        &mut self,
        options: &ConnectOptions,
    ) -> impl Future<Output = Result<(), NodeError>> + Send;

    /// Whether the transport is still believed to be up.
    fn is_connected(&self) -> bool;

    /// Publish `payload` on `topic` (at most once delivery).
    fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        retain: bool,
    ) -> impl Future<Output = Result<(), NodeError>> + Send;

    /// Subscribe to `topic`.
    fn subscribe(&mut self, topic: &str) -> impl Future<Output = Result<(), NodeError>> + Send;

    /// Service the transport: process inbound frames, flush keepalives, and
    /// return any message received since the last call.
    ///
    /// Must not block for longer than the adapter's poll budget.
    fn poll(&mut self) -> impl Future<Output = Result<Vec<InboundMessage>, NodeError>> + Send;
}
