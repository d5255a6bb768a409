//! MQTT adapter error types.

use dhtnode_domain::error::NodeError;

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// No session was opened, or the last one was lost.
    #[error("MQTT client not connected")]
    NotConnected,

    /// The rumqttc client rejected a request.
    #[error("MQTT client error")]
    Client(#[source] rumqttc::ClientError),

    /// The event loop lost or could not open the connection.
    #[error("MQTT connection error")]
    Connection(#[source] Box<rumqttc::ConnectionError>),

    /// The broker did not answer in time.
    #[error("timed out waiting for {0}")]
    Timeout(&'static str),
}

impl MqttError {
    /// Convert into a [`NodeError::Transport`] for propagation across port
    /// boundaries.
    pub fn into_domain(self) -> NodeError {
        NodeError::Transport(Box::new(self))
    }
}

impl From<MqttError> for NodeError {
    fn from(err: MqttError) -> Self {
        err.into_domain()
    }
}
