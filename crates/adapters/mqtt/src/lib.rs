//! # dhtnode-adapter-mqtt
//!
//! MQTT adapter — implements the [`Broker`] port over `rumqttc`.
//!
//! ## Responsibilities
//! - Open a clean session with the configured last will
//! - Drive the rumqttc event loop from the node's cooperative loop: each
//!   request is flushed before the call returns, and inbound publishes seen
//!   on the way are buffered for the next [`Broker::poll`]
//! - Report a lost transport through [`Broker::is_connected`]
//!
//! The event loop is never spawned onto a background task; it only makes
//! progress while the session manager calls into this adapter.
//!
//! ## Dependency rule
//! Same as other adapters: depends on `dhtnode-app` and `dhtnode-domain`.

pub mod config;
pub mod error;

use std::time::Duration;

use dhtnode_app::ports::{Broker, ConnectOptions, InboundMessage};
use dhtnode_domain::error::NodeError;
use rumqttc::{AsyncClient, Event, EventLoop, LastWill, MqttOptions, Outgoing, Packet, QoS};

pub use config::MqttConfig;
pub use error::MqttError;

/// Upper bound on events handled by a single [`Broker::poll`].
const MAX_EVENTS_PER_POLL: usize = 32;

/// Broker transport backed by a rumqttc client and its event loop.
pub struct MqttBroker {
    config: MqttConfig,
    session: Option<Session>,
}

impl MqttBroker {
    #[must_use]
    pub fn new(config: MqttConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    fn live_session(&mut self) -> Result<&mut Session, MqttError> {
        self.session
            .as_mut()
            .filter(|session| session.connected)
            .ok_or(MqttError::NotConnected)
    }
}

struct Session {
    client: AsyncClient,
    eventloop: EventLoop,
    connected: bool,
    inbound: Vec<InboundMessage>,
}

impl Session {
    fn open(options: &ConnectOptions, capacity: usize) -> Self {
        let (client, eventloop) = AsyncClient::new(mqtt_options(options), capacity);
        Self {
            client,
            eventloop,
            connected: false,
            inbound: Vec::new(),
        }
    }

    /// Poll the event loop until `done` matches an event, bounded by `limit`.
    async fn drive_until(
        &mut self,
        limit: Duration,
        waiting_for: &'static str,
        done: impl Fn(&Event) -> bool,
    ) -> Result<(), MqttError> {
        let outcome = tokio::time::timeout(limit, async {
            loop {
                let event = match self.eventloop.poll().await {
                    Ok(event) => event,
                    Err(err) => return Err(MqttError::Connection(Box::new(err))),
                };
                let matched = done(&event);
                self.record(event);
                if matched {
                    return Ok(());
                }
            }
        })
        .await;

        let result = outcome.unwrap_or(Err(MqttError::Timeout(waiting_for)));
        if result.is_err() {
            self.connected = false;
        }
        result
    }

    /// Handle whatever the event loop has ready without waiting.
    async fn drain(&mut self) -> Result<(), MqttError> {
        for _ in 0..MAX_EVENTS_PER_POLL {
            match tokio::time::timeout(Duration::ZERO, self.eventloop.poll()).await {
                Err(_) => break,
                Ok(Ok(event)) => self.record(event),
                Ok(Err(err)) => {
                    self.connected = false;
                    return Err(MqttError::Connection(Box::new(err)));
                }
            }
        }
        Ok(())
    }

    fn record(&mut self, event: Event) {
        match event {
            Event::Incoming(Packet::ConnAck(_)) => self.connected = true,
            Event::Incoming(Packet::Publish(publish)) => {
                tracing::debug!(topic = %publish.topic, bytes = publish.payload.len(), "inbound message");
                self.inbound.push(InboundMessage {
                    topic: publish.topic,
                    payload: publish.payload.to_vec(),
                });
            }
            Event::Incoming(Packet::Disconnect) => {
                tracing::warn!("broker closed the session");
                self.connected = false;
            }
            other => tracing::trace!(event = ?other, "mqtt event"),
        }
    }
}

fn mqtt_options(options: &ConnectOptions) -> MqttOptions {
    let mut mqtt = MqttOptions::new(&options.client_id, &options.host, options.port);
    mqtt.set_keep_alive(options.keep_alive);
    mqtt.set_clean_session(true);
    mqtt.set_last_will(LastWill::new(
        &options.last_will.topic,
        options.last_will.payload.as_bytes().to_vec(),
        QoS::AtMostOnce,
        options.last_will.retain,
    ));
    mqtt
}

impl Broker for MqttBroker {
    #[tracing::instrument(skip_all, fields(host = %options.host, port = options.port, client_id = %options.client_id))]
    async fn connect(&mut self, options: &ConnectOptions) -> Result<(), NodeError> {
        self.session = None;
        let mut session = Session::open(options, self.config.channel_capacity);
        session
            .drive_until(self.config.connect_timeout(), "CONNACK", |event| {
                matches!(event, Event::Incoming(Packet::ConnAck(_)))
            })
            .await?;
        tracing::debug!("session open");
        self.session = Some(session);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.session.as_ref().is_some_and(|session| session.connected)
    }

    async fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        retain: bool,
    ) -> Result<(), NodeError> {
        let limit = self.config.publish_timeout();
        let session = self.live_session()?;
        session
            .client
            .publish(topic, QoS::AtMostOnce, retain, payload.to_vec())
            .await
            .map_err(MqttError::Client)?;
        session
            .drive_until(limit, "PUBLISH flush", |event| {
                matches!(event, Event::Outgoing(Outgoing::Publish(_)))
            })
            .await?;
        Ok(())
    }

    async fn subscribe(&mut self, topic: &str) -> Result<(), NodeError> {
        let limit = self.config.publish_timeout();
        let session = self.live_session()?;
        session
            .client
            .subscribe(topic, QoS::AtMostOnce)
            .await
            .map_err(MqttError::Client)?;
        session
            .drive_until(limit, "SUBSCRIBE flush", |event| {
                matches!(event, Event::Outgoing(Outgoing::Subscribe(_)))
            })
            .await?;
        tracing::debug!(%topic, "subscribed");
        Ok(())
    }

    async fn poll(&mut self) -> Result<Vec<InboundMessage>, NodeError> {
        let session = self.live_session()?;
        session.drain().await?;
        Ok(std::mem::take(&mut session.inbound))
    }
}
