//! Session manager — the broker connection state machine.
//!
//! ```text
//! Disconnected ──connect ok + announce ok──▶ Connected
//!      ▲   │                                    │
//!      │   └──connect failed: log, backoff──┐   │ transport lost: log, backoff
//!      └────────────────────────────────────┴───┘
//! ```
//!
//! On every successful connect the node announces itself: retained discovery
//! descriptors first, then availability, then the command subscription, then
//! the full current state. An inbound command message replays the same
//! sequence. State messages are only ever sent while `Connected`, which is
//! entered after the announcement, so discovery always precedes state within
//! a session.
//!
//! The reconnect backoff is a constant blocking wait. While it runs, nothing
//! else on the control loop executes.

use std::time::Duration;

use dhtnode_domain::capability::{Capability, CapabilitySet};
use dhtnode_domain::change::{ChangeDecision, ChangeDetector, PublishedState};
use dhtnode_domain::discovery::{self, DiscoveryMessage};
use dhtnode_domain::error::NodeError;
use dhtnode_domain::payload::{self, AVAILABILITY_OFFLINE, AVAILABILITY_ONLINE, StatePayload};
use dhtnode_domain::reading::{Reading, ReadingKind};
use dhtnode_domain::session::SessionState;
use dhtnode_domain::settings::DeviceIdentity;
use dhtnode_domain::topics::TopicSet;

use crate::ports::{Broker, ConnectOptions, LastWill};

/// Tunables of the session state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Prefix of the client identifier (`<prefix>-<device_id>`).
    pub client_prefix: String,
    pub keep_alive: Duration,
    /// Constant wait after a failed connect or a lost session.
    pub reconnect_backoff: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            client_prefix: "dhtnode".to_string(),
            keep_alive: Duration::from_secs(30),
            reconnect_backoff: Duration::from_secs(5),
        }
    }
}

/// Owns the broker connection and everything published through it.
pub struct SessionManager<B> {
    broker: B,
    identity: DeviceIdentity,
    topics: TopicSet,
    capabilities: CapabilitySet,
    detector: ChangeDetector,
    options: SessionOptions,
    discovery: Vec<DiscoveryMessage>,
    published: PublishedState,
    state: SessionState,
}

impl<B: Broker> SessionManager<B> {
    /// Create a disconnected session. Discovery descriptors are built once
    /// here; they only depend on the identity and the capability set.
    #[must_use]
    pub fn new(
        broker: B,
        identity: DeviceIdentity,
        topics: TopicSet,
        capabilities: CapabilitySet,
        detector: ChangeDetector,
        options: SessionOptions,
    ) -> Self {
        let discovery = discovery::build_messages(&capabilities, &identity, &topics);
        Self {
            broker,
            identity,
            topics,
            capabilities,
            detector,
            options,
            discovery,
            published: PublishedState::default(),
            state: SessionState::Disconnected,
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn published(&self) -> &PublishedState {
        &self.published
    }

    #[must_use]
    pub fn topics(&self) -> &TopicSet {
        &self.topics
    }

    #[must_use]
    pub fn broker(&self) -> &B {
        &self.broker
    }

    pub fn broker_mut(&mut self) -> &mut B {
        &mut self.broker
    }

    /// Options used for every connection attempt.
    #[must_use]
    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            host: self.identity.broker_host().to_string(),
            port: self.identity.broker_port(),
            client_id: format!(
                "{}-{}",
                self.options.client_prefix,
                self.identity.device_id()
            ),
            keep_alive: self.options.keep_alive,
            last_will: LastWill {
                topic: self.topics.availability().to_string(),
                payload: AVAILABILITY_OFFLINE.to_string(),
                retain: true,
            },
        }
    }

    /// Network-service task: drive the state machine by one step.
    pub async fn service(&mut self) {
        match self.state {
            SessionState::Disconnected | SessionState::Connecting => self.connect().await,
            SessionState::Connected => self.service_connected().await,
        }
    }

    /// Feed freshly sampled readings.
    ///
    /// Invalid readings are discarded. Valid ones are cached locally; when
    /// connected, channels that changed significantly are published. When
    /// not connected nothing is sent: the next announcement carries the
    /// latest cached values.
    pub async fn handle_readings(&mut self, readings: &[Reading]) {
        let mut climate = false;
        let mut occupancy = false;
        for reading in readings {
            if !self.published.observe(reading) {
                tracing::debug!(kind = %reading.kind, value = reading.value, "invalid reading discarded");
                continue;
            }
            match reading.kind {
                ReadingKind::Temperature | ReadingKind::Humidity => climate = true,
                ReadingKind::Occupancy => occupancy = true,
            }
        }

        if !self.state.is_connected() {
            if climate || occupancy {
                tracing::trace!(state = %self.state, "not connected, reading cached");
            }
            return;
        }
        if climate {
            self.publish_climate_if_changed().await;
        }
        if occupancy {
            self.publish_occupancy_if_changed().await;
        }
    }

    #[tracing::instrument(skip(self), fields(host = %self.identity.broker_host(), port = self.identity.broker_port()))]
    async fn connect(&mut self) {
        self.state = SessionState::Connecting;
        let options = self.connect_options();

        if let Err(err) = self.broker.connect(&options).await {
            tracing::warn!(%err, backoff = ?self.options.reconnect_backoff, "broker connection failed");
            self.back_off().await;
            return;
        }
        tracing::info!(client_id = %options.client_id, "connected to broker");

        if let Err(err) = self.announce().await {
            tracing::warn!(%err, backoff = ?self.options.reconnect_backoff, "announcement failed");
            self.back_off().await;
            return;
        }
        self.state = SessionState::Connected;
    }

    async fn service_connected(&mut self) {
        if !self.broker.is_connected() {
            tracing::warn!(backoff = ?self.options.reconnect_backoff, "broker connection lost");
            self.back_off().await;
            return;
        }

        let messages = match self.broker.poll().await {
            Ok(messages) => messages,
            Err(err) => {
                tracing::warn!(%err, backoff = ?self.options.reconnect_backoff, "broker connection lost");
                self.back_off().await;
                return;
            }
        };

        let command = self.topics.command();
        if messages.iter().any(|msg| msg.topic == command) {
            tracing::info!("command received, resynchronising");
            if let Err(err) = self.announce().await {
                tracing::warn!(%err, backoff = ?self.options.reconnect_backoff, "resynchronisation failed");
                self.back_off().await;
            }
        }
    }

    async fn back_off(&mut self) {
        self.state = SessionState::Disconnected;
        tokio::time::sleep(self.options.reconnect_backoff).await;
    }

    /// Discovery, availability, command subscription, then full state.
    #[tracing::instrument(skip(self))]
    async fn announce(&mut self) -> Result<(), NodeError> {
        for message in &self.discovery {
            let body = message.descriptor.to_json().map_err(encode_error)?;
            self.broker
                .publish(&message.topic, body.as_bytes(), true)
                .await?;
            tracing::debug!(topic = %message.topic, "discovery published");
        }

        self.broker
            .publish(
                self.topics.availability(),
                AVAILABILITY_ONLINE.as_bytes(),
                true,
            )
            .await?;
        self.broker.subscribe(self.topics.command()).await?;

        self.publish_climate().await?;
        self.publish_occupancy().await?;
        Ok(())
    }

    fn climate_kinds(&self) -> Vec<ReadingKind> {
        self.capabilities
            .iter()
            .filter(|capability| *capability != Capability::Motion)
            .map(Capability::reading_kind)
            .collect()
    }

    async fn publish_climate_if_changed(&mut self) {
        let mut known = false;
        let mut changed = false;
        for kind in self.climate_kinds() {
            let Some(latest) = self.published.latest(kind) else {
                continue;
            };
            known = true;
            let last = self.published.last_published(kind);
            let decision = self.detector.evaluate(kind, latest, last);
            if decision.is_publish() {
                tracing::debug!(%kind, value = latest, ?decision, "significant change");
                changed = true;
            }
        }

        if !known {
            return;
        }
        if !changed {
            tracing::debug!("no significant climate change, publish suppressed");
            return;
        }
        if let Err(err) = self.publish_climate().await {
            tracing::warn!(%err, topic = %self.topics.state(), "state publish failed");
        }
    }

    /// Publish every known climate value; no-op when nothing was sampled yet.
    async fn publish_climate(&mut self) -> Result<(), NodeError> {
        let temperature = self
            .capabilities
            .temperature
            .then(|| self.published.latest(ReadingKind::Temperature))
            .flatten();
        let humidity = self
            .capabilities
            .humidity
            .then(|| self.published.latest(ReadingKind::Humidity))
            .flatten();
        let state = StatePayload::new(temperature, humidity);
        if state.is_empty() {
            return Ok(());
        }

        let body = state.to_json().map_err(encode_error)?;
        self.broker
            .publish(self.topics.state(), body.as_bytes(), false)
            .await?;
        tracing::info!(payload = %body, "state published");

        if let Some(value) = temperature {
            self.published.mark_published(ReadingKind::Temperature, value);
        }
        if let Some(value) = humidity {
            self.published.mark_published(ReadingKind::Humidity, value);
        }
        Ok(())
    }

    async fn publish_occupancy_if_changed(&mut self) {
        if !self.capabilities.motion {
            return;
        }
        let Some(latest) = self.published.latest(ReadingKind::Occupancy) else {
            return;
        };
        let decision = self.detector.evaluate(
            ReadingKind::Occupancy,
            latest,
            self.published.last_published(ReadingKind::Occupancy),
        );
        if decision == ChangeDecision::Unchanged {
            tracing::trace!("occupancy unchanged, publish suppressed");
            return;
        }
        if let Err(err) = self.publish_occupancy().await {
            tracing::warn!(%err, topic = %self.topics.motion(), "motion publish failed");
        }
    }

    /// Publish the known occupancy state; no-op when unknown or disabled.
    async fn publish_occupancy(&mut self) -> Result<(), NodeError> {
        if !self.capabilities.motion {
            return Ok(());
        }
        let Some(value) = self.published.latest(ReadingKind::Occupancy) else {
            return Ok(());
        };
        let body = payload::motion_payload(value > 0.5);
        self.broker
            .publish(self.topics.motion(), body.as_bytes(), false)
            .await?;
        tracing::info!(payload = body, "motion published");
        self.published.mark_published(ReadingKind::Occupancy, value);
        Ok(())
    }
}

fn encode_error(err: serde_json::Error) -> NodeError {
    NodeError::Transport(Box::new(err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::InboundMessage;
    use crate::test_support::{Call, FakeBroker, LogCapture, identity};

    const STATE: &str = "dhtnode/attic/status";
    const ONLINE: &str = "dhtnode/attic/online";
    const MOTION: &str = "dhtnode/attic/motion";
    const TEMPERATURE_CONFIG: &str = "homeassistant/sensor/attic/temperature/config";
    const HUMIDITY_CONFIG: &str = "homeassistant/sensor/attic/humidity/config";
    const MOTION_CONFIG: &str = "homeassistant/binary_sensor/attic/motion/config";

    fn session_with(capabilities: CapabilitySet) -> SessionManager<FakeBroker> {
        SessionManager::new(
            FakeBroker::default(),
            identity("attic"),
            TopicSet::with_defaults("attic"),
            capabilities,
            ChangeDetector::default(),
            SessionOptions::default(),
        )
    }

    fn session() -> SessionManager<FakeBroker> {
        session_with(CapabilitySet::default())
    }

    async fn connected_session() -> SessionManager<FakeBroker> {
        let mut session = session();
        session.service().await;
        assert_eq!(session.state(), SessionState::Connected);
        session.broker_mut().clear();
        session
    }

    fn climate(temperature: f64, humidity: f64) -> [Reading; 2] {
        [
            Reading::temperature(temperature, 0),
            Reading::humidity(humidity, 0),
        ]
    }

    #[tokio::test]
    async fn should_start_disconnected() {
        assert_eq!(session().state(), SessionState::Disconnected);
    }

    #[tokio::test]
    async fn should_connect_with_device_derived_client_id_and_last_will() {
        let mut session = session();
        session.service().await;

        let Call::Connect(options) = &session.broker().calls[0] else {
            panic!("first call should be connect");
        };
        assert_eq!(options.host, "broker.local");
        assert_eq!(options.port, 1883);
        assert_eq!(options.client_id, "dhtnode-attic");
        assert_eq!(options.last_will.topic, ONLINE);
        assert_eq!(options.last_will.payload, "false");
    }

    #[tokio::test]
    async fn should_announce_discovery_then_availability_then_subscribe() {
        let mut session = session();
        session.service().await;

        let calls = &session.broker().calls[1..];
        for (call, expected) in calls.iter().zip([TEMPERATURE_CONFIG, HUMIDITY_CONFIG]) {
            let Call::Publish { topic, retain, .. } = call else {
                panic!("expected a discovery publish, got {call:?}");
            };
            assert_eq!(topic, expected);
            assert!(*retain);
        }
        assert_eq!(
            calls[2],
            Call::Publish {
                topic: ONLINE.to_string(),
                payload: "true".to_string(),
                retain: true,
            }
        );
        assert_eq!(calls[3], Call::Subscribe("dhtnode/command".to_string()));
        assert_eq!(calls.len(), 4, "no state is published before any reading");
    }

    #[tokio::test]
    async fn should_announce_motion_only_when_enabled() {
        let mut session = session_with(CapabilitySet {
            temperature: true,
            humidity: true,
            motion: true,
        });
        session.service().await;
        let topics: Vec<_> = session
            .broker()
            .publishes()
            .into_iter()
            .map(|(topic, _, _)| topic)
            .collect();
        assert!(topics.contains(&MOTION_CONFIG));

        let mut plain = session_with(CapabilitySet::default());
        plain.service().await;
        assert!(plain.broker().publishes_to(MOTION_CONFIG).is_empty());
    }

    #[tokio::test]
    async fn should_not_publish_invalid_readings() {
        let mut session = connected_session().await;
        session.handle_readings(&climate(f64::NAN, 120.0)).await;

        assert!(session.broker().calls.is_empty());
        assert_eq!(session.published(), &PublishedState::default());
    }

    #[tokio::test]
    async fn should_publish_first_valid_reading_regardless_of_magnitude() {
        let mut session = connected_session().await;
        session.handle_readings(&climate(0.0, 0.0)).await;

        assert_eq!(
            session.broker().publishes_to(STATE),
            vec![r#"{"temperature":"0.00","humidity":"0.00"}"#]
        );
        assert_eq!(
            session.published().last_published(ReadingKind::Temperature),
            Some(0.0)
        );
    }

    #[tokio::test]
    async fn should_suppress_change_equal_to_threshold() {
        let mut session = connected_session().await;
        session.handle_readings(&climate(20.0, 50.0)).await;
        session.handle_readings(&climate(20.2, 50.0)).await;
        assert_eq!(session.broker().publishes_to(STATE).len(), 1);

        session.handle_readings(&climate(20.21, 50.0)).await;
        let states = session.broker().publishes_to(STATE);
        assert_eq!(states.len(), 2);
        assert_eq!(states[1], r#"{"temperature":"20.21","humidity":"50.00"}"#);
    }

    #[tokio::test]
    async fn should_publish_discovery_before_first_state() {
        let mut session = session();
        session.handle_readings(&climate(21.0, 45.0)).await;
        assert!(session.broker().calls.is_empty());

        session.service().await;
        let topics: Vec<_> = session
            .broker()
            .publishes()
            .into_iter()
            .map(|(topic, _, _)| topic)
            .collect();
        let first_state = topics.iter().position(|t| *t == STATE).unwrap();
        let last_discovery = topics
            .iter()
            .rposition(|t| t.starts_with("homeassistant/"))
            .unwrap();
        assert!(last_discovery < first_state);
    }

    #[tokio::test]
    async fn should_publish_state_without_retain() {
        let mut session = connected_session().await;
        session.handle_readings(&climate(21.0, 45.0)).await;
        assert!(
            session
                .broker()
                .publishes()
                .iter()
                .all(|(topic, _, retain)| *topic != STATE || !retain)
        );
    }

    #[tokio::test]
    async fn should_not_mark_published_when_publish_fails() {
        let mut session = connected_session().await;
        session.broker_mut().publish_failures = 1;
        session.handle_readings(&climate(21.0, 45.0)).await;

        assert_eq!(session.broker().failed_publishes, 1);
        assert!(session.broker().publishes_to(STATE).is_empty());
        let published = session.published();
        assert!(!published.has_ever_published(ReadingKind::Temperature));
        assert_eq!(published.latest(ReadingKind::Temperature), Some(21.0));

        session.handle_readings(&climate(21.0, 45.0)).await;
        assert_eq!(
            session.broker().publishes_to(STATE),
            vec![r#"{"temperature":"21.00","humidity":"45.00"}"#]
        );

        session.handle_readings(&climate(21.0, 45.0)).await;
        assert_eq!(session.broker().publishes_to(STATE).len(), 1);
    }

    #[tokio::test]
    async fn should_cache_readings_while_disconnected() {
        let mut session = session();
        session.handle_readings(&climate(19.5, 60.0)).await;
        session.handle_readings(&climate(19.6, 61.0)).await;

        assert!(session.broker().calls.is_empty());
        let published = session.published();
        assert_eq!(published.latest(ReadingKind::Humidity), Some(61.0));
        assert!(!published.has_ever_published(ReadingKind::Humidity));
    }

    #[tokio::test(start_paused = true)]
    async fn should_back_off_once_after_failed_connect() {
        let mut session = session();
        session.broker_mut().connect_failures = 1;

        let started = tokio::time::Instant::now();
        session.service().await;
        assert_eq!(session.state(), SessionState::Disconnected);
        assert_eq!(started.elapsed(), Duration::from_secs(5));

        session.service().await;
        assert_eq!(session.state(), SessionState::Connected);
        let times = &session.broker().connect_times;
        assert_eq!(times[1] - times[0], Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn should_reconnect_after_one_backoff_and_republish_in_order() {
        let mut session = connected_session().await;
        session.handle_readings(&climate(22.5, 40.0)).await;
        session.handle_readings(&climate(22.6, 40.0)).await;
        session.broker_mut().clear();

        session.broker_mut().connected = false;
        let dropped = tokio::time::Instant::now();
        session.service().await;
        assert_eq!(session.state(), SessionState::Disconnected);
        assert!(session.broker().calls.is_empty());

        session.service().await;
        assert_eq!(session.state(), SessionState::Connected);
        let reconnected = *session.broker().connect_times.last().unwrap();
        assert_eq!(reconnected - dropped, Duration::from_secs(5));

        let calls = &session.broker().calls;
        assert!(matches!(calls[0], Call::Connect(_)));
        let topics: Vec<_> = session
            .broker()
            .publishes()
            .into_iter()
            .map(|(topic, _, _)| topic)
            .collect();
        assert_eq!(
            topics,
            vec![TEMPERATURE_CONFIG, HUMIDITY_CONFIG, ONLINE, STATE]
        );
        assert_eq!(
            session.broker().publishes_to(STATE),
            vec![r#"{"temperature":"22.60","humidity":"40.00"}"#]
        );
    }

    #[tokio::test]
    async fn should_resync_on_command_without_change() {
        let mut session = connected_session().await;
        session.handle_readings(&climate(18.0, 55.0)).await;
        session.broker_mut().clear();

        session.broker_mut().inbound.push_back(InboundMessage {
            topic: "dhtnode/command".to_string(),
            payload: b"anything".to_vec(),
        });
        session.service().await;

        let topics: Vec<_> = session
            .broker()
            .publishes()
            .into_iter()
            .map(|(topic, _, _)| topic)
            .collect();
        assert_eq!(
            topics,
            vec![TEMPERATURE_CONFIG, HUMIDITY_CONFIG, ONLINE, STATE]
        );
        assert_eq!(session.state(), SessionState::Connected);
    }

    #[tokio::test]
    async fn should_ignore_messages_on_other_topics() {
        let mut session = connected_session().await;
        session.broker_mut().inbound.push_back(InboundMessage {
            topic: "dhtnode/other/command".to_string(),
            payload: Vec::new(),
        });
        session.service().await;
        assert!(session.broker().calls.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn should_drop_session_when_announcement_fails() {
        let mut session = session();
        session.broker_mut().publish_failures = 1;
        session.service().await;
        assert_eq!(session.state(), SessionState::Disconnected);

        session.service().await;
        assert_eq!(session.state(), SessionState::Connected);
    }

    #[tokio::test]
    async fn should_publish_motion_transitions_only() {
        let mut session = session_with(CapabilitySet {
            temperature: true,
            humidity: true,
            motion: true,
        });
        session.service().await;
        session.broker_mut().clear();

        for occupied in [true, true, false, false, true] {
            session
                .handle_readings(&[Reading::occupancy(occupied, 0)])
                .await;
        }
        assert_eq!(
            session.broker().publishes_to(MOTION),
            vec!["ON", "OFF", "ON"]
        );
    }

    #[tokio::test]
    async fn should_trace_suppressed_occupancy_publish() {
        let logs = LogCapture::default();
        let _guard = logs.install(tracing::Level::TRACE);
        let mut session = session_with(CapabilitySet {
            temperature: true,
            humidity: true,
            motion: true,
        });
        session.service().await;

        for occupied in [true, true, true] {
            session
                .handle_readings(&[Reading::occupancy(occupied, 0)])
                .await;
        }
        assert_eq!(session.broker().publishes_to(MOTION), vec!["ON"]);
        let suppressed = logs.lines_containing("publish suppressed");
        assert_eq!(suppressed.len(), 2);
        assert!(suppressed.iter().all(|line| line.contains("occupancy")));
    }

    #[tokio::test]
    async fn should_include_occupancy_in_full_republish() {
        let mut session = session_with(CapabilitySet {
            temperature: true,
            humidity: true,
            motion: true,
        });
        session
            .handle_readings(&[Reading::occupancy(true, 0)])
            .await;
        session.service().await;
        assert_eq!(session.broker().publishes_to(MOTION), vec!["ON"]);
    }

    #[tokio::test]
    async fn should_leave_out_disabled_climate_channel() {
        let mut session = session_with(CapabilitySet {
            temperature: true,
            humidity: false,
            motion: false,
        });
        session.service().await;
        session.handle_readings(&climate(21.0, 45.0)).await;
        assert_eq!(
            session.broker().publishes_to(STATE),
            vec![r#"{"temperature":"21.00"}"#]
        );
    }
}
