//! In-memory port fakes shared by the unit tests of this crate.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use dhtnode_domain::error::NodeError;
use dhtnode_domain::reading::ClimateSample;
use dhtnode_domain::settings::{DeviceIdentity, Settings};
use tracing_subscriber::fmt::MakeWriter;

use crate::ports::{
    Broker, ClimateSensor, ConnectOptions, DigitalInput, InboundMessage, StatusIndicator,
};

/// One successful interaction with the fake broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Connect(ConnectOptions),
    Publish {
        topic: String,
        payload: String,
        retain: bool,
    },
    Subscribe(String),
}

/// Scripted broker recording every successful call.
#[derive(Debug, Default)]
pub struct FakeBroker {
    pub calls: Vec<Call>,
    pub connect_times: Vec<tokio::time::Instant>,
    /// Number of upcoming connects that fail.
    pub connect_failures: usize,
    /// Number of upcoming publishes that fail.
    pub publish_failures: usize,
    pub failed_publishes: usize,
    pub connected: bool,
    pub inbound: VecDeque<InboundMessage>,
}

impl FakeBroker {
    pub fn publishes(&self) -> Vec<(&str, &str, bool)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Publish {
                    topic,
                    payload,
                    retain,
                } => Some((topic.as_str(), payload.as_str(), *retain)),
                _ => None,
            })
            .collect()
    }

    pub fn publishes_to(&self, topic: &str) -> Vec<&str> {
        self.publishes()
            .into_iter()
            .filter(|(t, _, _)| *t == topic)
            .map(|(_, payload, _)| payload)
            .collect()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl Broker for FakeBroker {
    async fn connect(&mut self, options: &ConnectOptions) -> Result<(), NodeError> {
        self.connect_times.push(tokio::time::Instant::now());
        if self.connect_failures > 0 {
            self.connect_failures -= 1;
            return Err(NodeError::Transport("connection refused".into()));
        }
        self.connected = true;
        self.calls.push(Call::Connect(options.clone()));
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn publish(
        &mut self,
        topic: &str,
        payload: &[u8],
        retain: bool,
    ) -> Result<(), NodeError> {
        if self.publish_failures > 0 {
            self.publish_failures -= 1;
            self.failed_publishes += 1;
            return Err(NodeError::Transport("write failed".into()));
        }
        self.calls.push(Call::Publish {
            topic: topic.to_string(),
            payload: String::from_utf8_lossy(payload).into_owned(),
            retain,
        });
        Ok(())
    }

    async fn subscribe(&mut self, topic: &str) -> Result<(), NodeError> {
        self.calls.push(Call::Subscribe(topic.to_string()));
        Ok(())
    }

    async fn poll(&mut self) -> Result<Vec<InboundMessage>, NodeError> {
        Ok(self.inbound.drain(..).collect())
    }
}

/// Climate sensor replaying a fixed list of samples, then NaN.
#[derive(Debug, Default)]
pub struct FakeSensor {
    pub samples: VecDeque<ClimateSample>,
}

impl FakeSensor {
    pub fn with(samples: &[(f64, f64)]) -> Self {
        Self {
            samples: samples
                .iter()
                .map(|&(temperature, humidity)| ClimateSample {
                    temperature,
                    humidity,
                })
                .collect(),
        }
    }
}

impl ClimateSensor for FakeSensor {
    fn read(&mut self) -> Result<ClimateSample, NodeError> {
        Ok(self
            .samples
            .pop_front()
            .unwrap_or_else(ClimateSample::failed))
    }
}

/// Input line replaying a fixed list of levels, then low.
#[derive(Debug, Default)]
pub struct FakeInput {
    pub levels: VecDeque<bool>,
}

impl DigitalInput for FakeInput {
    fn is_high(&mut self) -> Result<bool, NodeError> {
        Ok(self.levels.pop_front().unwrap_or(false))
    }
}

/// Status LED counting flashes.
#[derive(Debug, Default)]
pub struct FakeIndicator {
    pub flashes: usize,
}

impl StatusIndicator for FakeIndicator {
    async fn flash(&mut self) -> Result<(), NodeError> {
        self.flashes += 1;
        Ok(())
    }
}

pub fn identity(device_id: &str) -> DeviceIdentity {
    Settings {
        broker_host: "broker.local".to_string(),
        broker_port: 1883,
        device_id: device_id.to_string(),
    }
    .into_identity()
    .unwrap()
}

/// Collects the formatted log lines emitted while it is installed.
#[derive(Debug, Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Install as the default subscriber of the current thread.
    pub fn install(&self, level: tracing::Level) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_ansi(false)
            .without_time()
            .with_writer(self.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap();
        let text = String::from_utf8_lossy(&bytes);
        text.lines().map(str::to_string).collect()
    }

    pub fn lines_containing(&self, needle: &str) -> Vec<String> {
        let mut lines = self.lines();
        lines.retain(|line| line.contains(needle));
        lines
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
