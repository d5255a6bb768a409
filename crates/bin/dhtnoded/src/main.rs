//! # dhtnoded — sensor node daemon
//!
//! Composition root that wires all adapters together and runs the node.
//!
//! ## Responsibilities
//! - Parse configuration (env vars, config file) and install logging
//! - Load the persisted device settings and run provisioning
//! - Construct the hardware adapters for the configured backend
//! - Construct the MQTT transport and the session manager
//! - Drive the control loop forever
//!
//! A provisioning failure is escalated to a restart: the daemon waits the
//! configured delay and exits with an error so its supervisor starts it
//! again.
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;
mod provisioning;

use std::time::Duration;

use anyhow::Context;
use dhtnode_adapter_mqtt::MqttBroker;
use dhtnode_adapter_storage_json::JsonSettingsRepository;
use dhtnode_adapter_sysfs::{GpioInput, IioClimateSensor, LedIndicator};
use dhtnode_adapter_virtual::{
    LoggingIndicator, SystemClock, VirtualClimateSensor, VirtualOccupancy,
};
use dhtnode_app::node::Node;
use dhtnode_app::ports::{ClimateSensor, Clock, DigitalInput, StatusIndicator};
use dhtnode_app::sampler::{DigitalInputPoller, SensorSampler};
use dhtnode_app::scheduler::Scheduler;
use dhtnode_app::services::config_store::ConfigStore;
use dhtnode_app::services::session::SessionManager;
use dhtnode_domain::change::ChangeDetector;
use dhtnode_domain::settings::DeviceIdentity;
use dhtnode_domain::topics::TopicSet;

use crate::config::{Backend, Config};
use crate::provisioning::{EnvProvisioner, ProvisioningInput};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    init_tracing(&config.logging.filter);

    // Settings
    let store = ConfigStore::new(JsonSettingsRepository::new(&config.settings.path));
    let persisted = store.load();
    let mut provisioner = EnvProvisioner::new(ProvisioningInput::from_env());
    let settings = match store.provision(&mut provisioner, persisted).await {
        Ok(settings) => settings,
        Err(err) => {
            let delay = config.restart_delay();
            tracing::error!(%err, ?delay, "provisioning failed, restarting");
            tokio::time::sleep(delay).await;
            return Err(err).context("provisioning failed");
        }
    };
    let identity = settings
        .into_identity()
        .context("invalid device settings")?;

    // Hardware
    let hardware = &config.hardware;
    match hardware.backend {
        Backend::Virtual => {
            run_node(
                &config,
                identity,
                VirtualClimateSensor::new(hardware.climate),
                VirtualOccupancy::new(hardware.occupancy),
                LoggingIndicator::default(),
            )
            .await;
        }
        Backend::Sysfs => {
            run_node(
                &config,
                identity,
                IioClimateSensor::new(&hardware.sysfs.iio_device),
                GpioInput::new(hardware.sysfs.gpio_value.clone()),
                LedIndicator::new(
                    hardware.sysfs.led_brightness.clone(),
                    Duration::from_millis(hardware.sysfs.led_pulse_ms),
                ),
            )
            .await;
        }
    }

    Ok(())
}

fn init_tracing(filter: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_new(filter)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

async fn run_node<S, I, L>(
    config: &Config,
    identity: DeviceIdentity,
    sensor: S,
    input: I,
    indicator: L,
) where
    S: ClimateSensor,
    I: DigitalInput,
    L: StatusIndicator,
{
    let topics = TopicSet::new(
        &config.mqtt.topic_prefix,
        &config.mqtt.discovery_prefix,
        identity.device_id(),
    );
    tracing::info!(
        device_id = %identity.device_id(),
        broker = %format!("{}:{}", identity.broker_host(), identity.broker_port()),
        backend = ?config.hardware.backend,
        state_topic = %topics.state(),
        "starting node"
    );

    let session = SessionManager::new(
        MqttBroker::new(config.mqtt.transport.clone()),
        identity,
        topics,
        config.capabilities,
        ChangeDetector::new(config.thresholds),
        config.session_options(),
    );
    let clock = SystemClock::default();
    let mut node = Node::new(
        Scheduler::new(config.intervals(), clock.now()),
        SensorSampler::new(sensor, config.schedule.sensor_min_spacing_ms),
        config
            .capabilities
            .motion
            .then(|| DigitalInputPoller::new(input)),
        session,
        indicator,
    );
    node.run(&clock, config.idle()).await;
}
