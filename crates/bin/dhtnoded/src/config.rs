//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `dhtnode.toml` in the working directory (or the file named by
//! `DHTNODE_CONFIG`). Every field has a sensible default so the file is
//! optional. Environment variables take precedence over file values.
//!
//! Broker address and device id are *not* here: they are persisted device
//! settings, owned by the config store and edited through provisioning.

use std::path::PathBuf;
use std::time::Duration;

use dhtnode_adapter_mqtt::MqttConfig;
use dhtnode_adapter_sysfs::SysfsConfig;
use dhtnode_adapter_virtual::{ClimateProfile, OccupancyPattern};
use dhtnode_app::sampler::DHT22_MIN_SPACING;
use dhtnode_app::scheduler::ScheduleIntervals;
use dhtnode_app::services::session::SessionOptions;
use dhtnode_domain::capability::CapabilitySet;
use dhtnode_domain::change::Thresholds;
use dhtnode_domain::time::Tick;
use dhtnode_domain::topics::{DEFAULT_DISCOVERY_PREFIX, DEFAULT_TOPIC_PREFIX};
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Task cadences.
    pub schedule: ScheduleConfig,
    /// Hysteresis per channel.
    pub thresholds: Thresholds,
    /// Channels exposed by this node.
    pub capabilities: CapabilitySet,
    /// Topic layout and broker session tunables.
    pub mqtt: MqttSection,
    /// Peripheral backend.
    pub hardware: HardwareConfig,
    /// Persisted device settings location.
    pub settings: SettingsConfig,
    /// Provisioning failure handling.
    pub provisioning: ProvisioningConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Task intervals, in milliseconds.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub sensor_interval_ms: Tick,
    pub input_interval_ms: Tick,
    pub network_interval_ms: Tick,
    /// Minimum spacing between two transducer reads.
    pub sensor_min_spacing_ms: Tick,
    /// Pause between two loop iterations.
    pub idle_ms: u64,
}

/// Topic layout and session behaviour.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MqttSection {
    pub topic_prefix: String,
    pub discovery_prefix: String,
    pub keep_alive_secs: u64,
    pub reconnect_backoff_secs: u64,
    /// Transport timeouts, read from the same table.
    #[serde(flatten)]
    pub transport: MqttConfig,
}

/// Which peripherals drive the node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Simulated devices, for development hosts.
    #[default]
    Virtual,
    /// Linux sysfs devices.
    Sysfs,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HardwareConfig {
    pub backend: Backend,
    pub sysfs: SysfsConfig,
    pub climate: ClimateProfile,
    pub occupancy: OccupancyPattern,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SettingsConfig {
    /// JSON file holding broker host, port and device id.
    pub path: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ProvisioningConfig {
    /// Wait before exiting after a provisioning failure.
    pub restart_delay_secs: u64,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `dhtnode.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("DHTNODE_CONFIG").unwrap_or_else(|_| "dhtnode.toml".to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("DHTNODE_BACKEND") {
            match val.as_str() {
                "virtual" => self.hardware.backend = Backend::Virtual,
                "sysfs" => self.hardware.backend = Backend::Sysfs,
                _ => {}
            }
        }
        if let Ok(val) = std::env::var("DHTNODE_MOTION")
            && let Ok(enabled) = val.parse()
        {
            self.capabilities.motion = enabled;
        }
        if let Ok(val) = std::env::var("DHTNODE_TOPIC_PREFIX") {
            self.mqtt.topic_prefix = val;
        }
        if let Ok(val) = std::env::var("DHTNODE_SETTINGS_PATH") {
            self.settings.path = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("DHTNODE_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let schedule = &self.schedule;
        for (name, value) in [
            ("sensor_interval_ms", schedule.sensor_interval_ms),
            ("input_interval_ms", schedule.input_interval_ms),
            ("network_interval_ms", schedule.network_interval_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::Validation(format!("{name} must be non-zero")));
            }
        }
        for (name, value) in [
            ("temperature", self.thresholds.temperature),
            ("humidity", self.thresholds.humidity),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Validation(format!(
                    "{name} threshold must be a non-negative number"
                )));
            }
        }
        if !self.capabilities.has_climate() && !self.capabilities.motion {
            return Err(ConfigError::Validation(
                "at least one capability must be enabled".to_string(),
            ));
        }
        for (name, prefix) in [
            ("topic_prefix", &self.mqtt.topic_prefix),
            ("discovery_prefix", &self.mqtt.discovery_prefix),
        ] {
            if prefix.is_empty() || prefix.contains(['+', '#']) {
                return Err(ConfigError::Validation(format!(
                    "{name} must be a non-empty topic without wildcards"
                )));
            }
        }
        let mqtt = &self.mqtt;
        for (name, value) in [
            ("keep_alive_secs", mqtt.keep_alive_secs),
            ("reconnect_backoff_secs", mqtt.reconnect_backoff_secs),
            ("connect_timeout_secs", mqtt.transport.connect_timeout_secs),
            ("publish_timeout_ms", mqtt.transport.publish_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::Validation(format!("{name} must be non-zero")));
            }
        }
        Ok(())
    }

    /// Scheduler cadences; the input task only exists with the motion
    /// capability.
    #[must_use]
    pub fn intervals(&self) -> ScheduleIntervals {
        ScheduleIntervals {
            network: self.schedule.network_interval_ms,
            input: self
                .capabilities
                .motion
                .then_some(self.schedule.input_interval_ms),
            sensor: self.schedule.sensor_interval_ms,
        }
    }

    #[must_use]
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            client_prefix: self.mqtt.topic_prefix.clone(),
            keep_alive: Duration::from_secs(self.mqtt.keep_alive_secs),
            reconnect_backoff: Duration::from_secs(self.mqtt.reconnect_backoff_secs),
        }
    }

    #[must_use]
    pub fn idle(&self) -> Duration {
        Duration::from_millis(self.schedule.idle_ms)
    }

    #[must_use]
    pub fn restart_delay(&self) -> Duration {
        Duration::from_secs(self.provisioning.restart_delay_secs)
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            sensor_interval_ms: 2000,
            input_interval_ms: 100,
            network_interval_ms: 100,
            sensor_min_spacing_ms: DHT22_MIN_SPACING,
            idle_ms: 10,
        }
    }
}

impl Default for MqttSection {
    fn default() -> Self {
        Self {
            topic_prefix: DEFAULT_TOPIC_PREFIX.to_string(),
            discovery_prefix: DEFAULT_DISCOVERY_PREFIX.to_string(),
            keep_alive_secs: 30,
            reconnect_backoff_secs: 5,
            transport: MqttConfig::default(),
        }
    }
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("dhtnode-settings.json"),
        }
    }
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            restart_delay_secs: 3,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "dhtnoded=info,dhtnode=info,rumqttc=warn".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
