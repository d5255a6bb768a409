//! Host provisioning — settings from the environment, network check by
//! resolving the broker.

use dhtnode_app::ports::{Provisioner, ProvisioningOutcome};
use dhtnode_domain::error::{NodeError, ValidationError};
use dhtnode_domain::settings::Settings;

/// Settings entered by the operator; `None` keeps the persisted value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisioningInput {
    pub broker_host: Option<String>,
    pub broker_port: Option<String>,
    pub device_id: Option<String>,
}

impl ProvisioningInput {
    /// Read `DHTNODE_BROKER_HOST`, `DHTNODE_BROKER_PORT` and
    /// `DHTNODE_DEVICE_ID`.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            broker_host: std::env::var("DHTNODE_BROKER_HOST").ok(),
            broker_port: std::env::var("DHTNODE_BROKER_PORT").ok(),
            device_id: std::env::var("DHTNODE_DEVICE_ID").ok(),
        }
    }

    fn apply(&self, current: &Settings) -> Result<Settings, ValidationError> {
        let mut settings = current.clone();
        if let Some(host) = &self.broker_host {
            settings.broker_host.clone_from(host);
        }
        if let Some(port) = &self.broker_port {
            settings.broker_port = port
                .trim()
                .parse()
                .map_err(|_| ValidationError::InvalidBrokerPort(port.clone()))?;
        }
        if let Some(device_id) = &self.device_id {
            settings.device_id.clone_from(device_id);
        }
        settings.validate()?;
        Ok(settings)
    }
}

/// [`Provisioner`] for hosts where the network is managed by the OS.
pub struct EnvProvisioner {
    input: ProvisioningInput,
}

impl EnvProvisioner {
    #[must_use]
    pub fn new(input: ProvisioningInput) -> Self {
        Self { input }
    }
}

impl Provisioner for EnvProvisioner {
    #[tracing::instrument(skip_all)]
    async fn provision(&mut self, current: &Settings) -> Result<ProvisioningOutcome, NodeError> {
        let settings = self.input.apply(current)?;

        let target = (settings.broker_host.as_str(), settings.broker_port);
        let resolved = tokio::net::lookup_host(target)
            .await
            .map_err(|err| NodeError::Provisioning(Box::new(err)))?
            .next();
        let Some(address) = resolved else {
            return Err(NodeError::Provisioning(
                format!("broker host {} has no address", settings.broker_host).into(),
            ));
        };
        tracing::info!(%address, "broker reachable by name");

        if settings == *current {
            Ok(ProvisioningOutcome::Unchanged)
        } else {
            tracing::info!(device_id = %settings.device_id, "new settings entered");
            Ok(ProvisioningOutcome::Changed(settings))
        }
    }
}
