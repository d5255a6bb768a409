//! Config store — boot-time settings load and provisioning write-back.

use dhtnode_domain::error::NodeError;
use dhtnode_domain::settings::Settings;

use crate::ports::{Provisioner, ProvisioningOutcome, SettingsRepository};

/// Loads the persisted broker settings and writes them back after
/// provisioning.
pub struct ConfigStore<R> {
    repo: R,
}

impl<R: SettingsRepository> ConfigStore<R> {
    /// Create a new store backed by the given repository.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Load the settings for this run.
    ///
    /// Never fails: a missing, unreadable or invalid object falls back to
    /// the defaults so the node keeps booting.
    #[tracing::instrument(skip(self))]
    pub fn load(&self) -> Settings {
        let settings = match self.repo.load() {
            Ok(Some(settings)) => settings,
            Ok(None) => {
                tracing::info!("no persisted settings, using defaults");
                return Settings::default();
            }
            Err(err) => {
                tracing::warn!(%err, "persisted settings unreadable, using defaults");
                return Settings::default();
            }
        };

        if let Err(err) = settings.validate() {
            tracing::warn!(%err, "persisted settings invalid, using defaults");
            return Settings::default();
        }
        tracing::info!(
            broker_host = %settings.broker_host,
            broker_port = settings.broker_port,
            device_id = %settings.device_id,
            "settings loaded"
        );
        settings
    }

    /// Persist `settings` as a whole object.
    ///
    /// The stored object is read first and the write is skipped when it
    /// already holds the same values. Returns whether a write happened.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::Validation`] if `settings` is invalid, or a
    /// storage error propagated from the repository.
    #[tracing::instrument(skip(self, settings), fields(device_id = %settings.device_id))]
    pub fn save(&self, settings: &Settings) -> Result<bool, NodeError> {
        settings.validate()?;

        match self.repo.load() {
            Ok(Some(stored)) if stored == *settings => {
                tracing::debug!("persisted settings already up to date");
                return Ok(false);
            }
            Ok(_) => {}
            Err(err) => tracing::debug!(%err, "existing settings unreadable, overwriting"),
        }

        self.repo.save(settings)?;
        tracing::info!("settings saved");
        Ok(true)
    }

    /// Run provisioning and return the settings to use for this run.
    ///
    /// New settings handed back by the provisioner are persisted before
    /// being returned. A storage failure during that write is logged and the
    /// entered settings are still used for this run.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::Provisioning`] when the node cannot join the
    /// network, or [`NodeError::Validation`] when the entered settings are
    /// invalid.
    pub async fn provision<P: Provisioner>(
        &self,
        provisioner: &mut P,
        current: Settings,
    ) -> Result<Settings, NodeError> {
        match provisioner.provision(&current).await? {
            ProvisioningOutcome::Unchanged => Ok(current),
            ProvisioningOutcome::Changed(settings) => match self.save(&settings) {
                Ok(_) => Ok(settings),
                Err(NodeError::Storage(err)) => {
                    tracing::warn!(%err, "entered settings not persisted, using them for this run");
                    Ok(settings)
                }
                Err(err) => Err(err),
            },
        }
    }
}
