//! # dhtnode-adapter-storage-json
//!
//! Persists the broker settings as a small JSON document:
//!
//! ```json
//! { "brokerHost": "10.0.0.2", "brokerPort": 1883, "deviceId": "attic" }
//! ```
//!
//! Every save replaces the whole file: the new document is written next to
//! the target and renamed over it, so a power cut leaves either the old or
//! the new object, never a mix.
//!
//! ## Dependency rule
//! Depends on `dhtnode-app` (port traits) and `dhtnode-domain` only.

mod error;

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use dhtnode_app::ports::SettingsRepository;
use dhtnode_domain::error::NodeError;
use dhtnode_domain::settings::Settings;

pub use error::StorageError;

/// [`SettingsRepository`] backed by one JSON file.
#[derive(Debug, Clone)]
pub struct JsonSettingsRepository {
    path: PathBuf,
}

impl JsonSettingsRepository {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn read(&self) -> Result<Option<Settings>, StorageError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn write(&self, settings: &Settings) -> Result<(), StorageError> {
        let content = serde_json::to_string_pretty(settings)?;
        let staging = self.staging_path();
        let mut file = File::create(&staging)?;
        file.write_all(content.as_bytes())?;
        // content must be on disk before the rename makes it visible
        file.sync_all()?;
        drop(file);
        std::fs::rename(&staging, &self.path)?;
        Ok(())
    }
}

impl SettingsRepository for JsonSettingsRepository {
    fn load(&self) -> Result<Option<Settings>, NodeError> {
        Ok(self.read()?)
    }

    #[tracing::instrument(skip(self, settings), fields(path = %self.path.display()))]
    fn save(&self, settings: &Settings) -> Result<(), NodeError> {
        self.write(settings)?;
        tracing::debug!("settings file replaced");
        Ok(())
    }
}
