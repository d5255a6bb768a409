//! Storage port — non-volatile settings persistence.

use dhtnode_domain::error::NodeError;
use dhtnode_domain::settings::Settings;

/// Persisted broker settings.
///
/// Implementations write the whole object on every save; there is no
/// partial update.
pub trait SettingsRepository {
    /// Load the persisted settings, `None` when nothing was ever saved.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::Storage`] when the stored object cannot be read
    /// or parsed.
    fn load(&self) -> Result<Option<Settings>, NodeError>;

    /// Replace the persisted settings with `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::Storage`] when the object cannot be written.
    fn save(&self, settings: &Settings) -> Result<(), NodeError>;
}
