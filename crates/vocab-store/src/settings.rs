//! Settings accessor over the small pool.
//!
//! The [`Settings`] record itself lives in vocab-core; this view reads and
//! writes it at the `settings` key, defaulting when absent or when the pool
//! is unavailable.

use vocab_core::{Settings, SettingsPatch};

use crate::error::StorageError;
use crate::keys;
use crate::traits::{read_or_default, StoragePool};

/// Borrowed view over the small pool exposing settings operations.
pub struct SettingsStore<'a, P: StoragePool> {
    pool: &'a mut P,
}

impl<'a, P: StoragePool> SettingsStore<'a, P> {
    pub fn new(pool: &'a mut P) -> Self {
        SettingsStore { pool }
    }

    /// Current settings, falling back to defaults when absent.
    pub fn load(&self) -> Result<Settings, StorageError> {
        read_or_default(self.pool, keys::SETTINGS)
    }

    /// Overlays `patch` on the current settings and persists the result.
    pub fn update(&mut self, patch: SettingsPatch) -> Result<Settings, StorageError> {
        let mut settings = self.load()?;
        settings.apply(patch);
        self.pool.set_value(keys::SETTINGS, &settings)?;
        Ok(settings)
    }

    /// Writes the default settings record.
    pub fn reset(&mut self) -> Result<Settings, StorageError> {
        let settings = Settings::default();
        self.pool.set_value(keys::SETTINGS, &settings)?;
        Ok(settings)
    }
}
