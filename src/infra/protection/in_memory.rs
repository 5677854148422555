// In-memory settings store.
//
// Backs the pipeline tests and doubles as a throwaway store for local
// runs without a database. Same contract as the SQLite implementation.

use crate::core::protection::{ProtectionSettings, SettingsError, SettingsStore};
use async_trait::async_trait;
use dashmap::DashMap;

#[derive(Default)]
pub struct MemorySettingsStore {
    data: DashMap<u64, ProtectionSettings>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a guild's settings directly (test setup).
    pub fn insert(&self, guild_id: u64, settings: ProtectionSettings) {
        self.data.insert(guild_id, settings);
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get_settings(
        &self,
        guild_id: u64,
    ) -> Result<Option<ProtectionSettings>, SettingsError> {
        Ok(self.data.get(&guild_id).map(|s| s.clone()))
    }

    async fn save_settings(
        &self,
        guild_id: u64,
        settings: ProtectionSettings,
    ) -> Result<(), SettingsError> {
        settings.validate()?;
        self.data.insert(guild_id, settings);
        Ok(())
    }
}
