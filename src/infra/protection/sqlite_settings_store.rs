// SQLite-backed settings store for per-guild protection configuration.
//
// One row per guild; the settings object is stored as a JSON column so a
// schema migration is only needed when the key changes, not when a rule
// category grows a field.

use crate::core::protection::{ProtectionSettings, SettingsError, SettingsStore};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Row, Sqlite};

pub struct SqliteSettingsStore {
    pool: Pool<Sqlite>,
}

impl SqliteSettingsStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Run database migrations to create required tables.
    pub async fn migrate(&self) -> Result<(), SettingsError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS protection_settings (
                guild_id INTEGER PRIMARY KEY,
                settings TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| SettingsError::Storage(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for SqliteSettingsStore {
    async fn get_settings(
        &self,
        guild_id: u64,
    ) -> Result<Option<ProtectionSettings>, SettingsError> {
        let row = sqlx::query("SELECT settings FROM protection_settings WHERE guild_id = ?")
            .bind(guild_id as i64)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| SettingsError::Storage(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let json: String = row.get("settings");
        let settings: ProtectionSettings = serde_json::from_str(&json)
            .map_err(|e| SettingsError::Storage(format!("corrupt settings row: {}", e)))?;
        settings.validate()?;
        Ok(Some(settings))
    }

    async fn save_settings(
        &self,
        guild_id: u64,
        settings: ProtectionSettings,
    ) -> Result<(), SettingsError> {
        settings.validate()?;
        let json = serde_json::to_string(&settings)
            .map_err(|e| SettingsError::Storage(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO protection_settings (guild_id, settings, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(guild_id) DO UPDATE SET
                settings = excluded.settings,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(guild_id as i64)
        .bind(&json)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| SettingsError::Storage(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::protection::RuleAction;

    async fn store() -> (SqliteSettingsStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("protection.db");
        let pool = sqlx::sqlite::SqlitePoolOptions::new()
            .connect(&format!("sqlite://{}?mode=rwc", path.display()))
            .await
            .unwrap();
        let store = SqliteSettingsStore::new(pool);
        store.migrate().await.unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn unknown_guild_returns_none() {
        let (store, _dir) = store().await;
        assert!(store.get_settings(123).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_and_reload_round_trips() {
        let (store, _dir) = store().await;

        let mut settings = ProtectionSettings::default();
        settings.anti_spam.enabled = true;
        settings.anti_spam.max_messages = 7;
        settings.anti_spam.punishment = RuleAction::Kick;
        store.save_settings(42, settings).await.unwrap();

        let loaded = store.get_settings(42).await.unwrap().unwrap();
        assert!(loaded.anti_spam.enabled);
        assert_eq!(loaded.anti_spam.max_messages, 7);
        assert_eq!(loaded.anti_spam.punishment, RuleAction::Kick);
    }

    #[tokio::test]
    async fn last_write_wins() {
        let (store, _dir) = store().await;

        let mut first = ProtectionSettings::default();
        first.anti_spam.enabled = true;
        store.save_settings(42, first).await.unwrap();

        let mut second = ProtectionSettings::default();
        second.anti_spam.enabled = false;
        second.moderation_gate.enabled = true;
        store.save_settings(42, second).await.unwrap();

        let loaded = store.get_settings(42).await.unwrap().unwrap();
        assert!(!loaded.anti_spam.enabled);
        assert!(loaded.moderation_gate.enabled);
    }

    #[tokio::test]
    async fn invalid_settings_are_rejected_on_save() {
        let (store, _dir) = store().await;

        let mut settings = ProtectionSettings::default();
        settings.anti_spam.enabled = true;
        settings.anti_spam.max_messages = 0;
        assert!(store.save_settings(42, settings).await.is_err());
    }
}
