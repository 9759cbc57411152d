//! Process-wide settings (API keys and preferences).

use std::collections::BTreeMap;

use relay_core::Editor;
use tracing::warn;

use super::db::{Database, DatabaseError};

/// Well-known settings keys.
pub struct SettingKey;

impl SettingKey {
    pub const LINEAR_KEY: &'static str = "linear_key";
    pub const OPENROUTER_KEY: &'static str = "openrouter_key";
    pub const DEFAULT_EDITOR: &'static str = "default_editor";
    pub const DEFAULT_TEAM_ID: &'static str = "default_team_id";
}

impl Database {
    /// Read a setting value.
    pub async fn get_setting(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(self.pool())
            .await?;
        Ok(row.map(|(v,)| v))
    }

    /// Insert or overwrite a setting.
    pub async fn set_setting(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO settings (key, value) VALUES (?, ?) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Remove a setting. Returns whether it existed.
    pub async fn delete_setting(&self, key: &str) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM settings WHERE key = ?")
            .bind(key)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Every stored setting, ordered by key.
    pub async fn all_settings(&self) -> Result<BTreeMap<String, String>, DatabaseError> {
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM settings")
            .fetch_all(self.pool())
            .await?;
        Ok(rows.into_iter().collect())
    }

    pub async fn linear_key(&self) -> Result<Option<String>, DatabaseError> {
        self.get_setting(SettingKey::LINEAR_KEY).await
    }

    pub async fn openrouter_key(&self) -> Result<Option<String>, DatabaseError> {
        self.get_setting(SettingKey::OPENROUTER_KEY).await
    }

    pub async fn default_team_id(&self) -> Result<Option<String>, DatabaseError> {
        self.get_setting(SettingKey::DEFAULT_TEAM_ID).await
    }

    /// Stored default editor. Unparseable values are ignored.
    pub async fn default_editor(&self) -> Result<Option<Editor>, DatabaseError> {
        let Some(raw) = self.get_setting(SettingKey::DEFAULT_EDITOR).await? else {
            return Ok(None);
        };
        match raw.parse() {
            Ok(editor) => Ok(Some(editor)),
            Err(e) => {
                warn!(value = %raw, error = %e, "Ignoring unknown default editor");
                Ok(None)
            }
        }
    }

    /// Whether both API keys are stored and non-empty.
    pub async fn has_required_keys(&self) -> Result<bool, DatabaseError> {
        let linear = self.linear_key().await?;
        let openrouter = self.openrouter_key().await?;
        Ok(linear.is_some_and(|k| !k.is_empty()) && openrouter.is_some_and(|k| !k.is_empty()))
    }
}
