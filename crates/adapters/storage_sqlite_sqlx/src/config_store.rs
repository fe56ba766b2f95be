//! `SQLite` implementation of [`ConfigStore`].

use sqlx::SqlitePool;

use irrihub_app::ports::{ConfigKey, ConfigStore};
use irrihub_domain::error::IrrigationError;

use crate::error::StorageError;

const SELECT_BY_KEY: &str = "SELECT value FROM config WHERE key = ?";

const UPSERT: &str = r"
    INSERT INTO config (key, value, updated_at)
    VALUES (?, ?, ?)
    ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
";

/// One JSON document per [`ConfigKey`].
pub struct SqliteConfigStore {
    pool: SqlitePool,
}

impl SqliteConfigStore {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl ConfigStore for SqliteConfigStore {
    async fn load(&self, key: ConfigKey) -> Result<Option<serde_json::Value>, IrrigationError> {
        let row: Option<(String,)> = sqlx::query_as(SELECT_BY_KEY)
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        let Some((value,)) = row else {
            return Ok(None);
        };
        let document = serde_json::from_str(&value).map_err(StorageError::from)?;
        Ok(Some(document))
    }

    async fn save(&self, key: ConfigKey, value: serde_json::Value) -> Result<(), IrrigationError> {
        let value = serde_json::to_string(&value).map_err(StorageError::from)?;

        sqlx::query(UPSERT)
            .bind(key.as_str())
            .bind(value)
            .bind(chrono::Utc::now().timestamp_millis())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(())
    }
}
