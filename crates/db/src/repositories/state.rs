use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

use estimo_core::estimator::persistence::{StateStore, StoreError};

use super::RepositoryError;
use crate::DbPool;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredState {
    pub state_key: String,
    pub payload: String,
    pub updated_at: DateTime<Utc>,
}

/// Estimator state persisted in the `estimator_state` table, one row per key.
#[derive(Clone)]
pub struct SqlStateStore {
    pool: DbPool,
}

impl SqlStateStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, state_key: &str) -> Result<Option<StoredState>, RepositoryError> {
        let row = sqlx::query(
            "SELECT state_key, payload, updated_at FROM estimator_state WHERE state_key = ?",
        )
        .bind(state_key)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let updated_at_raw: String = row.try_get("updated_at")?;
        let updated_at = DateTime::parse_from_rfc3339(&updated_at_raw)
            .map_err(|error| {
                RepositoryError::Decode(format!("invalid updated_at `{updated_at_raw}`: {error}"))
            })?
            .with_timezone(&Utc);

        Ok(Some(StoredState {
            state_key: row.try_get("state_key")?,
            payload: row.try_get("payload")?,
            updated_at,
        }))
    }

    pub async fn upsert(&self, state_key: &str, payload: &str) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO estimator_state (state_key, payload, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(state_key) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(state_key)
        .bind(payload)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl StateStore for SqlStateStore {
    async fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.find(key).await?.map(|stored| stored.payload))
    }

    async fn save(&self, key: &str, payload: &str) -> Result<(), StoreError> {
        Ok(self.upsert(key, payload).await?)
    }
}
