//! Postgres preset backend.
//!
//! DESIGN
//! ======
//! One row per (username, name) enforced by a unique constraint. Upsert is a
//! single `INSERT ... ON CONFLICT DO UPDATE ... RETURNING`, so the returned
//! row is whatever the database kept, including the original `id`.

use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{PresetBackend, PresetData, PresetRow, StoreError};

type RawRow = (Uuid, String, String, serde_json::Value, OffsetDateTime);

pub struct PgPresetBackend {
    pool: PgPool,
}

impl PgPresetBackend {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_from_raw((id, username, name, data, updated_at): RawRow) -> Result<PresetRow, StoreError> {
    let data: PresetData = serde_json::from_value(data).map_err(|e| StoreError::Parse(e.to_string()))?;
    Ok(PresetRow { id, username, name, data, updated_at })
}

#[async_trait::async_trait]
impl PresetBackend for PgPresetBackend {
    async fn fetch_all(&self, username: &str) -> Result<Vec<PresetRow>, StoreError> {
        let rows = sqlx::query_as::<_, RawRow>(
            "SELECT id, username, name, data, updated_at
             FROM presets
             WHERE username = $1
             ORDER BY updated_at DESC",
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_from_raw).collect()
    }

    async fn upsert(&self, username: &str, name: &str, data: &PresetData) -> Result<PresetRow, StoreError> {
        let payload = serde_json::to_value(data).map_err(|e| StoreError::Parse(e.to_string()))?;

        let row = sqlx::query_as::<_, RawRow>(
            "INSERT INTO presets (id, username, name, data, updated_at)
             VALUES ($1, $2, $3, $4, now())
             ON CONFLICT (username, name)
             DO UPDATE SET data = EXCLUDED.data, updated_at = EXCLUDED.updated_at
             RETURNING id, username, name, data, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(name)
        .bind(&payload)
        .fetch_optional(&self.pool)
        .await?;

        row.map_or_else(|| Err(StoreError::MissingRow(name.to_owned())), row_from_raw)
    }

    async fn delete(&self, username: &str, name: &str) -> Result<Vec<PresetRow>, StoreError> {
        let rows = sqlx::query_as::<_, RawRow>(
            "DELETE FROM presets
             WHERE username = $1 AND name = $2
             RETURNING id, username, name, data, updated_at",
        )
        .bind(username)
        .bind(name)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_from_raw).collect()
    }
}

#[cfg(test)]
#[path = "postgres_test.rs"]
mod tests;
