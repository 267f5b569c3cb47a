//! Preset store — named ledger snapshots keyed by (username, preset name).
//!
//! ARCHITECTURE
//! ============
//! `PresetStore` is the adapter the dashboard talks to. It enforces the
//! contract (empty-username short-circuit, required-field validation before
//! any network call, error logging) and delegates row operations to a
//! `PresetBackend`: Postgres, a PostgREST-style HTTP row API, or memory.
//!
//! TRADE-OFFS
//! ==========
//! Upserts are last-write-wins per key. Nothing serializes concurrent writes
//! to the same preset; the next reload is authoritative.

pub mod memory;
pub mod postgres;
pub mod rest;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::error;
use uuid::Uuid;

use crate::config::{BackendKind, Config, ConfigError};
use crate::error::ErrorCode;
use crate::ledger::Participant;
use crate::money::{deserialize_amount_text, zero_amount};

// =============================================================================
// ERRORS
// =============================================================================

/// A required field was empty. Raised before any backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("a username is required")]
    MissingUsername,
    #[error("a preset name is required")]
    MissingPresetName,
}

impl ErrorCode for ValidationError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingUsername => "E_MISSING_USERNAME",
            Self::MissingPresetName => "E_MISSING_PRESET_NAME",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("store request failed: {0}")]
    Request(String),
    #[error("store responded with status {status}")]
    Response { status: u16, body: String },
    #[error("store response parse failed: {0}")]
    Parse(String),
    #[error("store returned no row for preset {0:?}")]
    MissingRow(String),
    #[error("store configuration invalid: {0}")]
    Config(#[from] ConfigError),
}

impl ErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(e) => e.error_code(),
            Self::Database(_) => "E_DATABASE",
            Self::Request(_) => "E_STORE_REQUEST",
            Self::Response { .. } => "E_STORE_RESPONSE",
            Self::Parse(_) => "E_STORE_PARSE",
            Self::MissingRow(_) => "E_STORE_MISSING_ROW",
            Self::Config(_) => "E_STORE_CONFIG",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Response { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// ROWS
// =============================================================================

/// The snapshot stored in a preset's `data` column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetData {
    #[serde(default)]
    pub people: Vec<Participant>,
    #[serde(default = "zero_amount", deserialize_with = "deserialize_amount_text")]
    pub tip: String,
}

impl Default for PresetData {
    fn default() -> Self {
        Self { people: Vec::new(), tip: zero_amount() }
    }
}

/// One stored preset. Mirrors the `presets` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetRow {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub data: PresetData,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

// =============================================================================
// BACKEND SEAM
// =============================================================================

/// Raw row operations. Implementations may assume inputs were validated.
#[async_trait::async_trait]
pub trait PresetBackend: Send + Sync {
    /// All presets for `username`, most recently updated first.
    async fn fetch_all(&self, username: &str) -> Result<Vec<PresetRow>, StoreError>;

    /// Create or overwrite the preset keyed by (`username`, `name`),
    /// refreshing `updated_at`, and return the stored row.
    async fn upsert(&self, username: &str, name: &str, data: &PresetData) -> Result<PresetRow, StoreError>;

    /// Delete matching rows and return them. Nothing matching is not an error.
    async fn delete(&self, username: &str, name: &str) -> Result<Vec<PresetRow>, StoreError>;
}

// =============================================================================
// ADAPTER
// =============================================================================

#[derive(Clone)]
pub struct PresetStore {
    backend: Arc<dyn PresetBackend>,
}

impl PresetStore {
    #[must_use]
    pub fn new(backend: Arc<dyn PresetBackend>) -> Self {
        Self { backend }
    }

    /// Process-local store with no persistence.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(memory::MemoryPresetBackend::new()))
    }

    /// Build the store selected by `config`, connecting and migrating when
    /// the backend is Postgres.
    ///
    /// # Errors
    ///
    /// Returns an error if required settings are missing or the backend
    /// cannot be reached.
    pub async fn from_config(config: &Config) -> Result<Self, StoreError> {
        match config.backend {
            BackendKind::Memory => Ok(Self::in_memory()),
            BackendKind::Postgres => {
                let url = config.database_url.as_deref().ok_or(ConfigError::Missing("DATABASE_URL"))?;
                let pool = crate::db::init_pool(url, config.db_max_connections).await?;
                Ok(Self::new(Arc::new(postgres::PgPresetBackend::new(pool))))
            }
            BackendKind::Rest => {
                let rest = config.rest.as_ref().ok_or(ConfigError::Missing("PRESETS_REST_URL"))?;
                Ok(Self::new(Arc::new(rest::RestPresetBackend::new(rest, config.timeouts)?)))
            }
        }
    }

    /// All presets for `username`, newest first. Empty username -> empty list.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    pub async fn load_all(&self, username: &str) -> Result<Vec<PresetRow>, StoreError> {
        if username.is_empty() {
            return Ok(Vec::new());
        }
        self.backend
            .fetch_all(username)
            .await
            .inspect_err(|e| error!(error = %e, %username, "loading presets failed"))
    }

    /// Create or overwrite the preset `name` for `username`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for an empty username or name, otherwise
    /// propagates backend failures.
    pub async fn upsert(&self, username: &str, name: &str, data: &PresetData) -> Result<PresetRow, StoreError> {
        require_username(username)?;
        if name.is_empty() {
            return Err(ValidationError::MissingPresetName.into());
        }
        self.backend
            .upsert(username, name, data)
            .await
            .inspect_err(|e| error!(error = %e, %username, preset = %name, "saving preset failed"))
    }

    /// Delete the preset `name` for `username`, returning what was removed.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] for an empty username, otherwise
    /// propagates backend failures.
    pub async fn delete(&self, username: &str, name: &str) -> Result<Vec<PresetRow>, StoreError> {
        require_username(username)?;
        self.backend
            .delete(username, name)
            .await
            .inspect_err(|e| error!(error = %e, %username, preset = %name, "deleting preset failed"))
    }
}

fn require_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() { Err(ValidationError::MissingUsername) } else { Ok(()) }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
