//! Outbound sync commands and their executor.
//!
//! DESIGN
//! ======
//! Dashboard transitions never touch the network. They return a
//! `SyncCommand` describing the remote work; `execute` runs it against a
//! `PresetStore` (write first, then a full reload so ids and timestamps come
//! from the store) and hands back a `SyncOutcome` for reconciliation.
//!
//! A write that landed is never lost to a failed reload: the `SyncError`
//! still carries the write's outcome (with `presets: None`) so the caller can
//! apply it before reporting the reload failure.
//!
//! Every command carries a `SessionStamp`. Writes always go to the username
//! that produced them; reconciliation drops outcomes whose epoch is stale, so
//! results from a previous session never land in the current one.

use crate::session::Session;
use crate::store::{PresetData, PresetRow, PresetStore, StoreError};

/// Who issued a command, and during which session epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStamp {
    pub username: String,
    pub epoch: u64,
}

impl SessionStamp {
    #[must_use]
    pub fn of(session: &Session) -> Self {
        Self { username: session.username().to_owned(), epoch: session.epoch() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncCommand {
    /// Upsert `data` under `name`, then reload. `activate` makes `name` the
    /// active preset once the write succeeds.
    Save { stamp: SessionStamp, name: String, data: PresetData, activate: bool },
    /// Delete `name`, then reload.
    Delete { stamp: SessionStamp, name: String },
    /// Reload the preset list.
    Reload { stamp: SessionStamp },
}

impl SyncCommand {
    #[must_use]
    pub fn stamp(&self) -> &SessionStamp {
        match self {
            Self::Save { stamp, .. } | Self::Delete { stamp, .. } | Self::Reload { stamp } => stamp,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// `presets` is `None` when the follow-up reload failed.
    Saved { stamp: SessionStamp, row: PresetRow, activate: bool, presets: Option<Vec<PresetRow>> },
    /// `presets` is `None` when the follow-up reload failed.
    Deleted { stamp: SessionStamp, name: String, removed: Vec<PresetRow>, presets: Option<Vec<PresetRow>> },
    Reloaded { stamp: SessionStamp, presets: Vec<PresetRow> },
}

impl SyncOutcome {
    #[must_use]
    pub fn stamp(&self) -> &SessionStamp {
        match self {
            Self::Saved { stamp, .. } | Self::Deleted { stamp, .. } | Self::Reloaded { stamp, .. } => stamp,
        }
    }

    /// The reloaded preset list, if the reload succeeded.
    #[must_use]
    pub fn presets(&self) -> Option<&[PresetRow]> {
        match self {
            Self::Saved { presets, .. } | Self::Deleted { presets, .. } => presets.as_deref(),
            Self::Reloaded { presets, .. } => Some(presets.as_slice()),
        }
    }
}

/// A failed command. `written` holds the outcome of a write that succeeded
/// before the reload failed; it must still be reconciled.
#[derive(Debug, thiserror::Error)]
#[error("{source}")]
pub struct SyncError {
    pub written: Option<SyncOutcome>,
    #[source]
    pub source: StoreError,
}

impl SyncError {
    fn unwritten(source: StoreError) -> Self {
        Self { written: None, source }
    }
}

/// Run `command` against `store`. Nothing is retried.
///
/// # Errors
///
/// Returns the first failing store call. A failed write skips the reload;
/// a failed reload after a successful write keeps the write's outcome in
/// [`SyncError::written`].
pub async fn execute(store: &PresetStore, command: SyncCommand) -> Result<SyncOutcome, SyncError> {
    match command {
        SyncCommand::Save { stamp, name, data, activate } => {
            let row = store.upsert(&stamp.username, &name, &data).await.map_err(SyncError::unwritten)?;
            let username = stamp.username.clone();
            reload_after(store, &username, |presets| SyncOutcome::Saved { stamp, row, activate, presets }).await
        }
        SyncCommand::Delete { stamp, name } => {
            let removed = store.delete(&stamp.username, &name).await.map_err(SyncError::unwritten)?;
            let username = stamp.username.clone();
            reload_after(store, &username, |presets| SyncOutcome::Deleted { stamp, name, removed, presets }).await
        }
        SyncCommand::Reload { stamp } => {
            let presets = store.load_all(&stamp.username).await.map_err(SyncError::unwritten)?;
            Ok(SyncOutcome::Reloaded { stamp, presets })
        }
    }
}

async fn reload_after<F>(store: &PresetStore, username: &str, written: F) -> Result<SyncOutcome, SyncError>
where
    F: FnOnce(Option<Vec<PresetRow>>) -> SyncOutcome,
{
    match store.load_all(username).await {
        Ok(presets) => Ok(written(Some(presets))),
        Err(source) => Err(SyncError { written: Some(written(None)), source }),
    }
}

#[cfg(test)]
#[path = "sync_test.rs"]
mod tests;
