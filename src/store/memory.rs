//! In-memory preset backend.
//!
//! Same semantics as the remote backends: unique (username, name), upsert
//! keeps the row id, listing is newest-first. Rows updated within the same
//! clock tick are ordered by write sequence.

use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{PresetBackend, PresetData, PresetRow, StoreError};

struct Entry {
    row: PresetRow,
    seq: u64,
}

#[derive(Default)]
struct Table {
    entries: Vec<Entry>,
    next_seq: u64,
}

#[derive(Default)]
pub struct MemoryPresetBackend {
    table: RwLock<Table>,
}

impl MemoryPresetBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rows across all users.
    pub async fn len(&self) -> usize {
        self.table.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait::async_trait]
impl PresetBackend for MemoryPresetBackend {
    async fn fetch_all(&self, username: &str) -> Result<Vec<PresetRow>, StoreError> {
        let table = self.table.read().await;
        let mut matching: Vec<&Entry> = table.entries.iter().filter(|e| e.row.username == username).collect();
        matching.sort_by(|a, b| {
            b.row
                .updated_at
                .cmp(&a.row.updated_at)
                .then_with(|| b.seq.cmp(&a.seq))
        });
        Ok(matching.into_iter().map(|e| e.row.clone()).collect())
    }

    async fn upsert(&self, username: &str, name: &str, data: &PresetData) -> Result<PresetRow, StoreError> {
        let mut table = self.table.write().await;
        table.next_seq += 1;
        let seq = table.next_seq;
        let now = OffsetDateTime::now_utc();

        if let Some(entry) = table
            .entries
            .iter_mut()
            .find(|e| e.row.username == username && e.row.name == name)
        {
            entry.row.data = data.clone();
            entry.row.updated_at = now;
            entry.seq = seq;
            return Ok(entry.row.clone());
        }

        let row = PresetRow {
            id: Uuid::new_v4(),
            username: username.to_owned(),
            name: name.to_owned(),
            data: data.clone(),
            updated_at: now,
        };
        table.entries.push(Entry { row: row.clone(), seq });
        Ok(row)
    }

    async fn delete(&self, username: &str, name: &str) -> Result<Vec<PresetRow>, StoreError> {
        let mut table = self.table.write().await;
        let (removed, kept): (Vec<Entry>, Vec<Entry>) = std::mem::take(&mut table.entries)
            .into_iter()
            .partition(|e| e.row.username == username && e.row.name == name);
        table.entries = kept;
        Ok(removed.into_iter().map(|e| e.row).collect())
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
