//! Session — the locally remembered username.
//!
//! SYSTEM CONTEXT
//! ==============
//! There is no authentication: "signed in" means a non-empty username is
//! remembered in a single-value file, read at startup, written on sign-in and
//! removed on sign-out. Each sign-in/sign-out starts a new epoch so work
//! issued under a previous session can be recognized and dropped.

use std::path::{Path, PathBuf};

use tracing::warn;

// =============================================================================
// SESSION
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    username: String,
    epoch: u64,
}

impl Session {
    /// Restore the session remembered in `storage`, if any.
    #[must_use]
    pub fn init(storage: &SessionFile) -> Self {
        Self { username: storage.load().unwrap_or_default(), epoch: 0 }
    }

    /// Switch to `username` (already validated non-empty) and remember it.
    pub fn sign_in(&mut self, storage: &SessionFile, username: &str) {
        username.clone_into(&mut self.username);
        self.epoch += 1;
        storage.save(username);
    }

    /// Forget the username, both in memory and on disk.
    pub fn teardown(&mut self, storage: &SessionFile) {
        self.username.clear();
        self.epoch += 1;
        storage.clear();
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn signed_in(&self) -> bool {
        !self.username.is_empty()
    }

    /// Generation counter bumped on every sign-in and sign-out.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

// =============================================================================
// STORAGE
// =============================================================================

/// Single-key username storage. `None` path keeps everything in memory.
#[derive(Debug, Clone, Default)]
pub struct SessionFile {
    path: Option<PathBuf>,
}

impl SessionFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: Some(path.into()) }
    }

    /// Storage that never touches disk.
    #[must_use]
    pub fn ephemeral() -> Self {
        Self { path: None }
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Read the remembered username. Missing, unreadable or blank -> `None`.
    #[must_use]
    pub fn load(&self) -> Option<String> {
        let path = self.path.as_ref()?;
        let raw = std::fs::read_to_string(path).ok()?;
        let username = raw.trim();
        if username.is_empty() { None } else { Some(username.to_owned()) }
    }

    pub fn save(&self, username: &str) {
        let Some(path) = &self.path else {
            return;
        };
        if let Err(e) = std::fs::write(path, username) {
            warn!(error = %e, path = %path.display(), "failed to remember username");
        }
    }

    pub fn clear(&self) {
        let Some(path) = &self.path else {
            return;
        };
        match std::fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(error = %e, path = %path.display(), "failed to forget username"),
        }
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
