//! Dashboard controller — binds the bill to a preset and persists edits.
//!
//! ARCHITECTURE
//! ============
//! `DashboardState` owns local state and produces `SyncCommand`s; this
//! controller applies each transition, executes its command against the
//! `PresetStore`, and reconciles the outcome. Local edits always stick: if
//! the follow-up autosave fails the error is returned for a user notice but
//! nothing is rolled back. A write that landed is reconciled even when the
//! reload after it fails.

pub mod state;
pub mod sync;

use tracing::info;
use uuid::Uuid;

use crate::session::{Session, SessionFile};
use crate::store::{PresetStore, StoreError, ValidationError};
pub use state::{DashboardState, Transition};
pub use sync::{SessionStamp, SyncCommand, SyncError, SyncOutcome};

/// Prompt shown before a preset is deleted.
#[must_use]
pub fn delete_prompt(name: &str) -> String {
    format!("Delete preset \"{name}\"? This cannot be undone.")
}

pub struct Dashboard {
    state: DashboardState,
    store: PresetStore,
    storage: SessionFile,
}

impl Dashboard {
    /// Restore the remembered session from `storage`. Call [`Dashboard::start`]
    /// to fetch its presets.
    #[must_use]
    pub fn new(store: PresetStore, storage: SessionFile) -> Self {
        let session = Session::init(&storage);
        Self { state: DashboardState::new(session), store, storage }
    }

    #[must_use]
    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    /// Load presets for a remembered user, if any.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn start(&mut self) -> Result<(), StoreError> {
        if !self.state.session().signed_in() {
            return Ok(());
        }
        info!(username = %self.state.session().username(), "restored session");
        let command = self.state.reload();
        self.run(command).await
    }

    // -------------------------------------------------------------------------
    // session
    // -------------------------------------------------------------------------

    /// Switch to `username`, discarding unsaved local state, then load that
    /// user's presets.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingUsername`] for a blank name (nothing
    /// changes), otherwise propagates the preset load failure.
    pub async fn sign_in(&mut self, username: &str) -> Result<(), StoreError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ValidationError::MissingUsername.into());
        }
        self.state.reset_local();
        self.state.session_mut().sign_in(&self.storage, username);
        info!(%username, "signed in");
        let command = self.state.reload();
        self.run(command).await
    }

    /// Forget the user and everything local. Nothing is persisted.
    pub fn sign_out(&mut self) {
        let username = self.state.session().username().to_owned();
        self.state.session_mut().teardown(&self.storage);
        self.state.reset_local();
        info!(%username, "signed out");
    }

    // -------------------------------------------------------------------------
    // presets
    // -------------------------------------------------------------------------

    /// Load a fetched preset into the bill. See [`DashboardState::select_preset`].
    pub fn select_preset(&mut self, name: &str) -> bool {
        self.state.select_preset(name)
    }

    pub fn clear_selection(&mut self) {
        self.state.clear_selection();
    }

    pub fn start_new_preset(&mut self) {
        self.state.start_new_preset();
    }

    pub fn set_preset_name(&mut self, text: &str) {
        self.state.set_preset_name(text);
    }

    /// Re-fetch the preset list.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn reload_presets(&mut self) -> Result<(), StoreError> {
        let command = self.state.reload();
        self.run(command).await
    }

    /// Save the bill under the typed name and make it the active preset.
    ///
    /// # Errors
    ///
    /// Returns a validation error before any network call when signed out or
    /// the name is blank, otherwise propagates store failures.
    pub async fn save_preset(&mut self) -> Result<(), StoreError> {
        let command = self.state.save_preset()?;
        if let SyncCommand::Save { name, .. } = &command {
            info!(preset = %name, "saving preset");
        }
        self.run(command).await
    }

    /// Delete the preset `name` once `confirm` approves [`delete_prompt`].
    /// Returns `false` when the user declined; nothing is sent in that case.
    ///
    /// # Errors
    ///
    /// Returns a validation error when signed out or `name` is blank,
    /// otherwise propagates store failures.
    pub async fn delete_preset<F>(&mut self, name: &str, confirm: F) -> Result<bool, StoreError>
    where
        F: FnOnce(&str) -> bool,
    {
        let command = self.state.delete_preset(name)?;
        if !confirm(&delete_prompt(name)) {
            return Ok(false);
        }
        info!(preset = %name, "deleting preset");
        self.run(command).await?;
        Ok(true)
    }

    // -------------------------------------------------------------------------
    // bill edits
    // -------------------------------------------------------------------------

    /// # Errors
    ///
    /// Autosave failure; the person stays added.
    pub async fn add_person(&mut self, name: &str) -> Result<bool, StoreError> {
        let transition = self.state.add_person(name);
        self.apply(transition).await
    }

    /// # Errors
    ///
    /// Autosave failure; the person stays removed.
    pub async fn remove_person(&mut self, id: Uuid) -> Result<bool, StoreError> {
        let transition = self.state.remove_person(id);
        self.apply(transition).await
    }

    /// # Errors
    ///
    /// Autosave failure; the new amount stays.
    pub async fn update_amount(&mut self, id: Uuid, text: &str) -> Result<bool, StoreError> {
        let transition = self.state.update_amount(id, text);
        self.apply(transition).await
    }

    /// # Errors
    ///
    /// Autosave failure; the flag stays flipped.
    pub async fn toggle_paid(&mut self, id: Uuid) -> Result<bool, StoreError> {
        let transition = self.state.toggle_paid(id);
        self.apply(transition).await
    }

    /// # Errors
    ///
    /// Autosave failure; the split stays applied.
    pub async fn split_evenly(&mut self) -> Result<bool, StoreError> {
        let transition = self.state.split_evenly();
        self.apply(transition).await
    }

    /// Edit the tip text, undoing any previous split. Local only. Returns
    /// whether a split was undone.
    pub fn change_tip(&mut self, text: &str) -> bool {
        self.state.change_tip(text)
    }

    // -------------------------------------------------------------------------
    // execution
    // -------------------------------------------------------------------------

    async fn apply(&mut self, transition: Transition) -> Result<bool, StoreError> {
        if let Some(command) = transition.sync {
            self.run(command).await?;
        }
        Ok(transition.changed)
    }

    async fn run(&mut self, command: SyncCommand) -> Result<(), StoreError> {
        match sync::execute(&self.store, command).await {
            Ok(outcome) => {
                self.state.reconcile(outcome);
                Ok(())
            }
            Err(SyncError { written, source }) => {
                if let Some(outcome) = written {
                    self.state.reconcile(outcome);
                }
                Err(source)
            }
        }
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
