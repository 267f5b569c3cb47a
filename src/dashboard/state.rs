//! Dashboard state machine — local transitions plus outbound sync commands.
//!
//! SYSTEM CONTEXT
//! ==============
//! This is the single source of truth for what the user sees: ledger, tip,
//! the loaded preset list, the active preset and the typed preset name.
//! Transitions are synchronous. Ones that should reach the store return a
//! `SyncCommand`; the controller executes it and feeds the outcome back
//! through `reconcile`.

use tracing::{debug, warn};
use uuid::Uuid;

use super::sync::{SessionStamp, SyncCommand, SyncOutcome};
use crate::ledger::Ledger;
use crate::session::Session;
use crate::store::{PresetData, PresetRow, ValidationError};
use crate::tip::TipState;

/// Result of a local transition.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct Transition {
    /// Whether local state changed.
    pub changed: bool,
    /// Remote work to run, if the change should be persisted.
    pub sync: Option<SyncCommand>,
}

impl Transition {
    fn local(changed: bool) -> Self {
        Self { changed, sync: None }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    session: Session,
    ledger: Ledger,
    tip: TipState,
    presets: Vec<PresetRow>,
    selected_preset: Option<String>,
    preset_name: String,
}

impl DashboardState {
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self { session, ..Self::default() }
    }

    // -------------------------------------------------------------------------
    // accessors
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    pub(crate) fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    #[must_use]
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    #[must_use]
    pub fn tip(&self) -> &TipState {
        &self.tip
    }

    #[must_use]
    pub fn presets(&self) -> &[PresetRow] {
        &self.presets
    }

    #[must_use]
    pub fn selected_preset(&self) -> Option<&str> {
        self.selected_preset.as_deref()
    }

    /// The preset name being typed (not yet saved).
    #[must_use]
    pub fn preset_name(&self) -> &str {
        &self.preset_name
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        self.ledger.total()
    }

    #[must_use]
    pub fn grand_total(&self) -> f64 {
        self.tip.grand_total(&self.ledger)
    }

    /// Current ledger and tip as a storable snapshot.
    #[must_use]
    pub fn snapshot(&self) -> PresetData {
        PresetData { people: self.ledger.people().to_vec(), tip: self.tip.tip_text.clone() }
    }

    /// Where live edits are written: the active preset, else the typed name.
    #[must_use]
    pub fn autosave_target(&self) -> Option<&str> {
        if let Some(selected) = self.selected_preset.as_deref() {
            return Some(selected);
        }
        let typed = self.preset_name.trim();
        if typed.is_empty() { None } else { Some(typed) }
    }

    // -------------------------------------------------------------------------
    // ledger and tip edits
    // -------------------------------------------------------------------------

    pub fn add_person(&mut self, name: &str) -> Transition {
        let added = self.ledger.add(name).is_some();
        self.after_edit("add", added)
    }

    pub fn remove_person(&mut self, id: Uuid) -> Transition {
        let removed = self.ledger.remove(id);
        self.after_edit("remove", removed)
    }

    pub fn update_amount(&mut self, id: Uuid, text: &str) -> Transition {
        let updated = self.ledger.update_amount(id, text);
        self.after_edit("update_amount", updated)
    }

    pub fn toggle_paid(&mut self, id: Uuid) -> Transition {
        let toggled = self.ledger.toggle_paid(id);
        self.after_edit("toggle_paid", toggled)
    }

    pub fn split_evenly(&mut self) -> Transition {
        let split = self.tip.split_evenly(&mut self.ledger);
        self.after_edit("split_evenly", split)
    }

    /// Tip edits stay local; they reach the store with the next autosave.
    /// Returns whether a previous split was undone.
    pub fn change_tip(&mut self, text: &str) -> bool {
        let undone = self.tip.on_tip_change(&mut self.ledger, text);
        debug!(tip = %text, undone, "tip changed");
        undone
    }

    pub fn set_preset_name(&mut self, text: &str) {
        text.clone_into(&mut self.preset_name);
    }

    fn after_edit(&self, op: &'static str, changed: bool) -> Transition {
        if !changed {
            return Transition::local(false);
        }
        debug!(op, people = self.ledger.len(), "ledger changed");
        Transition { changed, sync: self.autosave_command() }
    }

    fn autosave_command(&self) -> Option<SyncCommand> {
        if !self.session.signed_in() {
            return None;
        }
        let target = self.autosave_target()?;
        Some(SyncCommand::Save {
            stamp: SessionStamp::of(&self.session),
            name: target.to_owned(),
            data: self.snapshot(),
            activate: false,
        })
    }

    // -------------------------------------------------------------------------
    // presets
    // -------------------------------------------------------------------------

    /// Load the preset `name` from the fetched list, replacing ledger and tip.
    /// An empty or unknown name clears the selection and the ledger instead.
    /// Returns whether a preset was loaded.
    pub fn select_preset(&mut self, name: &str) -> bool {
        let Some(row) = self.presets.iter().find(|p| p.name == name) else {
            self.clear_selection();
            return false;
        };
        self.ledger = Ledger::from_people(row.data.people.clone());
        self.tip = TipState::from_text(row.data.tip.clone());
        self.selected_preset = Some(row.name.clone());
        debug!(preset = %name, people = self.ledger.len(), "preset loaded");
        true
    }

    /// Drop the active preset along with the ledger and tip.
    pub fn clear_selection(&mut self) {
        self.selected_preset = None;
        self.clear_bill();
    }

    /// Fresh, unnamed bill.
    pub fn start_new_preset(&mut self) {
        self.preset_name.clear();
        self.clear_selection();
    }

    /// Save the current bill under the typed name.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when signed out or the name is blank.
    pub fn save_preset(&self) -> Result<SyncCommand, ValidationError> {
        if !self.session.signed_in() {
            return Err(ValidationError::MissingUsername);
        }
        let name = self.preset_name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingPresetName);
        }
        Ok(SyncCommand::Save {
            stamp: SessionStamp::of(&self.session),
            name: name.to_owned(),
            data: self.snapshot(),
            activate: true,
        })
    }

    /// Delete the preset `name`. Confirmation is the caller's job.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when signed out or the name is blank.
    pub fn delete_preset(&self, name: &str) -> Result<SyncCommand, ValidationError> {
        if !self.session.signed_in() {
            return Err(ValidationError::MissingUsername);
        }
        if name.is_empty() {
            return Err(ValidationError::MissingPresetName);
        }
        Ok(SyncCommand::Delete { stamp: SessionStamp::of(&self.session), name: name.to_owned() })
    }

    /// Reload command for the current session.
    pub fn reload(&self) -> SyncCommand {
        SyncCommand::Reload { stamp: SessionStamp::of(&self.session) }
    }

    // -------------------------------------------------------------------------
    // session and reconciliation
    // -------------------------------------------------------------------------

    /// Discard everything local except the session itself.
    pub fn reset_local(&mut self) {
        self.presets.clear();
        self.preset_name.clear();
        self.clear_selection();
    }

    /// Apply a sync outcome. Outcomes from an earlier session epoch are
    /// dropped. A write whose reload failed is patched into the current list.
    /// Returns whether the outcome was applied.
    pub fn reconcile(&mut self, outcome: SyncOutcome) -> bool {
        if outcome.stamp().epoch != self.session.epoch() {
            warn!(
                from = %outcome.stamp().username,
                epoch = outcome.stamp().epoch,
                current = self.session.epoch(),
                "discarding sync result from previous session"
            );
            return false;
        }

        match outcome {
            SyncOutcome::Saved { row, activate, presets, .. } => {
                if activate {
                    self.selected_preset = Some(row.name.clone());
                    self.preset_name.clear();
                }
                match presets {
                    Some(presets) => self.presets = presets,
                    None => self.keep_row(row),
                }
            }
            SyncOutcome::Deleted { name, presets, .. } => {
                if self.selected_preset.as_deref() == Some(name.as_str()) {
                    self.clear_selection();
                }
                match presets {
                    Some(presets) => self.presets = presets,
                    None => self.presets.retain(|p| p.name != name),
                }
            }
            SyncOutcome::Reloaded { presets, .. } => {
                self.presets = presets;
            }
        }
        true
    }

    /// Patch a written row into the list when no reload is available.
    fn keep_row(&mut self, row: PresetRow) {
        self.presets.retain(|p| p.name != row.name);
        self.presets.insert(0, row);
    }

    fn clear_bill(&mut self) {
        self.ledger.clear();
        self.tip.reset();
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
