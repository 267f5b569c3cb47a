//! Tip allocator — even redistribution of the tip with undo-on-change.
//!
//! DESIGN
//! ======
//! `tip_text` is the raw editable field; `last_applied_tip` is how much of it
//! is already folded into participant amounts. Editing the tip first backs out
//! the previous split, so amounts always show either "no tip" or "exactly
//! one split of `last_applied_tip`". Only `split_evenly` adds money.
//!
//! Amounts are display text; repeated undo/split cycles can accumulate float
//! drift at the last digit.

use serde::{Deserialize, Serialize};

use crate::ledger::Ledger;
use crate::money::parse_amount;

/// Changes smaller than this are treated as "already applied".
pub const SPLIT_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TipState {
    pub tip_text: String,
    #[serde(skip)]
    pub last_applied_tip: f64,
}

impl Default for TipState {
    fn default() -> Self {
        Self { tip_text: "0".to_owned(), last_applied_tip: 0.0 }
    }
}

impl TipState {
    /// Tip state restored from a snapshot; nothing counts as distributed.
    #[must_use]
    pub fn from_text(tip_text: impl Into<String>) -> Self {
        Self { tip_text: tip_text.into(), last_applied_tip: 0.0 }
    }

    /// Replace the tip text, undoing any previous split first.
    ///
    /// Returns `true` when participant amounts were changed by the undo.
    pub fn on_tip_change(&mut self, ledger: &mut Ledger, new_text: &str) -> bool {
        let undone = self.last_applied_tip != 0.0 && !ledger.is_empty();
        if undone {
            #[allow(clippy::cast_precision_loss)]
            let per_person = self.last_applied_tip / ledger.len() as f64;
            ledger.shift_all(-per_person);
        }
        new_text.clone_into(&mut self.tip_text);
        self.last_applied_tip = 0.0;
        undone
    }

    /// Distribute the not-yet-applied part of the tip evenly.
    ///
    /// Returns `true` when amounts changed. Calling it again with the same
    /// tip text is a no-op.
    pub fn split_evenly(&mut self, ledger: &mut Ledger) -> bool {
        let parsed = self.parsed();
        let delta = parsed - self.last_applied_tip;
        if delta.abs() < SPLIT_EPSILON || ledger.is_empty() {
            return false;
        }
        #[allow(clippy::cast_precision_loss)]
        let per_person = delta / ledger.len() as f64;
        ledger.shift_all(per_person);
        self.last_applied_tip = parsed;
        true
    }

    /// Parsed value of the tip text.
    #[must_use]
    pub fn parsed(&self) -> f64 {
        parse_amount(&self.tip_text)
    }

    /// Participant amounts plus the tip.
    #[must_use]
    pub fn grand_total(&self, ledger: &Ledger) -> f64 {
        ledger.total() + self.parsed()
    }

    /// Back to `"0"` with nothing applied. Does not touch amounts.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
#[path = "tip_test.rs"]
mod tests;
