//! Participant ledger — the ordered list of people splitting the bill.
//!
//! DESIGN
//! ======
//! The ledger is total: invalid input (blank or duplicate names, unknown
//! ids) is absorbed as a no-op rather than an error. Every mutation reports
//! whether it changed anything so the dashboard can skip autosaves for
//! no-op edits.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::money::{deserialize_amount_text, format_amount, parse_amount, zero_amount};

// =============================================================================
// PARTICIPANT
// =============================================================================

/// One person on the bill. Mirrors an entry of a preset's `people` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    /// Stable identifier, generated once. Snapshots written before ids
    /// existed get a fresh one on load.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    /// Decimal text exactly as the user typed it (or as the tip split wrote it).
    #[serde(default = "zero_amount", deserialize_with = "deserialize_amount_text")]
    pub amount: String,
    #[serde(default)]
    pub paid: bool,
}

impl Participant {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { id: Uuid::new_v4(), name: name.into(), amount: zero_amount(), paid: false }
    }

    /// Parsed value of the amount text.
    #[must_use]
    pub fn amount_value(&self) -> f64 {
        parse_amount(&self.amount)
    }
}

// =============================================================================
// LEDGER
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    people: Vec<Participant>,
}

impl Ledger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from stored participants, keeping their order.
    #[must_use]
    pub fn from_people(people: Vec<Participant>) -> Self {
        Self { people }
    }

    /// Append a participant named `name` (trimmed). Returns the new id, or
    /// `None` when the name is blank or already present (exact match).
    pub fn add(&mut self, name: &str) -> Option<Uuid> {
        let trimmed = name.trim();
        if trimmed.is_empty() || self.find_by_name(trimmed).is_some() {
            return None;
        }
        let person = Participant::new(trimmed);
        let id = person.id;
        self.people.push(person);
        Some(id)
    }

    /// Remove the participant with `id`. Returns whether one was removed.
    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.people.len();
        self.people.retain(|p| p.id != id);
        self.people.len() != before
    }

    /// Replace the amount text verbatim. The paid-row guard is the caller's job.
    pub fn update_amount(&mut self, id: Uuid, text: &str) -> bool {
        match self.get_mut(id) {
            Some(person) if person.amount != text => {
                text.clone_into(&mut person.amount);
                true
            }
            _ => false,
        }
    }

    /// Flip the paid flag. Returns whether the participant exists.
    pub fn toggle_paid(&mut self, id: Uuid) -> bool {
        match self.get_mut(id) {
            Some(person) => {
                person.paid = !person.paid;
                true
            }
            None => false,
        }
    }

    /// Add `delta` to every participant's parsed amount, writing back as text.
    pub(crate) fn shift_all(&mut self, delta: f64) {
        for person in &mut self.people {
            person.amount = format_amount(person.amount_value() + delta);
        }
    }

    pub fn clear(&mut self) {
        self.people.clear();
    }

    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<&Participant> {
        self.people.iter().find(|p| p.id == id)
    }

    fn get_mut(&mut self, id: Uuid) -> Option<&mut Participant> {
        self.people.iter_mut().find(|p| p.id == id)
    }

    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&Participant> {
        self.people.iter().find(|p| p.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Participant> {
        self.people.iter()
    }

    #[must_use]
    pub fn people(&self) -> &[Participant] {
        &self.people
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.people.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    /// Sum of all parsed amounts, tip excluded.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.people.iter().map(Participant::amount_value).sum()
    }
}

impl<'a> IntoIterator for &'a Ledger {
    type Item = &'a Participant;
    type IntoIter = std::slice::Iter<'a, Participant>;

    fn into_iter(self) -> Self::IntoIter {
        self.people.iter()
    }
}

#[cfg(test)]
#[path = "ledger_test.rs"]
mod tests;
