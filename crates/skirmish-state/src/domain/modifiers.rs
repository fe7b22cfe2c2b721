//! Timed roll modifiers.

use serde::{Deserialize, Serialize};
use skirmish_core::snapshot::RollKind;

/// A bonus or penalty added to one roll until it runs out or is cleared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollModifier {
    /// Roll adjusted.
    pub kind: RollKind,
    /// Amount added to the chance (or flat damage).
    pub value: f64,
    /// Who placed it; `clear_roll_modifiers` matches on this.
    pub source_tag: String,
    /// Seconds left, or `None` until cleared.
    pub time_remaining: Option<f64>,
}

impl RollModifier {
    /// Advances the timer by `delta`. Returns whether the modifier survives.
    pub fn advance(&mut self, delta: f64) -> bool {
        match self.time_remaining.as_mut() {
            Some(remaining) => {
                *remaining -= delta;
                *remaining > 0.0
            }
            None => true,
        }
    }
}
