//! Read-only views of dynamic state handed to the pure calculators.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::content::Trigger;
use crate::stats::EntityStats;

/// Lifecycle state of a registered entity.
///
/// `Unregistered` and `Removed` are not represented here: an id in either
/// state has no entity record at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    /// Registered but not yet in combat.
    Inactive,
    /// In combat.
    Active,
    /// Health reached zero.
    Dead,
}

impl Lifecycle {
    /// Whether the entity can still be the subject of mutations.
    #[must_use]
    pub const fn is_operable(self) -> bool {
        matches!(self, Self::Inactive | Self::Active)
    }
}

/// Rolls and figures a timed modifier can adjust.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollKind {
    /// Defender evasion chance.
    Evasion,
    /// Defender dodge chance.
    Dodge,
    /// Defender block chance.
    Block,
    /// Attacker crit chance.
    Crit,
    /// Attacker flat damage bonus.
    FlatDamage,
}

/// Sum of every active modifier per roll kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModifierTotals {
    /// Added to evasion chance.
    pub evasion: f64,
    /// Added to dodge chance.
    pub dodge: f64,
    /// Added to block chance.
    pub block: f64,
    /// Added to crit chance.
    pub crit: f64,
    /// Added to base damage.
    pub flat_damage: f64,
}

impl ModifierTotals {
    /// Adds `value` to the total for `kind`.
    pub fn add(&mut self, kind: RollKind, value: f64) {
        match kind {
            RollKind::Evasion => self.evasion += value,
            RollKind::Dodge => self.dodge += value,
            RollKind::Block => self.block += value,
            RollKind::Crit => self.crit += value,
            RollKind::FlatDamage => self.flat_damage += value,
        }
    }
}

/// Everything the skill resolver may know about one participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatantSnapshot {
    /// Entity identifier.
    pub id: Uuid,
    /// Static stats.
    pub stats: EntityStats,
    /// Active roll modifiers, summed.
    pub modifiers: ModifierTotals,
    /// Procs from equipped items.
    pub item_triggers: Vec<Trigger>,
}

impl CombatantSnapshot {
    /// Snapshot with no modifiers and no item triggers.
    #[must_use]
    pub fn bare(id: Uuid, stats: EntityStats) -> Self {
        Self {
            id,
            stats,
            modifiers: ModifierTotals::default(),
            item_triggers: Vec::new(),
        }
    }
}
