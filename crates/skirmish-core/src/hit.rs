//! Forensic record of one resolved hit.

use serde::{Deserialize, Serialize};

use crate::stats::CritTier;

/// Which side of the pierce formula produced the pierced damage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PierceBranch {
    /// Armor subtraction left more damage than the pierce floor.
    #[default]
    Armor,
    /// The pierce floor exceeded the armor-subtracted damage.
    Pierce,
}

/// Every intermediate figure of one hit, in pipeline order.
///
/// Produced once by the hit resolver and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HitContext {
    /// The evasion roll succeeded.
    pub is_evaded: bool,
    /// The hit was fully dodged; every damage figure is zero.
    pub is_dodged: bool,
    /// An evaded hit that was not dodged: reduced, never critical.
    pub is_glancing: bool,
    /// The crit roll succeeded.
    pub is_crit: bool,
    /// Tier of the crit, when `is_crit`.
    pub crit_tier: Option<CritTier>,
    /// Attacker's crit multiplier (recorded even without a crit).
    pub crit_multiplier: f64,
    /// Attacker base damage plus flat bonuses.
    pub base_damage: f64,
    /// Damage entering mitigation (after a pre-mitigation crit).
    pub pre_mitigation: f64,
    /// Defender armor used for subtraction.
    pub armor: f64,
    /// `pre_mitigation - armor`.
    pub damage_after_armor: f64,
    /// Attacker pierce ratio, clamped to `[0, 1]`.
    pub pierce_ratio: f64,
    /// `pre_mitigation * pierce_ratio`.
    pub pierce_floor: f64,
    /// Branch of the pierce formula that won.
    pub pierce_branch: PierceBranch,
    /// Damage after pierce and any post-pierce crit.
    pub post_pierce: f64,
    /// The block roll succeeded.
    pub is_blocked: bool,
    /// Flat amount removed by the block (zero when not blocked).
    pub block_amount: f64,
    /// Damage after the block step.
    pub after_block: f64,
    /// Defender resistance to the hit's damage type.
    pub resistance: f64,
    /// Damage after resistance, before the glancing penalty.
    pub pre_penalty: f64,
    /// Glancing factor applied (1.0 for normal hits).
    pub glancing_multiplier: f64,
    /// Final damage, clamped to the configured minimum.
    pub final_damage: f64,
}

impl HitContext {
    /// Record of a full dodge: no damage, nothing further rolled.
    #[must_use]
    pub fn dodged() -> Self {
        Self {
            is_evaded: true,
            is_dodged: true,
            glancing_multiplier: 1.0,
            ..Self::default()
        }
    }

    /// Whether the hit connected (anything but a full dodge).
    #[must_use]
    pub fn landed(&self) -> bool {
        !self.is_dodged
    }
}
