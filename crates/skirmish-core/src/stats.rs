//! Static entity stats.
//!
//! `EntityStats` is an immutable template handed over by the data layer.
//! Probabilities are stored raw and clamped when read for a roll, so a
//! template may carry out-of-range values without corrupting resolution.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Damage families a skill can deal; resistances are keyed by these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageType {
    /// Mitigated by armor and physical resistance.
    Physical,
    /// Fire damage.
    Fire,
    /// Cold damage.
    Cold,
    /// Lightning damage.
    Lightning,
    /// Poison / chaos damage.
    Poison,
}

/// Rank of an entity; determines which crit tier it lands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    /// Ordinary entity.
    #[default]
    Normal,
    /// Elite entity.
    Elite,
    /// Boss entity.
    Boss,
}

/// Where the crit multiplier applies in the damage pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CritTier {
    /// Multiplier applied to pre-mitigation damage only.
    Tier2,
    /// Multiplier applied before armor and again after pierce.
    Tier3,
}

impl Rarity {
    /// Crit tier landed by entities of this rarity.
    #[must_use]
    pub const fn crit_tier(self) -> CritTier {
        match self {
            Self::Normal | Self::Elite => CritTier::Tier2,
            Self::Boss => CritTier::Tier3,
        }
    }
}

/// Clamps a probability into `[0, 1]`, mapping NaN to zero.
#[must_use]
pub fn clamp_probability(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Immutable combat stats for one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityStats {
    /// Base damage per hit before bonuses.
    pub base_damage: f64,
    /// Flat damage reduction.
    pub armor: f64,
    /// Fraction of pre-mitigation damage guaranteed through armor.
    pub pierce_ratio: f64,
    /// Chance to land a critical hit.
    pub crit_chance: f64,
    /// Multiplier applied on critical hits.
    pub crit_multiplier: f64,
    /// Chance to evade an incoming hit (capped by configuration).
    pub evasion_chance: f64,
    /// Chance an evaded hit becomes a full dodge.
    pub dodge_chance: f64,
    /// Chance to block an incoming hit.
    pub block_chance: f64,
    /// Flat damage removed by a successful block.
    pub block_amount: f64,
    /// Resistance per damage type, as a fraction of damage removed.
    pub resistances: BTreeMap<DamageType, f64>,
    /// Attacks per second.
    pub attack_speed: f64,
    /// Maximum health.
    pub max_health: f64,
    /// Maximum resource (mana, energy, ...).
    pub max_resource: f64,
    /// Fraction of every cooldown removed.
    pub cooldown_reduction: f64,
    /// Resource gained per landed hit.
    pub resource_on_hit: f64,
    /// Resource gained per kill.
    pub resource_on_kill: f64,
    /// Entity rank.
    pub rarity: Rarity,
}

impl Default for EntityStats {
    fn default() -> Self {
        Self {
            base_damage: 10.0,
            armor: 0.0,
            pierce_ratio: 0.0,
            crit_chance: 0.0,
            crit_multiplier: 1.5,
            evasion_chance: 0.0,
            dodge_chance: 0.0,
            block_chance: 0.0,
            block_amount: 0.0,
            resistances: BTreeMap::new(),
            attack_speed: 1.0,
            max_health: 100.0,
            max_resource: 0.0,
            cooldown_reduction: 0.0,
            resource_on_hit: 0.0,
            resource_on_kill: 0.0,
            rarity: Rarity::Normal,
        }
    }
}

impl EntityStats {
    /// Resistance against `damage_type`, capped at 1.0. Negative values are
    /// vulnerabilities and are kept.
    #[must_use]
    pub fn resistance(&self, damage_type: DamageType) -> f64 {
        self.resistances
            .get(&damage_type)
            .copied()
            .filter(|value| value.is_finite())
            .unwrap_or(0.0)
            .min(1.0)
    }

    /// Evasion chance after a roll modifier, clamped and capped.
    #[must_use]
    pub fn effective_evasion(&self, modifier: f64, cap: f64) -> f64 {
        clamp_probability(self.evasion_chance + modifier).min(clamp_probability(cap))
    }

    /// Crit tier derived from this entity's rarity.
    #[must_use]
    pub fn crit_tier(&self) -> CritTier {
        self.rarity.crit_tier()
    }

    /// Cooldown after applying this entity's cooldown reduction.
    #[must_use]
    pub fn scaled_cooldown(&self, seconds: f64) -> f64 {
        (seconds * (1.0 - clamp_probability(self.cooldown_reduction))).max(0.0)
    }

    /// Seconds between basic attacks. Non-positive attack speed never swings.
    #[must_use]
    pub fn swing_interval(&self) -> Option<f64> {
        (self.attack_speed > 0.0 && self.attack_speed.is_finite()).then(|| 1.0 / self.attack_speed)
    }
}
