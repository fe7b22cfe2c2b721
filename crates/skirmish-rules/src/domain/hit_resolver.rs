//! The hit resolver: one hit, nine fixed steps.
//!
//! 1. evasion roll
//! 2. dodge roll (only when evaded): success is a full dodge and stops here,
//!    failure downgrades the hit to a glancing blow
//! 3. crit roll, skipped entirely for glancing blows
//! 4. pre-mitigation damage, times the crit multiplier on any crit
//! 5. armor subtraction
//! 6. pierce: `max(after_armor, pre_mitigation * pierce_ratio)`
//! 7. tier 3 crits multiply again
//! 8. block roll
//! 9. resistance, then the glancing penalty, then the damage floor
//!
//! Steps must not be reordered: replays depend on the exact sequence of
//! RNG draws.

use skirmish_core::config::CombatConfig;
use skirmish_core::hit::{HitContext, PierceBranch};
use skirmish_core::rng::DeterministicRng;
use skirmish_core::snapshot::ModifierTotals;
use skirmish_core::stats::{CritTier, DamageType, EntityStats, clamp_probability};

/// Inputs for one hit.
#[derive(Debug, Clone, Copy)]
pub struct HitInput<'a> {
    /// Attacker stats.
    pub attacker: &'a EntityStats,
    /// Defender stats.
    pub defender: &'a EntityStats,
    /// Attacker roll modifiers (crit, flat damage).
    pub attacker_modifiers: ModifierTotals,
    /// Defender roll modifiers (evasion, dodge, block).
    pub defender_modifiers: ModifierTotals,
    /// Damage family, used for the resistance lookup.
    pub damage_type: DamageType,
    /// Flat damage added by the skill.
    pub flat_bonus: f64,
}

impl<'a> HitInput<'a> {
    /// Physical hit with no modifiers and no flat bonus.
    #[must_use]
    pub fn plain(attacker: &'a EntityStats, defender: &'a EntityStats) -> Self {
        Self {
            attacker,
            defender,
            attacker_modifiers: ModifierTotals::default(),
            defender_modifiers: ModifierTotals::default(),
            damage_type: DamageType::Physical,
            flat_bonus: 0.0,
        }
    }
}

fn roll(rng: &mut dyn DeterministicRng, chance: f64) -> bool {
    rng.uniform() < chance
}

/// Resolves a single hit. Pure: reads its inputs, draws from `rng`, and
/// returns the full record.
pub fn resolve_hit(
    input: &HitInput<'_>,
    config: &CombatConfig,
    rng: &mut dyn DeterministicRng,
) -> HitContext {
    let attacker = input.attacker;
    let defender = input.defender;

    let evasion =
        defender.effective_evasion(input.defender_modifiers.evasion, config.evasion_cap);
    let is_evaded = roll(rng, evasion);

    let mut is_glancing = false;
    if is_evaded {
        let dodge = clamp_probability(defender.dodge_chance + input.defender_modifiers.dodge);
        if roll(rng, dodge) {
            return HitContext::dodged();
        }
        is_glancing = true;
    }

    let crit_tier = if is_glancing {
        None
    } else {
        let crit = clamp_probability(attacker.crit_chance + input.attacker_modifiers.crit);
        roll(rng, crit).then(|| attacker.crit_tier())
    };
    let crit_multiplier = attacker.crit_multiplier.max(0.0);

    let base_damage =
        (attacker.base_damage + input.flat_bonus + input.attacker_modifiers.flat_damage).max(0.0);
    let pre_mitigation = if crit_tier.is_some() {
        base_damage * crit_multiplier
    } else {
        base_damage
    };

    let armor = defender.armor.max(0.0);
    let damage_after_armor = (pre_mitigation - armor).max(0.0);

    let pierce_ratio = clamp_probability(attacker.pierce_ratio);
    let pierce_floor = pre_mitigation * pierce_ratio;
    // A positive floor wins ties.
    let pierce_branch = if pierce_floor > 0.0 && pierce_floor >= damage_after_armor {
        PierceBranch::Pierce
    } else {
        PierceBranch::Armor
    };
    let pierced = damage_after_armor.max(pierce_floor);

    let post_pierce = if crit_tier == Some(CritTier::Tier3) {
        pierced * crit_multiplier
    } else {
        pierced
    };

    let block = clamp_probability(defender.block_chance + input.defender_modifiers.block);
    let is_blocked = roll(rng, block);
    let (block_amount, after_block) = if is_blocked {
        let amount = defender.block_amount.max(0.0);
        (amount, (post_pierce - amount).max(config.block_floor.min(post_pierce)))
    } else {
        (0.0, post_pierce)
    };

    let resistance = defender.resistance(input.damage_type);
    let pre_penalty = after_block * (1.0 - resistance);
    let glancing_multiplier = if is_glancing {
        config.glancing_multiplier
    } else {
        1.0
    };
    let final_damage = (pre_penalty * glancing_multiplier).max(config.min_damage);

    HitContext {
        is_evaded,
        is_dodged: false,
        is_glancing,
        is_crit: crit_tier.is_some(),
        crit_tier,
        crit_multiplier,
        base_damage,
        pre_mitigation,
        armor,
        damage_after_armor,
        pierce_ratio,
        pierce_floor,
        pierce_branch,
        post_pierce,
        is_blocked,
        block_amount,
        after_block,
        resistance,
        pre_penalty,
        glancing_multiplier,
        final_damage,
    }
}
