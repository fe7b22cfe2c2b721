//! Stat and content fixtures.

use skirmish_core::content::EffectDefinition;
use skirmish_core::stats::EntityStats;
use uuid::Uuid;

/// Deterministic entity id for tests: `Uuid::from_u128(n)`.
#[must_use]
pub fn entity_id(n: u128) -> Uuid {
    Uuid::from_u128(n)
}

/// A combatant with every chance at zero: hits always land, never crit,
/// never get blocked. Damage is exactly `base_damage - armor`.
#[must_use]
pub fn training_stats(base_damage: f64, max_health: f64) -> EntityStats {
    EntityStats {
        base_damage,
        crit_multiplier: 2.0,
        max_health,
        max_resource: 100.0,
        ..EntityStats::default()
    }
}

/// A durable defender with armor and a block, but no avoidance.
#[must_use]
pub fn sturdy_stats(armor: f64, max_health: f64) -> EntityStats {
    EntityStats {
        armor,
        block_amount: 5.0,
        max_health,
        ..EntityStats::default()
    }
}

/// Bleed: 1 s ticks, `magnitude` per stack, capped at five stacks.
#[must_use]
pub fn bleed(magnitude: f64, duration: f64) -> EffectDefinition {
    EffectDefinition {
        id: "bleed".to_owned(),
        duration,
        tick_interval: 1.0,
        magnitude,
        max_stacks: Some(5),
        expires_at_zero: true,
    }
}

/// Poison: 1 s ticks, uncapped stacks.
#[must_use]
pub fn poison(magnitude: f64, duration: f64) -> EffectDefinition {
    EffectDefinition {
        id: "poison".to_owned(),
        duration,
        tick_interval: 1.0,
        magnitude,
        max_stacks: None,
        expires_at_zero: true,
    }
}

/// Regeneration: heals `amount` per second.
#[must_use]
pub fn regen(amount: f64, duration: f64) -> EffectDefinition {
    EffectDefinition {
        id: "regen".to_owned(),
        duration,
        tick_interval: 1.0,
        magnitude: -amount,
        max_stacks: Some(1),
        expires_at_zero: true,
    }
}
