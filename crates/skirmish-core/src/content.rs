//! Content definitions consumed from the data layer.
//!
//! These arrive already validated and are never mutated by the kernel.

use serde::{Deserialize, Serialize};

use crate::event::EventKind;
use crate::stats::{DamageType, EntityStats};

fn default_true() -> bool {
    true
}

fn default_one() -> u32 {
    1
}

/// Definition of a timed effect (damage over time, heal over time, buff).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectDefinition {
    /// Definition identifier; instances with the same id stack.
    pub id: String,
    /// Full duration in seconds.
    pub duration: f64,
    /// Seconds between ticks. Non-positive means the effect never ticks.
    #[serde(default)]
    pub tick_interval: f64,
    /// Damage per tick per stack; negative values heal.
    #[serde(default)]
    pub magnitude: f64,
    /// Maximum stack count, if capped.
    #[serde(default)]
    pub max_stacks: Option<u32>,
    /// Whether the effect is removed when its time runs out.
    #[serde(default = "default_true")]
    pub expires_at_zero: bool,
}

/// Which participant of the originating event receives a triggered effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerTarget {
    /// The entity the event happened to (the defender for hit events).
    #[default]
    EventTarget,
    /// The entity that caused the event (the attacker for hit events).
    EventSource,
}

/// A proc: "when `on` happens, with probability `proc_rate`, apply `effect`".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    /// Event kind this trigger listens for.
    pub on: EventKind,
    /// Probability the effect fires when the event occurs.
    pub proc_rate: f64,
    /// Effect applied on a successful proc.
    pub effect: EffectDefinition,
    /// Stacks applied per proc.
    #[serde(default = "default_one")]
    pub stacks: u32,
    /// Overrides the definition's duration when set.
    #[serde(default)]
    pub duration: Option<f64>,
    /// Who receives the effect.
    #[serde(default)]
    pub target: TriggerTarget,
}

/// Definition of a usable skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDefinition {
    /// Skill identifier; cooldowns are keyed by it.
    pub id: String,
    /// Number of hits resolved per use.
    #[serde(default = "default_one")]
    pub hit_count: u32,
    /// Multiplier applied to every hit's final damage.
    #[serde(default = "SkillDefinition::default_multiplier")]
    pub damage_multiplier: f64,
    /// Flat damage added to the attacker's base damage.
    #[serde(default)]
    pub flat_damage: f64,
    /// Base cooldown in seconds, before cooldown reduction.
    #[serde(default)]
    pub cooldown: f64,
    /// Resource spent per use.
    #[serde(default)]
    pub resource_cost: f64,
    /// Damage family of every hit.
    #[serde(default = "SkillDefinition::default_damage_type")]
    pub damage_type: DamageType,
    /// Procs owned by the skill itself.
    #[serde(default)]
    pub triggers: Vec<Trigger>,
}

impl SkillDefinition {
    fn default_multiplier() -> f64 {
        1.0
    }

    fn default_damage_type() -> DamageType {
        DamageType::Physical
    }

    /// A single-hit physical attack with no cost, cooldown, or procs.
    #[must_use]
    pub fn basic_attack(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            hit_count: 1,
            damage_multiplier: 1.0,
            flat_damage: 0.0,
            cooldown: 0.0,
            resource_cost: 0.0,
            damage_type: DamageType::Physical,
            triggers: Vec::new(),
        }
    }
}

/// Everything the kernel needs to register an entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityTemplate {
    /// Static stats.
    pub stats: EntityStats,
    /// Procs attached to the entity's equipped items.
    #[serde(default)]
    pub item_triggers: Vec<Trigger>,
}

impl From<EntityStats> for EntityTemplate {
    fn from(stats: EntityStats) -> Self {
        Self {
            stats,
            item_triggers: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_definition_deserializes_with_defaults() {
        let skill: SkillDefinition = serde_json::from_value(serde_json::json!({
            "id": "cleave",
            "triggers": [{
                "on": "on_hit",
                "proc_rate": 0.25,
                "effect": { "id": "bleed", "duration": 4.0, "tick_interval": 1.0, "magnitude": 3.0 }
            }]
        }))
        .unwrap();

        assert_eq!(skill.hit_count, 1);
        assert!((skill.damage_multiplier - 1.0).abs() < f64::EPSILON);
        assert_eq!(skill.damage_type, DamageType::Physical);
        let trigger = &skill.triggers[0];
        assert_eq!(trigger.on, EventKind::OnHit);
        assert_eq!(trigger.stacks, 1);
        assert_eq!(trigger.target, TriggerTarget::EventTarget);
        assert!(trigger.effect.expires_at_zero);
        assert_eq!(trigger.effect.max_stacks, None);
    }
}
