//! Per-entity dynamic state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use skirmish_core::content::EntityTemplate;
use skirmish_core::effect::EffectInstance;
use skirmish_core::snapshot::{CombatantSnapshot, Lifecycle, ModifierTotals, RollKind};
use uuid::Uuid;

use super::modifiers::RollModifier;

/// Whether `apply_effect` inserted a new instance or stacked onto one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectOutcome {
    /// A new instance was inserted.
    Applied,
    /// An instance of the same definition absorbed the stacks.
    Refreshed,
}

/// Result of `apply_effect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectApplication {
    /// Applied or refreshed.
    pub outcome: EffectOutcome,
    /// Stack count after the call.
    pub stacks: u32,
    /// Instance now carrying the effect.
    pub instance_id: Uuid,
}

/// Everything the State Manager tracks for one registered entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityState {
    /// Entity identifier.
    pub id: Uuid,
    /// Registration template.
    pub template: EntityTemplate,
    /// Current lifecycle state.
    pub lifecycle: Lifecycle,
    /// Current health, within `[0, max_health]`.
    pub health: f64,
    /// Current resource, within `[0, max_resource]`.
    pub resource: f64,
    /// Seconds left per skill id.
    pub cooldowns: BTreeMap<String, f64>,
    /// Active modifiers grouped by roll.
    pub modifiers: BTreeMap<RollKind, Vec<RollModifier>>,
    /// Active effects keyed by instance id.
    pub effects: BTreeMap<Uuid, EffectInstance>,
}

impl EntityState {
    /// A freshly registered entity at full health and resource.
    #[must_use]
    pub fn new(id: Uuid, template: EntityTemplate) -> Self {
        let health = template.stats.max_health;
        let resource = template.stats.max_resource;
        Self {
            id,
            template,
            lifecycle: Lifecycle::Inactive,
            health,
            resource,
            cooldowns: BTreeMap::new(),
            modifiers: BTreeMap::new(),
            effects: BTreeMap::new(),
        }
    }

    /// Sum of every active modifier.
    #[must_use]
    pub fn modifier_totals(&self) -> ModifierTotals {
        let mut totals = ModifierTotals::default();
        for modifier in self.modifiers.values().flatten() {
            totals.add(modifier.kind, modifier.value);
        }
        totals
    }

    /// Read-only view for the skill resolver.
    #[must_use]
    pub fn snapshot(&self) -> CombatantSnapshot {
        CombatantSnapshot {
            id: self.id,
            stats: self.template.stats.clone(),
            modifiers: self.modifier_totals(),
            item_triggers: self.template.item_triggers.clone(),
        }
    }

    /// Instance id of the active effect with `definition_id`, if any.
    #[must_use]
    pub fn effect_by_definition(&self, definition_id: &str) -> Option<Uuid> {
        self.effects
            .values()
            .find(|effect| effect.definition_id == definition_id)
            .map(|effect| effect.instance_id)
    }

    /// Drops cooldowns that have reached zero.
    pub fn advance_cooldowns(&mut self, delta: f64) {
        for remaining in self.cooldowns.values_mut() {
            *remaining = (*remaining - delta).max(0.0);
        }
        self.cooldowns.retain(|_, remaining| *remaining > 0.0);
    }

    /// Drops modifiers whose time ran out.
    pub fn advance_modifiers(&mut self, delta: f64) {
        for list in self.modifiers.values_mut() {
            list.retain_mut(|modifier| modifier.advance(delta));
        }
        self.modifiers.retain(|_, list| !list.is_empty());
    }
}
