//! Intended side effects, produced by resolution and consumed by execution.

use serde::{Deserialize, Serialize};
use skirmish_core::effect::EffectInstance;
use skirmish_core::event::CombatEvent;
use skirmish_core::hit::HitContext;
use uuid::Uuid;

/// One intended mutation or dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Subtract `amount` health from `target`.
    ApplyDamage {
        /// Entity losing health.
        target: Uuid,
        /// Entity credited with the damage.
        source: Option<Uuid>,
        /// Damage after the skill multiplier.
        amount: f64,
        /// Human-readable origin, e.g. `cleave#1`.
        label: String,
    },
    /// Publish `event` on the bus.
    DispatchEvent {
        /// The event to publish.
        event: CombatEvent,
    },
    /// Apply or refresh `effect` on `target`.
    ApplyEffect {
        /// Entity receiving the effect.
        target: Uuid,
        /// Freshly built instance.
        effect: EffectInstance,
    },
    /// Give `target` resource (resource-on-hit).
    RestoreResource {
        /// Entity gaining resource.
        target: Uuid,
        /// Amount restored before clamping.
        amount: f64,
    },
}

impl Action {
    /// Entity this action mutates, if it mutates one.
    #[must_use]
    pub fn target(&self) -> Option<Uuid> {
        match self {
            Self::ApplyDamage { target, .. }
            | Self::ApplyEffect { target, .. }
            | Self::RestoreResource { target, .. } => Some(*target),
            Self::DispatchEvent { .. } => None,
        }
    }
}

/// The sole output of calculation and the sole input to execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillUseResult {
    /// Entity that used the skill.
    pub attacker: Uuid,
    /// Entity the skill targeted.
    pub defender: Uuid,
    /// Skill identifier.
    pub skill_id: String,
    /// One record per resolved hit, in order.
    pub hits: Vec<HitContext>,
    /// Actions to execute, in order.
    pub actions: Vec<Action>,
}

impl SkillUseResult {
    /// Sum of every `ApplyDamage` amount.
    #[must_use]
    pub fn total_damage(&self) -> f64 {
        self.actions
            .iter()
            .map(|action| match action {
                Action::ApplyDamage { amount, .. } => *amount,
                _ => 0.0,
            })
            .sum()
    }

    /// Events this result will dispatch, in order.
    pub fn events(&self) -> impl Iterator<Item = &CombatEvent> {
        self.actions.iter().filter_map(|action| match action {
            Action::DispatchEvent { event } => Some(event),
            _ => None,
        })
    }

    /// Effects this result will apply, in order.
    pub fn effects(&self) -> impl Iterator<Item = (Uuid, &EffectInstance)> {
        self.actions.iter().filter_map(|action| match action {
            Action::ApplyEffect { target, effect } => Some((*target, effect)),
            _ => None,
        })
    }
}
