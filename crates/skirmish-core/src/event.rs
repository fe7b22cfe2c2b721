//! Combat events.
//!
//! A closed set of variants: each carries exactly the data its listeners
//! need. Events are immutable once dispatched.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;
use crate::hit::HitContext;

/// Fieldless discriminant of [`CombatEvent`], used for subscriptions and
/// trigger matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A hit connected.
    OnHit,
    /// A hit was critical.
    OnCrit,
    /// A hit was blocked.
    OnBlock,
    /// A hit was fully dodged.
    OnDodge,
    /// A hit was evaded but not dodged.
    OnGlancingBlow,
    /// An entity was registered.
    EntitySpawn,
    /// An entity entered combat.
    EntityActivate,
    /// An entity died.
    EntityDeath,
    /// An entity was removed.
    EntityDespawn,
    /// An effect was applied or refreshed.
    EffectApplied,
    /// An effect ticked.
    EffectTick,
    /// An effect ran out.
    EffectExpired,
    /// A skill was used.
    SkillUsed,
}

impl EventKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 13] = [
        Self::OnHit,
        Self::OnCrit,
        Self::OnBlock,
        Self::OnDodge,
        Self::OnGlancingBlow,
        Self::EntitySpawn,
        Self::EntityActivate,
        Self::EntityDeath,
        Self::EntityDespawn,
        Self::EffectApplied,
        Self::EffectTick,
        Self::EffectExpired,
        Self::SkillUsed,
    ];
}

/// Payload shared by every event describing a connected hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitEvent {
    /// The attacking entity.
    pub attacker: Uuid,
    /// The entity that was hit.
    pub defender: Uuid,
    /// Skill that produced the hit.
    pub skill_id: String,
    /// Zero-based index of the hit within the skill use.
    pub hit_index: u32,
    /// Damage after the skill multiplier.
    pub damage: f64,
    /// Full resolution record.
    pub hit: HitContext,
}

/// Emitted when a hit is fully dodged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DodgeEvent {
    /// The attacking entity.
    pub attacker: Uuid,
    /// The entity that dodged.
    pub defender: Uuid,
    /// Skill that produced the hit.
    pub skill_id: String,
    /// Zero-based index of the hit within the skill use.
    pub hit_index: u32,
}

/// Emitted on spawn, activation, and despawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityEvent {
    /// The entity concerned.
    pub entity_id: Uuid,
}

/// Emitted exactly once when an entity's health reaches zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeathEvent {
    /// The entity that died.
    pub entity_id: Uuid,
    /// Entity credited with the kill, when known.
    pub killer: Option<Uuid>,
    /// Damage beyond what was needed to kill.
    pub overkill: f64,
}

/// Emitted when an effect is applied or refreshed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectAppliedEvent {
    /// Entity carrying the effect.
    pub target: Uuid,
    /// Entity that applied it.
    pub source: Uuid,
    /// Instance identifier.
    pub instance_id: Uuid,
    /// Definition identifier.
    pub definition_id: String,
    /// Stack count after application.
    pub stacks: u32,
    /// Whether an existing instance was refreshed rather than inserted.
    pub refreshed: bool,
}

/// Emitted for every tick of an effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectTickEvent {
    /// Entity carrying the effect.
    pub target: Uuid,
    /// Entity that applied it.
    pub source: Uuid,
    /// Instance identifier.
    pub instance_id: Uuid,
    /// Definition identifier.
    pub definition_id: String,
    /// Health actually lost (negative when healed).
    pub amount: f64,
    /// Stack count at the time of the tick.
    pub stacks: u32,
}

/// Emitted when an effect runs out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectExpiredEvent {
    /// Entity that carried the effect.
    pub target: Uuid,
    /// Entity that applied it.
    pub source: Uuid,
    /// Instance identifier.
    pub instance_id: Uuid,
    /// Definition identifier.
    pub definition_id: String,
}

/// Emitted once per skill use, before its hits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillUsedEvent {
    /// The entity using the skill.
    pub attacker: Uuid,
    /// The skill's target.
    pub defender: Uuid,
    /// Skill identifier.
    pub skill_id: String,
    /// Number of hits the skill resolves.
    pub hit_count: u32,
}

/// Event variants for the combat kernel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum CombatEvent {
    /// A hit connected.
    OnHit(HitEvent),
    /// A hit was critical.
    OnCrit(HitEvent),
    /// A hit was blocked.
    OnBlock(HitEvent),
    /// A hit was fully dodged.
    OnDodge(DodgeEvent),
    /// A hit was evaded but not dodged.
    OnGlancingBlow(HitEvent),
    /// An entity was registered.
    EntitySpawn(EntityEvent),
    /// An entity entered combat.
    EntityActivate(EntityEvent),
    /// An entity died.
    EntityDeath(DeathEvent),
    /// An entity was removed.
    EntityDespawn(EntityEvent),
    /// An effect was applied or refreshed.
    EffectApplied(EffectAppliedEvent),
    /// An effect ticked.
    EffectTick(EffectTickEvent),
    /// An effect ran out.
    EffectExpired(EffectExpiredEvent),
    /// A skill was used.
    SkillUsed(SkillUsedEvent),
}

impl CombatEvent {
    /// Returns the subscription discriminant.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::OnHit(_) => EventKind::OnHit,
            Self::OnCrit(_) => EventKind::OnCrit,
            Self::OnBlock(_) => EventKind::OnBlock,
            Self::OnDodge(_) => EventKind::OnDodge,
            Self::OnGlancingBlow(_) => EventKind::OnGlancingBlow,
            Self::EntitySpawn(_) => EventKind::EntitySpawn,
            Self::EntityActivate(_) => EventKind::EntityActivate,
            Self::EntityDeath(_) => EventKind::EntityDeath,
            Self::EntityDespawn(_) => EventKind::EntityDespawn,
            Self::EffectApplied(_) => EventKind::EffectApplied,
            Self::EffectTick(_) => EventKind::EffectTick,
            Self::EffectExpired(_) => EventKind::EffectExpired,
            Self::SkillUsed(_) => EventKind::SkillUsed,
        }
    }

    /// Returns the event type name (used for logging and payload routing).
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::OnHit(_) => "combat.on_hit",
            Self::OnCrit(_) => "combat.on_crit",
            Self::OnBlock(_) => "combat.on_block",
            Self::OnDodge(_) => "combat.on_dodge",
            Self::OnGlancingBlow(_) => "combat.on_glancing_blow",
            Self::EntitySpawn(_) => "entity.spawn",
            Self::EntityActivate(_) => "entity.activate",
            Self::EntityDeath(_) => "entity.death",
            Self::EntityDespawn(_) => "entity.despawn",
            Self::EffectApplied(_) => "effect.applied",
            Self::EffectTick(_) => "effect.tick",
            Self::EffectExpired(_) => "effect.expired",
            Self::SkillUsed(_) => "skill.used",
        }
    }

    /// Entity that caused the event, if any.
    #[must_use]
    pub fn source(&self) -> Option<Uuid> {
        match self {
            Self::OnHit(e) | Self::OnCrit(e) | Self::OnBlock(e) | Self::OnGlancingBlow(e) => {
                Some(e.attacker)
            }
            Self::OnDodge(e) => Some(e.attacker),
            Self::EntityDeath(e) => e.killer,
            Self::EffectApplied(e) => Some(e.source),
            Self::EffectTick(e) => Some(e.source),
            Self::EffectExpired(e) => Some(e.source),
            Self::SkillUsed(e) => Some(e.attacker),
            Self::EntitySpawn(_) | Self::EntityActivate(_) | Self::EntityDespawn(_) => None,
        }
    }

    /// Entity the event happened to.
    #[must_use]
    pub fn target(&self) -> Option<Uuid> {
        match self {
            Self::OnHit(e) | Self::OnCrit(e) | Self::OnBlock(e) | Self::OnGlancingBlow(e) => {
                Some(e.defender)
            }
            Self::OnDodge(e) => Some(e.defender),
            Self::EntitySpawn(e) | Self::EntityActivate(e) | Self::EntityDespawn(e) => {
                Some(e.entity_id)
            }
            Self::EntityDeath(e) => Some(e.entity_id),
            Self::EffectApplied(e) => Some(e.target),
            Self::EffectTick(e) => Some(e.target),
            Self::EffectExpired(e) => Some(e.target),
            Self::SkillUsed(e) => Some(e.defender),
        }
    }

    /// The hit record carried by hit events.
    #[must_use]
    pub fn hit(&self) -> Option<&HitContext> {
        match self {
            Self::OnHit(e) | Self::OnCrit(e) | Self::OnBlock(e) | Self::OnGlancingBlow(e) => {
                Some(&e.hit)
            }
            _ => None,
        }
    }

    /// Serializes the event to tagged JSON.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if a payload cannot be represented
    /// as JSON.
    pub fn to_payload(&self) -> Result<serde_json::Value, DomainError> {
        serde_json::to_value(self)
            .map_err(|e| DomainError::Validation(format!("event payload: {e}")))
    }
}
