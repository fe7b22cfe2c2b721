//! Read-only queries over the State Manager.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use skirmish_core::effect::EffectInstance;
use skirmish_core::error::DomainError;
use skirmish_core::snapshot::{CombatantSnapshot, Lifecycle};
use skirmish_core::stats::EntityStats;
use uuid::Uuid;

use super::state_manager::StateManager;
use crate::domain::entity::EntityState;
use crate::domain::modifiers::RollModifier;

/// Serialisable view of one entity's dynamic state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityView {
    /// Entity identifier.
    pub id: Uuid,
    /// Lifecycle state.
    pub lifecycle: Lifecycle,
    /// Current health.
    pub health: f64,
    /// Maximum health.
    pub max_health: f64,
    /// Current resource.
    pub resource: f64,
    /// Maximum resource.
    pub max_resource: f64,
    /// Seconds left per skill id.
    pub cooldowns: BTreeMap<String, f64>,
    /// Active roll modifiers, grouped by roll kind.
    pub modifiers: Vec<RollModifier>,
    /// Active effects, by instance id.
    pub effects: Vec<EffectInstance>,
}

impl From<&EntityState> for EntityView {
    fn from(entity: &EntityState) -> Self {
        Self {
            id: entity.id,
            lifecycle: entity.lifecycle,
            health: entity.health,
            max_health: entity.template.stats.max_health,
            resource: entity.resource,
            max_resource: entity.template.stats.max_resource,
            cooldowns: entity.cooldowns.clone(),
            modifiers: entity.modifiers.values().flatten().cloned().collect(),
            effects: entity.effects.values().cloned().collect(),
        }
    }
}

impl StateManager {
    /// Current health.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EntityNotFound` or `DomainError::EntityRemoved`
    /// if the id is not registered.
    pub fn get_current_health(&self, id: Uuid) -> Result<f64, DomainError> {
        Ok(self.entity(id)?.health)
    }

    /// Current resource.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EntityNotFound` or `DomainError::EntityRemoved`
    /// if the id is not registered.
    pub fn get_current_resource(&self, id: Uuid) -> Result<f64, DomainError> {
        Ok(self.entity(id)?.resource)
    }

    /// Lifecycle state.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EntityNotFound` or `DomainError::EntityRemoved`
    /// if the id is not registered.
    pub fn lifecycle(&self, id: Uuid) -> Result<Lifecycle, DomainError> {
        Ok(self.entity(id)?.lifecycle)
    }

    /// Whether `id` is registered and not dead.
    #[must_use]
    pub fn is_alive(&self, id: Uuid) -> bool {
        self.entities
            .get(&id)
            .is_some_and(|entity| entity.lifecycle.is_operable())
    }

    /// Seconds left on `skill_id`'s cooldown; zero when ready.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EntityNotFound` or `DomainError::EntityRemoved`
    /// if the id is not registered.
    pub fn get_cooldown_remaining(&self, id: Uuid, skill_id: &str) -> Result<f64, DomainError> {
        Ok(self
            .entity(id)?
            .cooldowns
            .get(skill_id)
            .copied()
            .unwrap_or(0.0))
    }

    /// Active effects in instance id order.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EntityNotFound` or `DomainError::EntityRemoved`
    /// if the id is not registered.
    pub fn get_active_effects(&self, id: Uuid) -> Result<Vec<EffectInstance>, DomainError> {
        Ok(self.entity(id)?.effects.values().cloned().collect())
    }

    /// Stack count of the active `definition_id` effect, zero if absent.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EntityNotFound` or `DomainError::EntityRemoved`
    /// if the id is not registered.
    pub fn get_effect_stacks(&self, id: Uuid, definition_id: &str) -> Result<u32, DomainError> {
        Ok(self
            .entity(id)?
            .effects
            .values()
            .find(|effect| effect.definition_id == definition_id)
            .map_or(0, |effect| effect.stacks))
    }

    /// Static stats the entity was registered with.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EntityNotFound` or `DomainError::EntityRemoved`
    /// if the id is not registered.
    pub fn stats(&self, id: Uuid) -> Result<&EntityStats, DomainError> {
        Ok(&self.entity(id)?.template.stats)
    }

    /// Snapshot handed to the skill resolver.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EntityNotFound` or `DomainError::EntityRemoved`
    /// if the id is not registered.
    pub fn combatant_snapshot(&self, id: Uuid) -> Result<CombatantSnapshot, DomainError> {
        Ok(self.entity(id)?.snapshot())
    }

    /// Serialisable view of one entity.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EntityNotFound` or `DomainError::EntityRemoved`
    /// if the id is not registered.
    pub fn entity_view(&self, id: Uuid) -> Result<EntityView, DomainError> {
        self.entity(id).map(EntityView::from)
    }

    /// Every registered id, ascending.
    #[must_use]
    pub fn entity_ids(&self) -> Vec<Uuid> {
        self.entities.keys().copied().collect()
    }

    /// SHA-256 over every entity view and tombstone, in id order.
    ///
    /// Two managers driven through the same calls with the same seed have
    /// equal fingerprints.
    #[must_use]
    pub fn fingerprint(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        for entity in self.entities.values() {
            if let Ok(bytes) = serde_json::to_vec(&EntityView::from(entity)) {
                hasher.update(&bytes);
            }
        }
        for id in &self.removed {
            hasher.update(id.as_bytes());
        }
        hasher.finalize().into()
    }
}
