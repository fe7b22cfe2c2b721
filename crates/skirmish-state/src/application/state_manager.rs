//! The State Manager: sole writer of entity dynamic state.
//!
//! Every mutator validates the entity's lifecycle first. Ids that were
//! never registered fail with `EntityNotFound`; ids that were removed fail
//! with `EntityRemoved`. Dead entities reject everything except
//! `apply_damage` (a silent no-op) and `remove_entity`.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use skirmish_core::content::EntityTemplate;
use skirmish_core::effect::EffectInstance;
use skirmish_core::error::DomainError;
use skirmish_core::event::{
    CombatEvent, DeathEvent, EffectAppliedEvent, EffectExpiredEvent, EffectTickEvent, EntityEvent,
};
use skirmish_core::snapshot::Lifecycle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::entity::{EffectApplication, EffectOutcome, EntityState};
use crate::domain::modifiers::RollModifier;

/// Owns every registered entity and the outbox of events they produced.
#[derive(Debug, Default)]
pub struct StateManager {
    pub(crate) entities: BTreeMap<Uuid, EntityState>,
    pub(crate) removed: BTreeSet<Uuid>,
    pending_events: VecDeque<CombatEvent>,
}

impl StateManager {
    /// Creates an empty State Manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn missing(&self, id: Uuid) -> DomainError {
        if self.removed.contains(&id) {
            DomainError::EntityRemoved(id)
        } else {
            DomainError::EntityNotFound(id)
        }
    }

    pub(crate) fn entity(&self, id: Uuid) -> Result<&EntityState, DomainError> {
        self.entities.get(&id).ok_or_else(|| self.missing(id))
    }

    fn entity_mut(&mut self, id: Uuid) -> Result<&mut EntityState, DomainError> {
        match self.entities.get_mut(&id) {
            Some(entity) => Ok(entity),
            None if self.removed.contains(&id) => Err(DomainError::EntityRemoved(id)),
            None => Err(DomainError::EntityNotFound(id)),
        }
    }

    fn operable_mut(
        &mut self,
        id: Uuid,
        operation: &'static str,
    ) -> Result<&mut EntityState, DomainError> {
        let entity = self.entity_mut(id)?;
        if !entity.lifecycle.is_operable() {
            return Err(DomainError::InvalidLifecycle {
                entity_id: id,
                lifecycle: entity.lifecycle,
                operation,
            });
        }
        Ok(entity)
    }

    fn emit(&mut self, event: CombatEvent) {
        debug!(event_type = event.event_type(), "event queued");
        self.pending_events.push_back(event);
    }

    /// Drains every queued event, oldest first.
    pub fn take_pending_events(&mut self) -> Vec<CombatEvent> {
        self.pending_events.drain(..).collect()
    }

    /// Removes and returns the oldest queued event.
    pub fn pop_pending_event(&mut self) -> Option<CombatEvent> {
        self.pending_events.pop_front()
    }

    /// Number of queued events.
    #[must_use]
    pub fn pending_event_count(&self) -> usize {
        self.pending_events.len()
    }

    /// Registers `id` as an inactive entity at full health and resource.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::DuplicateEntity` if `id` is registered,
    /// `DomainError::EntityRemoved` if it was removed earlier, and
    /// `DomainError::Validation` if `max_health` is not positive.
    pub fn add_entity(&mut self, id: Uuid, template: EntityTemplate) -> Result<(), DomainError> {
        if self.entities.contains_key(&id) {
            return Err(DomainError::DuplicateEntity(id));
        }
        if self.removed.contains(&id) {
            return Err(DomainError::EntityRemoved(id));
        }
        let max_health = template.stats.max_health;
        if !(max_health.is_finite() && max_health > 0.0) {
            return Err(DomainError::Validation(format!(
                "max_health must be positive, got {max_health}"
            )));
        }

        self.entities.insert(id, EntityState::new(id, template));
        info!(entity_id = %id, max_health, "entity spawned");
        self.emit(CombatEvent::EntitySpawn(EntityEvent { entity_id: id }));
        Ok(())
    }

    /// Moves an entity from `Inactive` to `Active`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidLifecycle` unless the entity is inactive.
    pub fn activate_entity(&mut self, id: Uuid) -> Result<(), DomainError> {
        let entity = self.entity_mut(id)?;
        if entity.lifecycle != Lifecycle::Inactive {
            return Err(DomainError::InvalidLifecycle {
                entity_id: id,
                lifecycle: entity.lifecycle,
                operation: "activate",
            });
        }
        entity.lifecycle = Lifecycle::Active;
        info!(entity_id = %id, "entity activated");
        self.emit(CombatEvent::EntityActivate(EntityEvent { entity_id: id }));
        Ok(())
    }

    /// Removes an entity in any registered state, with its effects and
    /// modifiers. The id cannot be registered again until `reset_system`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EntityNotFound` or `DomainError::EntityRemoved`
    /// if the id is not registered.
    pub fn remove_entity(&mut self, id: Uuid) -> Result<(), DomainError> {
        let entity = self.entities.remove(&id).ok_or_else(|| self.missing(id))?;
        self.removed.insert(id);
        info!(
            entity_id = %id,
            effects = entity.effects.len(),
            lifecycle = ?entity.lifecycle,
            "entity removed"
        );
        self.emit(CombatEvent::EntityDespawn(EntityEvent { entity_id: id }));
        Ok(())
    }

    /// Forgets every entity, tombstone, and queued event.
    pub fn reset_system(&mut self) {
        info!(entities = self.entities.len(), "state reset");
        self.entities.clear();
        self.removed.clear();
        self.pending_events.clear();
    }

    /// Applies unattributed damage. See [`Self::apply_damage_from`].
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EntityNotFound` or `DomainError::EntityRemoved`
    /// if the id is not registered.
    pub fn apply_damage(&mut self, id: Uuid, amount: f64) -> Result<f64, DomainError> {
        self.apply_damage_from(id, amount, None)
    }

    /// Subtracts `amount` health (negative amounts heal), clamped to
    /// `[0, max_health]`, and returns the health actually lost.
    ///
    /// Reaching zero health kills the entity and queues exactly one
    /// `EntityDeath` crediting `source`. Dead entities lose nothing further
    /// and the call still succeeds.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EntityNotFound` or `DomainError::EntityRemoved`
    /// if the id is not registered.
    pub fn apply_damage_from(
        &mut self,
        id: Uuid,
        amount: f64,
        source: Option<Uuid>,
    ) -> Result<f64, DomainError> {
        let entity = self.entity_mut(id)?;
        if entity.lifecycle == Lifecycle::Dead || amount.is_nan() {
            return Ok(0.0);
        }

        let before = entity.health;
        entity.health = (before - amount)
            .min(entity.template.stats.max_health)
            .max(0.0);
        let lost = before - entity.health;
        let killed = entity.health <= 0.0;
        if killed {
            entity.lifecycle = Lifecycle::Dead;
        }
        debug!(entity_id = %id, amount, lost, health = entity.health, "damage applied");

        if killed {
            let overkill = (amount - lost).max(0.0);
            info!(entity_id = %id, killer = ?source, overkill, "entity died");
            self.emit(CombatEvent::EntityDeath(DeathEvent {
                entity_id: id,
                killer: source,
                overkill,
            }));
        }
        Ok(lost)
    }

    /// Spends `amount` resource if the entity has enough. Returns `false`
    /// without changing anything otherwise.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a negative amount, and a
    /// lookup or lifecycle error if the entity cannot be mutated.
    pub fn spend_resource(&mut self, id: Uuid, amount: f64) -> Result<bool, DomainError> {
        if !(amount.is_finite() && amount >= 0.0) {
            return Err(DomainError::Validation(format!(
                "resource cost must be non-negative, got {amount}"
            )));
        }
        let entity = self.operable_mut(id, "spend resource")?;
        if entity.resource < amount {
            debug!(entity_id = %id, amount, resource = entity.resource, "insufficient resource");
            return Ok(false);
        }
        entity.resource -= amount;
        Ok(true)
    }

    /// Adds resource, clamped to `[0, max_resource]`. Returns the amount
    /// actually gained.
    ///
    /// # Errors
    ///
    /// Returns a lookup or lifecycle error if the entity cannot be mutated.
    pub fn add_resource(&mut self, id: Uuid, amount: f64) -> Result<f64, DomainError> {
        let entity = self.operable_mut(id, "restore resource")?;
        if amount.is_nan() {
            return Ok(0.0);
        }
        let before = entity.resource;
        entity.resource = (before + amount)
            .min(entity.template.stats.max_resource)
            .max(0.0);
        Ok(entity.resource - before)
    }

    /// Puts `skill_id` on cooldown for `seconds`. Non-positive values clear it.
    ///
    /// # Errors
    ///
    /// Returns a lookup or lifecycle error if the entity cannot be mutated.
    pub fn set_cooldown(
        &mut self,
        id: Uuid,
        skill_id: &str,
        seconds: f64,
    ) -> Result<(), DomainError> {
        let entity = self.operable_mut(id, "set cooldown")?;
        if seconds > 0.0 {
            entity.cooldowns.insert(skill_id.to_owned(), seconds);
        } else {
            entity.cooldowns.remove(skill_id);
        }
        Ok(())
    }

    /// Adds a roll modifier.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a non-finite value, and a
    /// lookup or lifecycle error if the entity cannot be mutated.
    pub fn add_roll_modifier(&mut self, id: Uuid, modifier: RollModifier) -> Result<(), DomainError> {
        if !modifier.value.is_finite() {
            return Err(DomainError::Validation(format!(
                "modifier value must be finite, got {}",
                modifier.value
            )));
        }
        let entity = self.operable_mut(id, "add roll modifier")?;
        debug!(
            entity_id = %id,
            kind = ?modifier.kind,
            value = modifier.value,
            source_tag = %modifier.source_tag,
            "roll modifier added"
        );
        entity.modifiers.entry(modifier.kind).or_default().push(modifier);
        Ok(())
    }

    /// Removes every modifier placed under `source_tag`. Returns how many.
    ///
    /// # Errors
    ///
    /// Returns a lookup or lifecycle error if the entity cannot be mutated.
    pub fn clear_roll_modifiers(&mut self, id: Uuid, source_tag: &str) -> Result<usize, DomainError> {
        let entity = self.operable_mut(id, "clear roll modifiers")?;
        let mut cleared = 0;
        for list in entity.modifiers.values_mut() {
            let before = list.len();
            list.retain(|modifier| modifier.source_tag != source_tag);
            cleared += before - list.len();
        }
        entity.modifiers.retain(|_, list| !list.is_empty());
        Ok(cleared)
    }

    /// Applies `effect`, or stacks it onto the active instance with the same
    /// definition id (stacks capped, duration restored). Queues
    /// `EffectApplied` either way.
    ///
    /// # Errors
    ///
    /// Returns a lookup or lifecycle error if the entity cannot be mutated.
    pub fn apply_effect(
        &mut self,
        id: Uuid,
        effect: EffectInstance,
    ) -> Result<EffectApplication, DomainError> {
        let entity = self.operable_mut(id, "apply effect")?;

        let existing = entity
            .effects
            .values_mut()
            .find(|active| active.definition_id == effect.definition_id);
        let application = if let Some(active) = existing {
            active.duration = effect.duration;
            let stacks = active.refresh(effect.stacks);
            EffectApplication {
                outcome: EffectOutcome::Refreshed,
                stacks,
                instance_id: active.instance_id,
            }
        } else {
            let application = EffectApplication {
                outcome: EffectOutcome::Applied,
                stacks: effect.stacks,
                instance_id: effect.instance_id,
            };
            entity.effects.insert(effect.instance_id, effect.clone());
            application
        };

        debug!(
            entity_id = %id,
            effect = %effect.definition_id,
            outcome = ?application.outcome,
            stacks = application.stacks,
            "effect applied"
        );
        self.emit(CombatEvent::EffectApplied(EffectAppliedEvent {
            target: id,
            source: effect.source,
            instance_id: application.instance_id,
            definition_id: effect.definition_id,
            stacks: application.stacks,
            refreshed: application.outcome == EffectOutcome::Refreshed,
        }));
        Ok(application)
    }

    /// Removes one effect instance without expiring it. Returns whether it
    /// was active.
    ///
    /// # Errors
    ///
    /// Returns a lookup or lifecycle error if the entity cannot be mutated.
    pub fn remove_effect(&mut self, id: Uuid, instance_id: Uuid) -> Result<bool, DomainError> {
        let entity = self.operable_mut(id, "remove effect")?;
        Ok(entity.effects.remove(&instance_id).is_some())
    }

    /// Advances simulated time by `delta` seconds.
    ///
    /// All cooldowns and roll modifiers are advanced first, then effects,
    /// entity by entity in id order. Per effect: decrement, tick loop, expiry
    /// check. Dead entities are skipped, and an entity killed by its own
    /// effects stops ticking immediately.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `delta` is negative or not finite.
    pub fn update(&mut self, delta: f64) -> Result<(), DomainError> {
        if !(delta.is_finite() && delta >= 0.0) {
            return Err(DomainError::Validation(format!(
                "time step must be non-negative, got {delta}"
            )));
        }

        for entity in self
            .entities
            .values_mut()
            .filter(|entity| entity.lifecycle != Lifecycle::Dead)
        {
            entity.advance_cooldowns(delta);
            entity.advance_modifiers(delta);
        }

        let living: Vec<Uuid> = self
            .entities
            .values()
            .filter(|entity| entity.lifecycle != Lifecycle::Dead)
            .map(|entity| entity.id)
            .collect();
        for id in living {
            self.advance_effects(id, delta)?;
        }
        Ok(())
    }

    fn advance_effects(&mut self, id: Uuid, delta: f64) -> Result<(), DomainError> {
        let instance_ids: Vec<Uuid> = self.entity(id)?.effects.keys().copied().collect();

        for instance_id in instance_ids {
            if !self.is_alive(id) {
                break;
            }
            let Some(effect) = self
                .entities
                .get_mut(&id)
                .and_then(|entity| entity.effects.get_mut(&instance_id))
            else {
                continue;
            };

            let fired = effect.advance(delta);
            let amount = effect.tick_amount();
            let source = effect.source;
            let definition_id = effect.definition_id.clone();
            let stacks = effect.stacks;
            let expired = effect.is_expired();

            for _ in 0..fired {
                if !self.is_alive(id) {
                    break;
                }
                self.apply_damage_from(id, amount, Some(source))?;
                self.emit(CombatEvent::EffectTick(EffectTickEvent {
                    target: id,
                    source,
                    instance_id,
                    definition_id: definition_id.clone(),
                    amount,
                    stacks,
                }));
            }

            if expired && self.is_alive(id) {
                if let Some(entity) = self.entities.get_mut(&id) {
                    entity.effects.remove(&instance_id);
                }
                debug!(entity_id = %id, effect = %definition_id, "effect expired");
                self.emit(CombatEvent::EffectExpired(EffectExpiredEvent {
                    target: id,
                    source,
                    instance_id,
                    definition_id,
                }));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_core::event::EventKind;
    use skirmish_core::rng::SeededRng;
    use skirmish_core::snapshot::RollKind;
    use skirmish_test_support::{bleed, entity_id, poison, regen, training_stats};

    fn manager_with(ids: &[u128], max_health: f64) -> StateManager {
        let mut state = StateManager::new();
        for &n in ids {
            state
                .add_entity(entity_id(n), training_stats(10.0, max_health).into())
                .unwrap();
            state.activate_entity(entity_id(n)).unwrap();
        }
        state.take_pending_events();
        state
    }

    fn instance(definition: &skirmish_core::content::EffectDefinition, seed: u64) -> EffectInstance {
        EffectInstance::from_definition(definition, entity_id(99), 1, None, &mut SeededRng::new(seed))
    }

    fn kinds(events: &[CombatEvent]) -> Vec<EventKind> {
        events.iter().map(CombatEvent::kind).collect()
    }

    #[test]
    fn test_add_and_activate_emit_lifecycle_events() {
        // Arrange
        let mut state = StateManager::new();
        let id = entity_id(1);

        // Act
        state.add_entity(id, training_stats(10.0, 50.0).into()).unwrap();
        state.activate_entity(id).unwrap();

        // Assert
        assert_eq!(
            kinds(&state.take_pending_events()),
            vec![EventKind::EntitySpawn, EventKind::EntityActivate]
        );
        assert_eq!(state.lifecycle(id).unwrap(), Lifecycle::Active);
    }

    #[test]
    fn test_add_entity_rejects_duplicate_id() {
        let mut state = manager_with(&[1], 50.0);

        let result = state.add_entity(entity_id(1), training_stats(1.0, 1.0).into());

        assert_eq!(result, Err(DomainError::DuplicateEntity(entity_id(1))));
    }

    #[test]
    fn test_add_entity_rejects_non_positive_max_health() {
        let mut state = StateManager::new();

        let result = state.add_entity(entity_id(1), training_stats(1.0, 0.0).into());

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_activate_twice_is_invalid_lifecycle() {
        let mut state = manager_with(&[1], 50.0);

        let result = state.activate_entity(entity_id(1));

        assert!(matches!(
            result,
            Err(DomainError::InvalidLifecycle {
                lifecycle: Lifecycle::Active,
                operation: "activate",
                ..
            })
        ));
    }

    #[test]
    fn test_unregistered_and_removed_ids_fail_distinguishably() {
        // Arrange
        let mut state = manager_with(&[1], 50.0);
        state.remove_entity(entity_id(1)).unwrap();

        // Act
        let removed = state.apply_damage(entity_id(1), 5.0);
        let unknown = state.apply_damage(entity_id(2), 5.0);

        // Assert
        assert_eq!(removed, Err(DomainError::EntityRemoved(entity_id(1))));
        assert_eq!(unknown, Err(DomainError::EntityNotFound(entity_id(2))));
        assert_eq!(
            state.add_entity(entity_id(1), training_stats(1.0, 1.0).into()),
            Err(DomainError::EntityRemoved(entity_id(1)))
        );
    }

    #[test]
    fn test_lethal_damage_returns_remaining_health_and_death_fires_once() {
        // Arrange
        let mut state = manager_with(&[1], 30.0);
        let id = entity_id(1);

        // Act
        let dealt = state.apply_damage_from(id, 40.0, Some(entity_id(2))).unwrap();
        let again = state.apply_damage(id, 40.0).unwrap();

        // Assert
        assert!((dealt - 30.0).abs() < f64::EPSILON);
        assert!(again.abs() < f64::EPSILON);
        let events = state.take_pending_events();
        assert_eq!(kinds(&events), vec![EventKind::EntityDeath]);
        match &events[0] {
            CombatEvent::EntityDeath(death) => {
                assert_eq!(death.killer, Some(entity_id(2)));
                assert!((death.overkill - 10.0).abs() < f64::EPSILON);
            }
            other => panic!("expected EntityDeath, got {other:?}"),
        }
        assert!(!state.is_alive(id));
        assert!(state.get_current_health(id).unwrap().abs() < f64::EPSILON);
    }

    #[test]
    fn test_negative_damage_heals_up_to_max() {
        let mut state = manager_with(&[1], 50.0);
        let id = entity_id(1);
        state.apply_damage(id, 20.0).unwrap();

        let healed = state.apply_damage(id, -35.0).unwrap();

        assert!((healed + 20.0).abs() < f64::EPSILON);
        assert!((state.get_current_health(id).unwrap() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_dead_entity_rejects_other_mutators() {
        let mut state = manager_with(&[1], 10.0);
        let id = entity_id(1);
        state.apply_damage(id, 10.0).unwrap();

        let effect = state.apply_effect(id, instance(&bleed(1.0, 3.0), 1));
        let spend = state.spend_resource(id, 1.0);

        assert!(matches!(
            effect,
            Err(DomainError::InvalidLifecycle {
                lifecycle: Lifecycle::Dead,
                ..
            })
        ));
        assert!(matches!(spend, Err(DomainError::InvalidLifecycle { .. })));
        assert!(state.remove_entity(id).is_ok());
    }

    #[test]
    fn test_spend_resource_is_all_or_nothing() {
        let mut state = manager_with(&[1], 50.0);
        let id = entity_id(1);

        assert!(state.spend_resource(id, 60.0).unwrap());
        assert!(!state.spend_resource(id, 60.0).unwrap());
        assert!((state.get_current_resource(id).unwrap() - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_add_resource_clamps_at_max() {
        let mut state = manager_with(&[1], 50.0);
        let id = entity_id(1);
        state.spend_resource(id, 10.0).unwrap();

        let gained = state.add_resource(id, 25.0).unwrap();

        assert!((gained - 10.0).abs() < f64::EPSILON);
        assert!((state.get_current_resource(id).unwrap() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_cooldowns_count_down_on_update() {
        let mut state = manager_with(&[1], 50.0);
        let id = entity_id(1);
        state.set_cooldown(id, "slam", 2.0).unwrap();

        state.update(0.75).unwrap();

        assert!((state.get_cooldown_remaining(id, "slam").unwrap() - 1.25).abs() < 1e-9);
        state.update(5.0).unwrap();
        assert!(state.get_cooldown_remaining(id, "slam").unwrap().abs() < f64::EPSILON);
    }

    #[test]
    fn test_roll_modifiers_expire_and_clear_by_tag() {
        // Arrange
        let mut state = manager_with(&[1], 50.0);
        let id = entity_id(1);
        for (tag, time_remaining) in [("ward", Some(1.0)), ("aura", None), ("aura", None)] {
            state
                .add_roll_modifier(
                    id,
                    RollModifier {
                        kind: RollKind::Block,
                        value: 0.1,
                        source_tag: tag.to_owned(),
                        time_remaining,
                    },
                )
                .unwrap();
        }

        // Act
        state.update(1.0).unwrap();
        let after_update = state.combatant_snapshot(id).unwrap().modifiers.block;
        let cleared = state.clear_roll_modifiers(id, "aura").unwrap();

        // Assert
        assert!((after_update - 0.2).abs() < 1e-9);
        assert_eq!(cleared, 2);
        assert!(state.combatant_snapshot(id).unwrap().modifiers.block.abs() < f64::EPSILON);
    }

    #[test]
    fn test_reapplying_effect_stacks_and_refreshes() {
        // Arrange
        let mut state = manager_with(&[1], 500.0);
        let id = entity_id(1);
        let first = state.apply_effect(id, instance(&bleed(2.0, 4.0), 1)).unwrap();
        state.update(3.0).unwrap();

        // Act
        let second = state.apply_effect(id, instance(&bleed(2.0, 4.0), 2)).unwrap();

        // Assert
        assert_eq!(first.outcome, EffectOutcome::Applied);
        assert_eq!(second.outcome, EffectOutcome::Refreshed);
        assert_eq!(second.stacks, 2);
        assert_eq!(second.instance_id, first.instance_id);
        let active = state.get_active_effects(id).unwrap();
        assert_eq!(active.len(), 1);
        assert!((active[0].time_remaining - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_plain_reapplication_refreshes_to_definition_duration() {
        // Arrange
        let mut state = manager_with(&[1], 500.0);
        let id = entity_id(1);
        let definition = bleed(1.0, 4.0);
        let extended =
            EffectInstance::from_definition(&definition, entity_id(99), 1, Some(10.0), &mut SeededRng::new(1));
        state.apply_effect(id, extended).unwrap();

        // Act
        state.apply_effect(id, instance(&definition, 2)).unwrap();

        // Assert
        let active = state.get_active_effects(id).unwrap();
        assert!((active[0].time_remaining - 4.0).abs() < f64::EPSILON);
        assert!((active[0].duration - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_step_past_expiry_still_ticks_for_the_whole_step() {
        let mut state = manager_with(&[1], 1_000.0);
        let id = entity_id(1);
        state.apply_effect(id, instance(&bleed(10.0, 1.5), 1)).unwrap();
        state.take_pending_events();

        state.update(2.5).unwrap();

        assert_eq!(
            kinds(&state.take_pending_events()),
            vec![EventKind::EffectTick, EventKind::EffectTick, EventKind::EffectExpired]
        );
        assert!((state.get_current_health(id).unwrap() - 980.0).abs() < f64::EPSILON);
        assert!(state.get_active_effects(id).unwrap().is_empty());
    }

    #[test]
    fn test_stacks_are_capped_by_definition() {
        let mut state = manager_with(&[1], 500.0);
        let id = entity_id(1);

        for seed in 0..8 {
            state.apply_effect(id, instance(&bleed(1.0, 4.0), seed)).unwrap();
        }

        assert_eq!(state.get_effect_stacks(id, "bleed").unwrap(), 5);
    }

    #[test]
    fn test_partial_steps_accumulate_into_one_tick() {
        let mut state = manager_with(&[1], 100.0);
        let id = entity_id(1);
        state.apply_effect(id, instance(&poison(5.0, 10.0), 1)).unwrap();
        state.take_pending_events();

        state.update(0.4).unwrap();
        assert_eq!(state.pending_event_count(), 0);
        state.update(0.6).unwrap();

        assert_eq!(kinds(&state.take_pending_events()), vec![EventKind::EffectTick]);
        assert!((state.get_current_health(id).unwrap() - 95.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_long_step_ticks_multiple_times() {
        let mut state = manager_with(&[1], 100.0);
        let id = entity_id(1);
        state.apply_effect(id, instance(&poison(5.0, 10.0), 1)).unwrap();
        state.take_pending_events();

        state.update(2.5).unwrap();

        assert_eq!(
            kinds(&state.take_pending_events()),
            vec![EventKind::EffectTick, EventKind::EffectTick]
        );
        assert!((state.get_current_health(id).unwrap() - 90.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fractional_dot_ticks_twice_then_expires_without_third_tick() {
        // Arrange
        let mut state = manager_with(&[1], 100.0);
        let id = entity_id(1);
        state.apply_effect(id, instance(&poison(10.0, 2.5), 1)).unwrap();
        state.take_pending_events();

        // Act / Assert
        state.update(1.0).unwrap();
        assert_eq!(kinds(&state.take_pending_events()), vec![EventKind::EffectTick]);
        assert!((state.get_active_effects(id).unwrap()[0].time_remaining - 1.5).abs() < 1e-9);

        state.update(1.0).unwrap();
        assert_eq!(kinds(&state.take_pending_events()), vec![EventKind::EffectTick]);
        assert!((state.get_active_effects(id).unwrap()[0].time_remaining - 0.5).abs() < 1e-9);

        state.update(0.5).unwrap();
        assert_eq!(kinds(&state.take_pending_events()), vec![EventKind::EffectExpired]);
        assert!(state.get_active_effects(id).unwrap().is_empty());
        assert!((state.get_current_health(id).unwrap() - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_regen_heals_but_never_overheals() {
        let mut state = manager_with(&[1], 100.0);
        let id = entity_id(1);
        state.apply_damage(id, 5.0).unwrap();
        state.apply_effect(id, instance(&regen(4.0, 3.0), 1)).unwrap();

        state.update(3.0).unwrap();

        assert!((state.get_current_health(id).unwrap() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_effect_killing_its_carrier_stops_ticking() {
        let mut state = manager_with(&[1], 12.0);
        let id = entity_id(1);
        state.apply_effect(id, instance(&poison(5.0, 10.0), 1)).unwrap();
        state.take_pending_events();

        state.update(5.0).unwrap();

        let events = kinds(&state.take_pending_events());
        assert_eq!(
            events,
            vec![
                EventKind::EffectTick,
                EventKind::EffectTick,
                EventKind::EntityDeath,
                EventKind::EffectTick
            ]
        );
        state.update(5.0).unwrap();
        assert_eq!(state.pending_event_count(), 0);
    }

    #[test]
    fn test_non_expiring_effect_lasts_until_removed() {
        let mut state = manager_with(&[1], 100.0);
        let id = entity_id(1);
        let mut aura = bleed(0.0, 1.0);
        aura.expires_at_zero = false;
        aura.tick_interval = 0.0;
        let applied = state.apply_effect(id, instance(&aura, 1)).unwrap();

        state.update(60.0).unwrap();
        assert_eq!(state.get_active_effects(id).unwrap().len(), 1);

        assert!(state.remove_effect(id, applied.instance_id).unwrap());
        assert!(state.get_active_effects(id).unwrap().is_empty());
    }

    #[test]
    fn test_remove_entity_and_reset_system() {
        // Arrange
        let mut state = manager_with(&[1, 2], 50.0);
        state.apply_effect(entity_id(1), instance(&bleed(1.0, 3.0), 1)).unwrap();
        state.take_pending_events();

        // Act
        state.remove_entity(entity_id(1)).unwrap();

        // Assert
        assert_eq!(kinds(&state.take_pending_events()), vec![EventKind::EntityDespawn]);
        assert_eq!(
            state.get_active_effects(entity_id(1)),
            Err(DomainError::EntityRemoved(entity_id(1)))
        );

        state.reset_system();
        assert!(state.entity_ids().is_empty());
        assert!(state.add_entity(entity_id(1), training_stats(1.0, 1.0).into()).is_ok());
    }

    #[test]
    fn test_update_rejects_negative_delta() {
        let mut state = manager_with(&[1], 50.0);

        assert!(matches!(state.update(-1.0), Err(DomainError::Validation(_))));
    }
}
