//! One self-contained simulation: state, bus, RNG, and config.
//!
//! Nothing here is shared between simulations, so any number of them can
//! run side by side on different threads.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use skirmish_core::config::CombatConfig;
use skirmish_core::content::{EntityTemplate, SkillDefinition};
use skirmish_core::error::DomainError;
use skirmish_core::event::EventKind;
use skirmish_core::hit::HitContext;
use skirmish_core::rng::{DeterministicRng, SeededRng};
use skirmish_core::snapshot::Lifecycle;
use skirmish_events::{EntropySafeguard, EventBus, Listener, ReactiveEffectConfig, ReactiveEffectHandler};
use skirmish_rules::{SkillUseRequest, calculate_skill_use};
use skirmish_state::StateManager;
use tracing::{debug, info};
use uuid::Uuid;

use super::orchestrator::{ExecutionReport, PumpReport, execute_skill_use, pump_events};

/// Result of [`Simulation::use_skill`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SkillUseOutcome {
    /// The skill was resolved and executed.
    Executed(ExecutionReport),
    /// The skill is still cooling down.
    OnCooldown {
        /// Seconds left.
        remaining: f64,
    },
    /// The attacker cannot pay the cost.
    InsufficientResource {
        /// Cost of the skill.
        required: f64,
        /// Resource the attacker has.
        available: f64,
    },
}

/// Builds a [`Simulation`]. An RNG (or seed) is required.
#[derive(Default)]
pub struct SimulationBuilder {
    config: CombatConfig,
    rng: Option<Box<dyn DeterministicRng>>,
    reactive_effects: Vec<ReactiveEffectConfig>,
    listeners: Vec<(EventKind, Rc<dyn Listener>)>,
}

impl SimulationBuilder {
    /// Sets the combat configuration.
    #[must_use]
    pub fn config(mut self, config: CombatConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses `rng` as the simulation's only random source.
    #[must_use]
    pub fn rng(mut self, rng: impl DeterministicRng + 'static) -> Self {
        self.rng = Some(Box::new(rng));
        self
    }

    /// Shorthand for `rng(SeededRng::new(seed))`.
    #[must_use]
    pub fn seed(self, seed: u64) -> Self {
        self.rng(SeededRng::new(seed))
    }

    /// Adds a reactive effect handler.
    #[must_use]
    pub fn reactive_effect(mut self, config: ReactiveEffectConfig) -> Self {
        self.reactive_effects.push(config);
        self
    }

    /// Adds several reactive effect handlers.
    #[must_use]
    pub fn reactive_effects(mut self, configs: impl IntoIterator<Item = ReactiveEffectConfig>) -> Self {
        self.reactive_effects.extend(configs);
        self
    }

    /// Subscribes an arbitrary listener.
    #[must_use]
    pub fn listener(mut self, kind: EventKind, listener: Rc<dyn Listener>) -> Self {
        self.listeners.push((kind, listener));
        self
    }

    /// Wires everything together.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::MissingCollaborator` if no RNG was given, and
    /// `DomainError::Validation` if the configuration is out of range.
    pub fn build(self) -> Result<Simulation, DomainError> {
        let rng = self.rng.ok_or(DomainError::MissingCollaborator("rng"))?;
        self.config.validate()?;

        let bus = EventBus::new();
        if self.config.entropy_safeguard.enabled {
            Rc::new(EntropySafeguard::new(self.config.entropy_safeguard.clone())).register(&bus);
        }
        for config in self.reactive_effects {
            Rc::new(ReactiveEffectHandler::new(config)).register(&bus);
        }
        for (kind, listener) in self.listeners {
            bus.subscribe(kind, listener);
        }

        Ok(Simulation {
            state: StateManager::new(),
            bus,
            rng,
            config: self.config,
            elapsed: 0.0,
            hit_log: Vec::new(),
        })
    }
}

/// A single-threaded combat simulation.
pub struct Simulation {
    state: StateManager,
    bus: EventBus,
    rng: Box<dyn DeterministicRng>,
    config: CombatConfig,
    elapsed: f64,
    hit_log: Vec<HitContext>,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("state", &self.state)
            .field("bus", &self.bus)
            .field("elapsed", &self.elapsed)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Starts a builder.
    #[must_use]
    pub fn builder() -> SimulationBuilder {
        SimulationBuilder::default()
    }

    /// Read access to entity state.
    #[must_use]
    pub fn state(&self) -> &StateManager {
        &self.state
    }

    /// The simulation's event bus, for subscribing listeners.
    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// The combat configuration.
    #[must_use]
    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// Simulated seconds elapsed.
    #[must_use]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Every hit context resolved so far, in order.
    #[must_use]
    pub fn hit_log(&self) -> &[HitContext] {
        &self.hit_log
    }

    /// Fingerprint of the current entity state.
    #[must_use]
    pub fn fingerprint(&self) -> [u8; 32] {
        self.state.fingerprint()
    }

    fn flush(&mut self) -> PumpReport {
        pump_events(
            &mut self.state,
            &self.bus,
            self.rng.as_mut(),
            self.config.max_cascade_events,
        )
    }

    /// Registers and activates an entity.
    ///
    /// # Errors
    ///
    /// Propagates State Manager registration errors.
    pub fn spawn(&mut self, id: Uuid, template: EntityTemplate) -> Result<(), DomainError> {
        self.state.add_entity(id, template)?;
        self.state.activate_entity(id)?;
        self.flush();
        Ok(())
    }

    /// Removes an entity.
    ///
    /// # Errors
    ///
    /// Returns a lookup error if the id is not registered.
    pub fn despawn(&mut self, id: Uuid) -> Result<(), DomainError> {
        self.state.remove_entity(id)?;
        self.flush();
        Ok(())
    }

    /// Uses `skill` from `attacker` on `defender`.
    ///
    /// Checks the cooldown, pays the cost, starts the cooldown (scaled by
    /// cooldown reduction), then resolves and executes the skill.
    ///
    /// # Errors
    ///
    /// Returns a lookup error for unknown ids and
    /// `DomainError::InvalidLifecycle` if the attacker is not active or the
    /// defender is dead.
    pub fn use_skill(
        &mut self,
        attacker: Uuid,
        defender: Uuid,
        skill: &SkillDefinition,
    ) -> Result<SkillUseOutcome, DomainError> {
        let lifecycle = self.state.lifecycle(attacker)?;
        if lifecycle != Lifecycle::Active {
            return Err(DomainError::InvalidLifecycle {
                entity_id: attacker,
                lifecycle,
                operation: "use a skill",
            });
        }
        let target_lifecycle = self.state.lifecycle(defender)?;
        if !target_lifecycle.is_operable() {
            return Err(DomainError::InvalidLifecycle {
                entity_id: defender,
                lifecycle: target_lifecycle,
                operation: "be targeted",
            });
        }

        let remaining = self.state.get_cooldown_remaining(attacker, &skill.id)?;
        if remaining > 0.0 {
            return Ok(SkillUseOutcome::OnCooldown { remaining });
        }
        if !self.state.spend_resource(attacker, skill.resource_cost)? {
            return Ok(SkillUseOutcome::InsufficientResource {
                required: skill.resource_cost,
                available: self.state.get_current_resource(attacker)?,
            });
        }
        let cooldown = self.state.stats(attacker)?.scaled_cooldown(skill.cooldown);
        self.state.set_cooldown(attacker, &skill.id, cooldown)?;

        let attacker_snapshot = self.state.combatant_snapshot(attacker)?;
        let defender_snapshot = self.state.combatant_snapshot(defender)?;
        let result = calculate_skill_use(
            &SkillUseRequest {
                attacker: &attacker_snapshot,
                defender: &defender_snapshot,
                skill,
            },
            &self.config,
            self.rng.as_mut(),
        );
        self.hit_log.extend(result.hits.iter().cloned());

        let report = execute_skill_use(
            &result,
            &mut self.state,
            &self.bus,
            self.rng.as_mut(),
            &self.config,
        );
        debug!(
            %attacker,
            %defender,
            skill_id = %skill.id,
            damage = report.damage_dealt,
            "skill used"
        );
        Ok(SkillUseOutcome::Executed(report))
    }

    /// Advances time and dispatches whatever it produced.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a negative or non-finite step.
    pub fn update(&mut self, delta: f64) -> Result<PumpReport, DomainError> {
        self.state.update(delta)?;
        self.elapsed += delta;
        Ok(self.flush())
    }

    /// Clears all entities and history; listeners stay subscribed.
    pub fn reset(&mut self) {
        info!(elapsed = self.elapsed, "simulation reset");
        self.state.reset_system();
        self.bus.take_failures();
        self.elapsed = 0.0;
        self.hit_log.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_core::stats::EntityStats;
    use skirmish_test_support::{FixedRng, entity_id, training_stats};

    fn duelists(sim: &mut Simulation) {
        sim.spawn(entity_id(1), training_stats(10.0, 100.0).into()).unwrap();
        sim.spawn(entity_id(2), training_stats(10.0, 100.0).into()).unwrap();
    }

    #[test]
    fn test_build_without_rng_is_missing_collaborator() {
        let result = Simulation::builder().build();

        assert!(matches!(result, Err(DomainError::MissingCollaborator("rng"))));
    }

    #[test]
    fn test_cooldown_blocks_second_use_until_time_passes() {
        // Arrange
        let mut sim = Simulation::builder().rng(FixedRng::never()).build().unwrap();
        duelists(&mut sim);
        let skill = SkillDefinition {
            cooldown: 2.0,
            ..SkillDefinition::basic_attack("slam")
        };

        // Act
        let first = sim.use_skill(entity_id(1), entity_id(2), &skill).unwrap();
        let second = sim.use_skill(entity_id(1), entity_id(2), &skill).unwrap();
        sim.update(2.0).unwrap();
        let third = sim.use_skill(entity_id(1), entity_id(2), &skill).unwrap();

        // Assert
        assert!(matches!(first, SkillUseOutcome::Executed(_)));
        assert!(matches!(second, SkillUseOutcome::OnCooldown { remaining } if (remaining - 2.0).abs() < 1e-9));
        assert!(matches!(third, SkillUseOutcome::Executed(_)));
        assert!((sim.state().get_current_health(entity_id(2)).unwrap() - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_cooldown_reduction_scales_cooldown() {
        let mut sim = Simulation::builder().rng(FixedRng::never()).build().unwrap();
        let hasty = EntityStats {
            cooldown_reduction: 0.25,
            ..training_stats(10.0, 100.0)
        };
        sim.spawn(entity_id(1), hasty.into()).unwrap();
        sim.spawn(entity_id(2), training_stats(10.0, 100.0).into()).unwrap();
        let skill = SkillDefinition {
            cooldown: 4.0,
            ..SkillDefinition::basic_attack("slam")
        };

        sim.use_skill(entity_id(1), entity_id(2), &skill).unwrap();

        let remaining = sim.state().get_cooldown_remaining(entity_id(1), "slam").unwrap();
        assert!((remaining - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_insufficient_resource_changes_nothing() {
        let mut sim = Simulation::builder().rng(FixedRng::never()).build().unwrap();
        duelists(&mut sim);
        let skill = SkillDefinition {
            resource_cost: 150.0,
            cooldown: 5.0,
            ..SkillDefinition::basic_attack("nuke")
        };

        let outcome = sim.use_skill(entity_id(1), entity_id(2), &skill).unwrap();

        assert_eq!(
            outcome,
            SkillUseOutcome::InsufficientResource {
                required: 150.0,
                available: 100.0
            }
        );
        assert!(sim.state().get_cooldown_remaining(entity_id(1), "nuke").unwrap().abs() < f64::EPSILON);
        assert!(sim.hit_log().is_empty());
    }

    #[test]
    fn test_outcome_serializes_with_outcome_tag() {
        let outcome = SkillUseOutcome::OnCooldown { remaining: 1.5 };

        let json = serde_json::to_value(&outcome).unwrap();

        assert_eq!(json["outcome"], "on_cooldown");
        assert_eq!(json["remaining"], 1.5);
    }

    #[test]
    fn test_dead_target_is_rejected() {
        let mut sim = Simulation::builder().rng(FixedRng::never()).build().unwrap();
        sim.spawn(entity_id(1), training_stats(200.0, 100.0).into()).unwrap();
        sim.spawn(entity_id(2), training_stats(10.0, 100.0).into()).unwrap();
        let skill = SkillDefinition::basic_attack("smite");
        sim.use_skill(entity_id(1), entity_id(2), &skill).unwrap();

        let result = sim.use_skill(entity_id(1), entity_id(2), &skill);

        assert!(matches!(
            result,
            Err(DomainError::InvalidLifecycle {
                lifecycle: Lifecycle::Dead,
                ..
            })
        ));
    }

    #[test]
    fn test_reset_clears_entities_and_history() {
        let mut sim = Simulation::builder().seed(9).build().unwrap();
        duelists(&mut sim);
        sim.use_skill(entity_id(1), entity_id(2), &SkillDefinition::basic_attack("jab"))
            .unwrap();
        sim.update(1.0).unwrap();

        sim.reset();

        assert!(sim.state().entity_ids().is_empty());
        assert!(sim.hit_log().is_empty());
        assert!(sim.elapsed().abs() < f64::EPSILON);
    }
}
