//! Executes a [`SkillUseResult`] against live state.
//!
//! Actions run strictly in the order the resolver produced them. After each
//! one, events queued by the State Manager are pumped through the bus so
//! that a multi-hit skill plays out hit by hit.
//!
//! A hit whose target died earlier in the same batch is stale: its damage,
//! hit events, and resource-on-hit are skipped and counted. Effects and
//! resource aimed at entities that are no longer alive are skipped the
//! same way.

use serde::{Deserialize, Serialize};
use skirmish_core::config::CombatConfig;
use skirmish_core::error::DomainError;
use skirmish_core::event::CombatEvent;
use skirmish_core::rng::DeterministicRng;
use skirmish_events::EventBus;
use skirmish_rules::{Action, SkillUseResult};
use skirmish_state::StateManager;
use tracing::{debug, warn};
use uuid::Uuid;

/// What one `pump_events` call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PumpReport {
    /// Queued events dispatched.
    pub dispatched: usize,
    /// Events discarded after the cascade limit was reached.
    pub dropped: usize,
    /// Listener invocations that failed.
    pub listener_failures: usize,
}

/// What one `execute_skill_use` call did.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// Actions carried out.
    pub actions_executed: usize,
    /// Actions skipped because their target was gone.
    pub actions_skipped: usize,
    /// Health actually removed by `ApplyDamage` actions.
    pub damage_dealt: f64,
    /// Entities killed by this skill use, in order.
    pub kills: Vec<Uuid>,
    /// Effects applied or refreshed by `ApplyEffect` actions.
    pub effects_applied: usize,
    /// Events dispatched, from actions and from the State Manager.
    pub events_dispatched: usize,
    /// Cascade events dropped at the limit.
    pub events_dropped: usize,
    /// Listener invocations that failed.
    pub listener_failures: usize,
    /// Resource-on-kill rewards that could not be granted.
    pub rewards_failed: usize,
}

impl ExecutionReport {
    fn absorb(&mut self, pump: PumpReport) {
        self.events_dispatched += pump.dispatched;
        self.events_dropped += pump.dropped;
        self.listener_failures += pump.listener_failures;
    }

    fn skip(&mut self, action: &Action, reason: &'static str) {
        self.actions_skipped += 1;
        warn!(target_id = ?action.target(), reason, "stale action skipped");
    }
}

/// Dispatches queued State Manager events, oldest first, including the ones
/// listeners queue along the way, until the queue is empty or `max_events`
/// have been dispatched. Anything left after the limit is dropped.
pub fn pump_events(
    state: &mut StateManager,
    bus: &EventBus,
    rng: &mut dyn DeterministicRng,
    max_events: usize,
) -> PumpReport {
    let mut report = PumpReport::default();
    while let Some(event) = state.pop_pending_event() {
        if report.dispatched >= max_events {
            report.dropped = 1 + state.take_pending_events().len();
            warn!(
                limit = max_events,
                dropped = report.dropped,
                "event cascade limit reached"
            );
            break;
        }
        let dispatch = bus.dispatch(&event, state, rng);
        report.dispatched += 1;
        report.listener_failures += dispatch.failed;
    }
    report
}

/// Executes every action of `result` in order.
///
/// Never fails: stale targets are skipped and counted in the report.
pub fn execute_skill_use(
    result: &SkillUseResult,
    state: &mut StateManager,
    bus: &EventBus,
    rng: &mut dyn DeterministicRng,
    config: &CombatConfig,
) -> ExecutionReport {
    let mut report = ExecutionReport::default();
    let mut hit_is_stale = false;

    for action in &result.actions {
        match action {
            Action::ApplyDamage {
                target,
                source,
                amount,
                label,
            } => {
                hit_is_stale = !state.is_alive(*target);
                if hit_is_stale {
                    report.skip(action, "damage target not alive");
                    continue;
                }
                let Ok(lost) = state.apply_damage_from(*target, *amount, *source) else {
                    report.skip(action, "damage target not registered");
                    continue;
                };
                report.damage_dealt += lost;
                debug!(%label, %target, amount, lost, "damage executed");
                if !state.is_alive(*target) {
                    report.kills.push(*target);
                    if let Some(killer) = source {
                        if let Err(error) = reward_kill(state, *killer) {
                            report.rewards_failed += 1;
                            warn!(killer_id = %killer, %error, "kill reward not granted");
                        }
                    }
                }
            }
            Action::DispatchEvent { event } => {
                if is_stale_event(event, hit_is_stale, state) {
                    report.skip(action, "event subject not alive");
                    continue;
                }
                let dispatch = bus.dispatch(event, state, rng);
                report.events_dispatched += 1;
                report.listener_failures += dispatch.failed;
            }
            Action::ApplyEffect { target, effect } => {
                if !state.is_alive(*target) {
                    report.skip(action, "effect target not alive");
                    continue;
                }
                match state.apply_effect(*target, effect.clone()) {
                    Ok(_) => report.effects_applied += 1,
                    Err(_) => {
                        report.skip(action, "effect target rejected");
                        continue;
                    }
                }
            }
            Action::RestoreResource { target, amount } => {
                if hit_is_stale || state.add_resource(*target, *amount).is_err() {
                    report.skip(action, "resource target not alive");
                    continue;
                }
            }
        }

        report.actions_executed += 1;
        report.absorb(pump_events(state, bus, rng, config.max_cascade_events));
    }

    debug!(
        skill_id = %result.skill_id,
        executed = report.actions_executed,
        skipped = report.actions_skipped,
        damage = report.damage_dealt,
        "skill use executed"
    );
    report
}

fn is_stale_event(event: &CombatEvent, hit_is_stale: bool, state: &StateManager) -> bool {
    match event {
        CombatEvent::OnHit(_)
        | CombatEvent::OnCrit(_)
        | CombatEvent::OnBlock(_)
        | CombatEvent::OnGlancingBlow(_) => hit_is_stale,
        CombatEvent::OnDodge(dodge) => !state.is_alive(dodge.defender),
        _ => false,
    }
}

/// Grants the killer its resource-on-kill. A dead killer gets nothing.
fn reward_kill(state: &mut StateManager, killer: Uuid) -> Result<f64, DomainError> {
    let reward = state.stats(killer)?.resource_on_kill;
    if reward <= 0.0 || !state.is_alive(killer) {
        return Ok(0.0);
    }
    state.add_resource(killer, reward)
}

#[cfg(test)]
mod tests {
    use super::*;
    use skirmish_core::content::SkillDefinition;
    use skirmish_core::stats::EntityStats;
    use skirmish_rules::{SkillUseRequest, calculate_skill_use};
    use skirmish_test_support::{FixedRng, entity_id, training_stats};

    fn arena(attacker: EntityStats, defender_health: f64) -> StateManager {
        let mut state = StateManager::new();
        state.add_entity(entity_id(1), attacker.into()).unwrap();
        state
            .add_entity(entity_id(2), training_stats(0.0, defender_health).into())
            .unwrap();
        state.activate_entity(entity_id(1)).unwrap();
        state.activate_entity(entity_id(2)).unwrap();
        state.take_pending_events();
        state
    }

    fn resolve(state: &StateManager, skill: &SkillDefinition) -> SkillUseResult {
        let attacker = state.combatant_snapshot(entity_id(1)).unwrap();
        let defender = state.combatant_snapshot(entity_id(2)).unwrap();
        calculate_skill_use(
            &SkillUseRequest {
                attacker: &attacker,
                defender: &defender,
                skill,
            },
            &CombatConfig::default(),
            &mut FixedRng::never(),
        )
    }

    #[test]
    fn test_hits_after_a_kill_are_skipped() {
        // Arrange
        let mut state = arena(training_stats(20.0, 100.0), 30.0);
        let skill = SkillDefinition {
            hit_count: 3,
            ..SkillDefinition::basic_attack("flurry")
        };
        let result = resolve(&state, &skill);

        // Act
        let report = execute_skill_use(
            &result,
            &mut state,
            &EventBus::new(),
            &mut FixedRng::never(),
            &CombatConfig::default(),
        );

        // Assert
        assert!((report.damage_dealt - 30.0).abs() < f64::EPSILON);
        assert_eq!(report.kills, vec![entity_id(2)]);
        // Third hit: ApplyDamage and OnHit both skipped.
        assert_eq!(report.actions_skipped, 2);
        assert_eq!(report.actions_executed, 5);
        assert!(!state.is_alive(entity_id(2)));
    }

    #[test]
    fn test_kill_rewards_resource_on_kill() {
        let attacker = EntityStats {
            resource_on_kill: 25.0,
            ..training_stats(50.0, 100.0)
        };
        let mut state = arena(attacker, 40.0);
        state.spend_resource(entity_id(1), 50.0).unwrap();
        let result = resolve(&state, &SkillDefinition::basic_attack("finisher"));

        execute_skill_use(
            &result,
            &mut state,
            &EventBus::new(),
            &mut FixedRng::never(),
            &CombatConfig::default(),
        );

        assert!((state.get_current_resource(entity_id(1)).unwrap() - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_kill_by_unregistered_source_reports_failed_reward() {
        // Arrange
        let mut state = arena(training_stats(1.0, 100.0), 10.0);
        let result = SkillUseResult {
            attacker: entity_id(1),
            defender: entity_id(2),
            skill_id: "trap".to_owned(),
            hits: Vec::new(),
            actions: vec![Action::ApplyDamage {
                target: entity_id(2),
                source: Some(entity_id(42)),
                amount: 15.0,
                label: "trap#1".to_owned(),
            }],
        };

        // Act
        let report = execute_skill_use(
            &result,
            &mut state,
            &EventBus::new(),
            &mut FixedRng::never(),
            &CombatConfig::default(),
        );

        // Assert
        assert_eq!(report.kills, vec![entity_id(2)]);
        assert_eq!(report.rewards_failed, 1);
        assert_eq!(report.actions_skipped, 0);
    }

    #[test]
    fn test_pump_drops_events_beyond_the_limit() {
        let mut state = arena(training_stats(1.0, 100.0), 100.0);
        state.add_entity(entity_id(3), training_stats(1.0, 1.0).into()).unwrap();
        state.add_entity(entity_id(4), training_stats(1.0, 1.0).into()).unwrap();
        state.add_entity(entity_id(5), training_stats(1.0, 1.0).into()).unwrap();

        let report = pump_events(&mut state, &EventBus::new(), &mut FixedRng::never(), 2);

        assert_eq!(report, PumpReport { dispatched: 2, dropped: 1, listener_failures: 0 });
        assert_eq!(state.pending_event_count(), 0);
    }
}
