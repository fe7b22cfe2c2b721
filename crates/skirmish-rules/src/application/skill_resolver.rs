//! Skill resolution: repeat the hit resolver, then evaluate procs.
//!
//! The resolver never touches live state. It receives snapshots of both
//! participants and returns a [`SkillUseResult`] describing what should
//! happen; the orchestrator decides when it happens.

use skirmish_core::config::CombatConfig;
use skirmish_core::content::{SkillDefinition, Trigger, TriggerTarget};
use skirmish_core::effect::EffectInstance;
use skirmish_core::event::{CombatEvent, DodgeEvent, HitEvent, SkillUsedEvent};
use skirmish_core::rng::DeterministicRng;
use skirmish_core::snapshot::CombatantSnapshot;
use skirmish_core::stats::clamp_probability;
use tracing::debug;

use crate::domain::actions::{Action, SkillUseResult};
use crate::domain::hit_resolver::{HitInput, resolve_hit};

/// A skill use to resolve.
#[derive(Debug, Clone, Copy)]
pub struct SkillUseRequest<'a> {
    /// Snapshot of the entity using the skill.
    pub attacker: &'a CombatantSnapshot,
    /// Snapshot of the skill's target.
    pub defender: &'a CombatantSnapshot,
    /// The skill.
    pub skill: &'a SkillDefinition,
}

/// Resolves every hit of a skill use and the procs they trigger.
///
/// Action order: `SkillUsed`, then per hit either `OnDodge`, or
/// `ApplyDamage`, `OnHit`, `OnCrit`/`OnBlock`/`OnGlancingBlow` as they apply,
/// and `RestoreResource` for resource-on-hit. Proc effects come last, in
/// event order, skill triggers before item triggers.
pub fn calculate_skill_use(
    request: &SkillUseRequest<'_>,
    config: &CombatConfig,
    rng: &mut dyn DeterministicRng,
) -> SkillUseResult {
    let SkillUseRequest {
        attacker,
        defender,
        skill,
    } = *request;

    let mut hits = Vec::with_capacity(skill.hit_count as usize);
    let mut actions = Vec::new();
    let mut events = Vec::new();

    let used = CombatEvent::SkillUsed(SkillUsedEvent {
        attacker: attacker.id,
        defender: defender.id,
        skill_id: skill.id.clone(),
        hit_count: skill.hit_count,
    });
    events.push(used.clone());
    actions.push(Action::DispatchEvent { event: used });

    let input = HitInput {
        attacker: &attacker.stats,
        defender: &defender.stats,
        attacker_modifiers: attacker.modifiers,
        defender_modifiers: defender.modifiers,
        damage_type: skill.damage_type,
        flat_bonus: skill.flat_damage,
    };

    for hit_index in 0..skill.hit_count {
        let hit = resolve_hit(&input, config, rng);

        if hit.landed() {
            let damage = hit.final_damage * skill.damage_multiplier;
            actions.push(Action::ApplyDamage {
                target: defender.id,
                source: Some(attacker.id),
                amount: damage,
                label: format!("{}#{hit_index}", skill.id),
            });

            let payload = HitEvent {
                attacker: attacker.id,
                defender: defender.id,
                skill_id: skill.id.clone(),
                hit_index,
                damage,
                hit: hit.clone(),
            };
            let mut hit_events = vec![CombatEvent::OnHit(payload.clone())];
            if hit.is_crit {
                hit_events.push(CombatEvent::OnCrit(payload.clone()));
            }
            if hit.is_blocked {
                hit_events.push(CombatEvent::OnBlock(payload.clone()));
            }
            if hit.is_glancing {
                hit_events.push(CombatEvent::OnGlancingBlow(payload));
            }
            for event in hit_events {
                events.push(event.clone());
                actions.push(Action::DispatchEvent { event });
            }

            if attacker.stats.resource_on_hit > 0.0 {
                actions.push(Action::RestoreResource {
                    target: attacker.id,
                    amount: attacker.stats.resource_on_hit,
                });
            }
        } else {
            let event = CombatEvent::OnDodge(DodgeEvent {
                attacker: attacker.id,
                defender: defender.id,
                skill_id: skill.id.clone(),
                hit_index,
            });
            events.push(event.clone());
            actions.push(Action::DispatchEvent { event });
        }

        debug!(
            skill_id = %skill.id,
            hit_index,
            dodged = hit.is_dodged,
            glancing = hit.is_glancing,
            crit = hit.is_crit,
            final_damage = hit.final_damage,
            "hit resolved"
        );
        hits.push(hit);
    }

    let triggers: Vec<&Trigger> = skill
        .triggers
        .iter()
        .chain(attacker.item_triggers.iter())
        .collect();
    for event in &events {
        for trigger in triggers.iter().filter(|t| t.on == event.kind()) {
            if let Some(action) = roll_trigger(trigger, event, attacker, rng) {
                actions.push(action);
            }
        }
    }

    SkillUseResult {
        attacker: attacker.id,
        defender: defender.id,
        skill_id: skill.id.clone(),
        hits,
        actions,
    }
}

fn roll_trigger(
    trigger: &Trigger,
    event: &CombatEvent,
    attacker: &CombatantSnapshot,
    rng: &mut dyn DeterministicRng,
) -> Option<Action> {
    if rng.uniform() >= clamp_probability(trigger.proc_rate) {
        return None;
    }

    let target = match trigger.target {
        TriggerTarget::EventTarget => event.target(),
        TriggerTarget::EventSource => event.source(),
    }?;
    let effect = EffectInstance::from_definition(
        &trigger.effect,
        attacker.id,
        trigger.stacks,
        trigger.duration,
        rng,
    );
    debug!(
        effect = %effect.definition_id,
        %target,
        on = event.event_type(),
        "trigger proc"
    );
    Some(Action::ApplyEffect { target, effect })
}
