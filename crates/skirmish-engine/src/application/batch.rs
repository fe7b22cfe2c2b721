//! Seeded duels, one at a time or many in parallel.
//!
//! Each duel owns its own [`Simulation`]; a batch shares nothing but the
//! read-only scenario, so outcomes depend only on their seeds.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use skirmish_core::error::DomainError;
use tracing::{debug, info};
use uuid::Uuid;

use super::simulation::{Simulation, SkillUseOutcome};
use crate::domain::duel::{
    BatchSummary, CHALLENGER_ID, DEFENDER_ID, DuelCombatant, DuelOutcome, DuelScenario, DuelWinner,
};
use crate::pool::WorkerPool;

/// Outcomes of a batch, in seed order, with their summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// One outcome per seed.
    pub outcomes: Vec<DuelOutcome>,
    /// Aggregate statistics.
    pub summary: BatchSummary,
}

/// `runs` consecutive seeds starting at `base_seed`.
#[must_use]
pub fn batch_seeds(base_seed: u64, runs: usize) -> Vec<u64> {
    (0..runs as u64).map(|i| base_seed.wrapping_add(i)).collect()
}

/// Takes one swing: the first skill in priority order that executes.
/// Returns whether any did.
fn swing(
    sim: &mut Simulation,
    attacker: Uuid,
    defender: Uuid,
    combatant: &DuelCombatant,
) -> Result<bool, DomainError> {
    for skill in &combatant.skills {
        if let SkillUseOutcome::Executed(_) = sim.use_skill(attacker, defender, skill)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Runs one duel with `seed`.
///
/// Both sides swing on their attack-speed timers, challenger first on ties,
/// and time advances in fixed steps until someone dies or a limit is hit.
///
/// # Errors
///
/// Returns `DomainError::Validation` for an invalid scenario.
pub fn run_duel(scenario: &DuelScenario, seed: u64) -> Result<DuelOutcome, DomainError> {
    scenario.validate()?;
    let mut sim = Simulation::builder()
        .config(scenario.config.clone())
        .reactive_effects(scenario.reactive_effects.iter().cloned())
        .seed(seed)
        .build()?;
    sim.spawn(CHALLENGER_ID, scenario.challenger.template.clone())?;
    sim.spawn(DEFENDER_ID, scenario.defender.template.clone())?;

    let sides = [
        (CHALLENGER_ID, DEFENDER_ID, &scenario.challenger),
        (DEFENDER_ID, CHALLENGER_ID, &scenario.defender),
    ];
    let mut next_swing = [0.0_f64; 2];
    for (slot, (attacker, _, _)) in sides.iter().enumerate() {
        if sim.state().stats(*attacker)?.swing_interval().is_none() {
            next_swing[slot] = f64::INFINITY;
        }
    }
    let mut skill_uses = 0_u32;
    let mut steps = 0_u32;

    let both_alive = |sim: &Simulation| {
        sim.state().is_alive(CHALLENGER_ID) && sim.state().is_alive(DEFENDER_ID)
    };

    while both_alive(&sim) && steps < scenario.max_steps && sim.elapsed() < scenario.max_time {
        for (slot, (attacker, defender, combatant)) in sides.iter().enumerate() {
            if !both_alive(&sim) || next_swing[slot] > 0.0 {
                continue;
            }
            if swing(&mut sim, *attacker, *defender, combatant)? {
                skill_uses += 1;
            }
            next_swing[slot] += sim
                .state()
                .stats(*attacker)?
                .swing_interval()
                .unwrap_or(f64::INFINITY);
        }
        if !both_alive(&sim) {
            break;
        }
        sim.update(scenario.time_step)?;
        for timer in &mut next_swing {
            *timer -= scenario.time_step;
        }
        steps += 1;
    }

    let challenger_alive = sim.state().is_alive(CHALLENGER_ID);
    let defender_alive = sim.state().is_alive(DEFENDER_ID);
    let winner = match (challenger_alive, defender_alive) {
        (true, false) => DuelWinner::Challenger,
        (false, true) => DuelWinner::Defender,
        (false, false) => DuelWinner::Draw,
        (true, true) => DuelWinner::Timeout,
    };
    let outcome = DuelOutcome {
        seed,
        winner,
        elapsed: sim.elapsed(),
        steps,
        challenger_health: sim.state().get_current_health(CHALLENGER_ID)?,
        defender_health: sim.state().get_current_health(DEFENDER_ID)?,
        skill_uses,
        hits: sim.hit_log().len(),
        listener_failures: sim.bus().failures().len(),
        fingerprint: sim.fingerprint(),
    };
    debug!(seed, ?winner, elapsed = outcome.elapsed, "duel finished");
    Ok(outcome)
}

/// Runs one duel per seed on `pool`, in parallel.
///
/// Outcomes are returned in seed order and are identical to running the
/// same seeds one at a time.
///
/// # Errors
///
/// Returns the first duel error, or a pool construction error.
pub fn run_batch(
    scenario: &DuelScenario,
    seeds: &[u64],
    pool: &WorkerPool,
) -> Result<BatchReport, DomainError> {
    scenario.validate()?;
    let outcomes = pool.install(|| {
        seeds
            .par_iter()
            .map(|&seed| run_duel(scenario, seed))
            .collect::<Result<Vec<_>, _>>()
    })??;
    let summary = BatchSummary::from_outcomes(&outcomes);
    info!(
        runs = summary.runs,
        challenger_wins = summary.challenger_wins,
        defender_wins = summary.defender_wins,
        timeouts = summary.timeouts,
        "batch finished"
    );
    Ok(BatchReport { outcomes, summary })
}
