//! Skirmish — orchestration and simulation drivers.
//!
//! Executes skill-use results against the State Manager and Event Bus,
//! wraps one self-contained simulation behind [`Simulation`], and runs
//! independent duels in parallel for balance analysis.

pub mod application;
pub mod domain;
pub mod pool;

pub use application::batch::{BatchReport, batch_seeds, run_batch, run_duel};
pub use application::orchestrator::{ExecutionReport, PumpReport, execute_skill_use, pump_events};
pub use application::simulation::{Simulation, SimulationBuilder, SkillUseOutcome};
pub use domain::duel::{BatchSummary, DuelCombatant, DuelOutcome, DuelScenario, DuelWinner};
pub use pool::WorkerPool;
