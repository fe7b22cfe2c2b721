//! Duel scenarios and their outcomes.

use serde::{Deserialize, Serialize};
use skirmish_core::config::CombatConfig;
use skirmish_core::content::{EntityTemplate, SkillDefinition};
use skirmish_core::error::DomainError;
use skirmish_events::ReactiveEffectConfig;
use uuid::Uuid;

/// Id the challenger is registered under.
pub const CHALLENGER_ID: Uuid = Uuid::from_u128(1);
/// Id the defender is registered under.
pub const DEFENDER_ID: Uuid = Uuid::from_u128(2);

/// One side of a duel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuelCombatant {
    /// Display name.
    pub name: String,
    /// Stats and item triggers.
    pub template: EntityTemplate,
    /// Skills in priority order; each swing uses the first one available.
    pub skills: Vec<SkillDefinition>,
}

/// A repeatable one-on-one fight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuelScenario {
    /// Swings first on ties.
    pub challenger: DuelCombatant,
    /// The other side.
    pub defender: DuelCombatant,
    /// Combat configuration.
    #[serde(default)]
    pub config: CombatConfig,
    /// Reactive effects active in the fight.
    #[serde(default)]
    pub reactive_effects: Vec<ReactiveEffectConfig>,
    /// Seconds per simulation step.
    #[serde(default = "DuelScenario::default_time_step")]
    pub time_step: f64,
    /// Simulated seconds before the duel is called a timeout.
    #[serde(default = "DuelScenario::default_max_time")]
    pub max_time: f64,
    /// Steps before the duel is called a timeout.
    #[serde(default = "DuelScenario::default_max_steps")]
    pub max_steps: u32,
}

impl DuelScenario {
    fn default_time_step() -> f64 {
        0.1
    }

    fn default_max_time() -> f64 {
        300.0
    }

    fn default_max_steps() -> u32 {
        100_000
    }

    /// A scenario with default limits.
    #[must_use]
    pub fn new(challenger: DuelCombatant, defender: DuelCombatant) -> Self {
        Self {
            challenger,
            defender,
            config: CombatConfig::default(),
            reactive_effects: Vec::new(),
            time_step: Self::default_time_step(),
            max_time: Self::default_max_time(),
            max_steps: Self::default_max_steps(),
        }
    }

    /// Parses and validates a YAML scenario.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the document cannot be parsed or
    /// fails [`Self::validate`].
    pub fn from_yaml_str(source: &str) -> Result<Self, DomainError> {
        let scenario: Self = serde_yaml::from_str(source)
            .map_err(|e| DomainError::Validation(format!("invalid duel scenario: {e}")))?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Checks limits and configuration.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a non-positive time step or
    /// time limit, or an invalid combat configuration.
    pub fn validate(&self) -> Result<(), DomainError> {
        if !(self.time_step.is_finite() && self.time_step > 0.0) {
            return Err(DomainError::Validation(format!(
                "time_step must be positive, got {}",
                self.time_step
            )));
        }
        if self.max_time.is_nan() || self.max_time <= 0.0 {
            return Err(DomainError::Validation(format!(
                "max_time must be positive, got {}",
                self.max_time
            )));
        }
        self.config.validate()
    }
}

/// How a duel ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuelWinner {
    /// Only the challenger is standing.
    Challenger,
    /// Only the defender is standing.
    Defender,
    /// Both died in the same step.
    Draw,
    /// Both survived the time or step limit.
    Timeout,
}

/// Result of one seeded duel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuelOutcome {
    /// Seed the duel ran with.
    pub seed: u64,
    /// Result.
    pub winner: DuelWinner,
    /// Simulated seconds.
    pub elapsed: f64,
    /// Steps taken.
    pub steps: u32,
    /// Challenger health at the end.
    pub challenger_health: f64,
    /// Defender health at the end.
    pub defender_health: f64,
    /// Skill uses executed by both sides.
    pub skill_uses: u32,
    /// Hits resolved by both sides.
    pub hits: usize,
    /// Listener failures recorded during the duel.
    pub listener_failures: usize,
    /// State fingerprint at the end.
    pub fingerprint: [u8; 32],
}

/// Aggregate statistics over a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Duels run.
    pub runs: usize,
    /// Challenger wins.
    pub challenger_wins: usize,
    /// Defender wins.
    pub defender_wins: usize,
    /// Draws.
    pub draws: usize,
    /// Timeouts.
    pub timeouts: usize,
    /// Mean simulated duration.
    pub mean_elapsed: f64,
}

impl BatchSummary {
    /// Summarises `outcomes`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_outcomes(outcomes: &[DuelOutcome]) -> Self {
        let mut summary = Self {
            runs: outcomes.len(),
            ..Self::default()
        };
        for outcome in outcomes {
            match outcome.winner {
                DuelWinner::Challenger => summary.challenger_wins += 1,
                DuelWinner::Defender => summary.defender_wins += 1,
                DuelWinner::Draw => summary.draws += 1,
                DuelWinner::Timeout => summary.timeouts += 1,
            }
        }
        if !outcomes.is_empty() {
            summary.mean_elapsed =
                outcomes.iter().map(|o| o.elapsed).sum::<f64>() / outcomes.len() as f64;
        }
        summary
    }

    /// Fraction of duels the challenger won.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn challenger_win_rate(&self) -> f64 {
        if self.runs == 0 {
            0.0
        } else {
            self.challenger_wins as f64 / self.runs as f64
        }
    }
}
