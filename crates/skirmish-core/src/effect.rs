//! Runtime effect instances.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::content::EffectDefinition;
use crate::rng::DeterministicRng;

/// A live instance of an [`EffectDefinition`] on one entity.
///
/// The tick accumulator is reduced by `tick_interval` on every tick so that
/// fractional time carries into the next `update`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectInstance {
    /// Instance identifier.
    pub instance_id: Uuid,
    /// Definition this instance came from.
    pub definition_id: String,
    /// Entity that applied the effect.
    pub source: Uuid,
    /// Seconds left before expiry.
    pub time_remaining: f64,
    /// Full duration, restored on refresh.
    pub duration: f64,
    /// Seconds between ticks; non-positive never ticks.
    pub tick_interval: f64,
    /// Time accumulated since the last tick.
    pub accumulator: f64,
    /// Current stack count.
    pub stacks: u32,
    /// Stack cap copied from the definition.
    pub max_stacks: Option<u32>,
    /// Damage per tick per stack; negative heals.
    pub magnitude: f64,
    /// Whether the instance is removed when `time_remaining` reaches zero.
    pub expires_at_zero: bool,
}

impl EffectInstance {
    /// Builds a fresh instance of `definition`.
    ///
    /// The instance id is drawn from `rng` so replays reproduce it.
    /// `stacks` is raised to at least one and capped by the definition.
    pub fn from_definition(
        definition: &EffectDefinition,
        source: Uuid,
        stacks: u32,
        duration: Option<f64>,
        rng: &mut dyn DeterministicRng,
    ) -> Self {
        let duration = duration.unwrap_or(definition.duration).max(0.0);
        let stacks = stacks.max(1);
        Self {
            instance_id: Uuid::from_u64_pair(rng.next_u64(), rng.next_u64()),
            definition_id: definition.id.clone(),
            source,
            time_remaining: duration,
            duration,
            tick_interval: definition.tick_interval,
            accumulator: 0.0,
            stacks: definition.max_stacks.map_or(stacks, |cap| stacks.min(cap.max(1))),
            max_stacks: definition.max_stacks,
            magnitude: definition.magnitude,
            expires_at_zero: definition.expires_at_zero,
        }
    }

    /// Whether this instance ticks at all.
    #[must_use]
    pub fn ticks(&self) -> bool {
        self.tick_interval > 0.0 && self.tick_interval.is_finite()
    }

    /// Damage (or healing, if negative) dealt by one tick.
    #[must_use]
    pub fn tick_amount(&self) -> f64 {
        self.magnitude * f64::from(self.stacks)
    }

    /// Adds `stacks`, respecting the cap, and restores the full duration.
    /// Returns the new stack count.
    pub fn refresh(&mut self, stacks: u32) -> u32 {
        let stacked = self.stacks.saturating_add(stacks);
        self.stacks = self.max_stacks.map_or(stacked, |cap| stacked.min(cap.max(1)));
        self.time_remaining = self.duration;
        self.stacks
    }

    /// Advances the timers by `delta` and returns how many ticks fired.
    ///
    /// Order is fixed: decrement time, then drain the accumulator, so an
    /// instance can tick on the instant it runs out. The whole step counts
    /// toward ticks even when it overshoots the remaining time.
    pub fn advance(&mut self, delta: f64) -> u32 {
        if self.expires_at_zero {
            self.time_remaining -= delta;
        }
        if !self.ticks() {
            return 0;
        }

        self.accumulator += delta;
        let mut fired = 0;
        while self.accumulator >= self.tick_interval {
            self.accumulator -= self.tick_interval;
            fired += 1;
        }
        fired
    }

    /// Whether the instance should be removed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at_zero && self.time_remaining <= 0.0
    }
}
