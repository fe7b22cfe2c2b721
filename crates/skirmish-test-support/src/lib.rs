//! Shared test doubles and fixtures for the Skirmish combat kernel.

mod fixtures;
mod rng;
mod tracing;

pub use fixtures::{bleed, entity_id, poison, regen, sturdy_stats, training_stats};
pub use rng::{FixedRng, SequenceRng};
pub use tracing::init_tracing;
