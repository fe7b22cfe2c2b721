//! Skirmish Core — shared value types and abstractions.
//!
//! This crate defines the immutable inputs and outputs that every other
//! Skirmish crate speaks: entity stats, content definitions, effect
//! instances, hit contexts, combat events, the deterministic RNG contract,
//! and the combat configuration. It contains no mutable simulation state.

pub mod config;
pub mod content;
pub mod effect;
pub mod error;
pub mod event;
pub mod hit;
pub mod rng;
pub mod snapshot;
pub mod stats;
