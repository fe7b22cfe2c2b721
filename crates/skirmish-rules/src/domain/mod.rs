//! Domain types and pure calculators.

pub mod actions;
pub mod hit_resolver;
