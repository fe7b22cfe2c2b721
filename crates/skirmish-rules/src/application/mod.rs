//! Application-level resolution built on the domain calculators.

pub mod skill_resolver;
