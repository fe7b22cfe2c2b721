//! Skirmish — Rules & Resolution.
//!
//! Responsible for turning a skill use into hit contexts and an ordered list
//! of intended actions. Everything here is a pure function of its inputs and
//! the injected RNG: nothing is mutated and no entity state is consulted
//! beyond the snapshots handed in.

pub mod application;
pub mod domain;

pub use application::skill_resolver::{SkillUseRequest, calculate_skill_use};
pub use domain::actions::{Action, SkillUseResult};
pub use domain::hit_resolver::{HitInput, resolve_hit};
