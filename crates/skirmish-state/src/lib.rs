//! Skirmish — State Manager.
//!
//! The single writer of every entity's dynamic state: lifecycle, health,
//! resource, cooldowns, roll modifiers, and active effects. Time only moves
//! through [`StateManager::update`]. Every observable change is queued as a
//! [`CombatEvent`](skirmish_core::event::CombatEvent) in an outbox that the
//! caller drains into the event bus.

pub mod application;
pub mod domain;

pub use application::query_handlers::EntityView;
pub use application::state_manager::StateManager;
pub use domain::entity::{EffectApplication, EffectOutcome};
pub use domain::modifiers::RollModifier;
