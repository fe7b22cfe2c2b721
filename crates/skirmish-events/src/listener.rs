//! The listener contract.

use skirmish_core::error::DomainError;
use skirmish_core::event::CombatEvent;
use skirmish_core::rng::DeterministicRng;
use skirmish_state::StateManager;
use thiserror::Error;

use crate::bus::EventBus;

/// Why a listener invocation failed.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// A State Manager call was rejected.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The listener gave up for its own reasons.
    #[error("listener failed: {0}")]
    Failed(String),
}

/// What a listener may touch while reacting to an event.
pub struct ReactionContext<'a> {
    /// The only route to entity state.
    pub state: &'a mut StateManager,
    /// The simulation's random source.
    pub rng: &'a mut dyn DeterministicRng,
    /// The dispatching bus; subscription changes apply from the next dispatch.
    pub bus: &'a EventBus,
}

/// Something that reacts to combat events.
///
/// Listeners are shared as `Rc<dyn Listener>`; ones that keep their own
/// bookkeeping use interior mutability.
pub trait Listener {
    /// Name used in logs and failure records.
    fn name(&self) -> &str {
        "listener"
    }

    /// Reacts to `event`.
    ///
    /// # Errors
    ///
    /// Any error is caught by the bus, logged, and recorded.
    fn on_event(
        &self,
        event: &CombatEvent,
        ctx: &mut ReactionContext<'_>,
    ) -> Result<(), ListenerError>;
}
