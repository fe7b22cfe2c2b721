//! Entropy safeguard: bounds long dodge streaks.
//!
//! After an entity dodges, its evasion and dodge chances drop by the
//! configured penalty until the next hit lands on it or the penalty times
//! out. Repeated dodges replace the penalty rather than deepening it.

use std::rc::Rc;

use skirmish_core::config::EntropySafeguardConfig;
use skirmish_core::event::{CombatEvent, EventKind};
use skirmish_core::snapshot::RollKind;
use skirmish_state::RollModifier;
use tracing::debug;

use crate::bus::{EventBus, SubscriptionId};
use crate::listener::{Listener, ListenerError, ReactionContext};

/// Source tag on every modifier the safeguard places.
pub const ENTROPY_SAFEGUARD_TAG: &str = "entropy_safeguard";

/// Listener implementing the safeguard.
#[derive(Debug, Clone)]
pub struct EntropySafeguard {
    config: EntropySafeguardConfig,
}

impl EntropySafeguard {
    /// Creates the listener. It does nothing until registered.
    #[must_use]
    pub fn new(config: EntropySafeguardConfig) -> Self {
        Self { config }
    }

    /// Subscribes to `OnDodge` and `OnHit`.
    pub fn register(self: Rc<Self>, bus: &EventBus) -> [SubscriptionId; 2] {
        [
            bus.subscribe(EventKind::OnDodge, self.clone()),
            bus.subscribe(EventKind::OnHit, self),
        ]
    }
}

impl Listener for EntropySafeguard {
    fn name(&self) -> &str {
        ENTROPY_SAFEGUARD_TAG
    }

    fn on_event(
        &self,
        event: &CombatEvent,
        ctx: &mut ReactionContext<'_>,
    ) -> Result<(), ListenerError> {
        match event {
            CombatEvent::OnDodge(dodge) if ctx.state.is_alive(dodge.defender) => {
                ctx.state
                    .clear_roll_modifiers(dodge.defender, ENTROPY_SAFEGUARD_TAG)?;
                for kind in [RollKind::Evasion, RollKind::Dodge] {
                    ctx.state.add_roll_modifier(
                        dodge.defender,
                        RollModifier {
                            kind,
                            value: -self.config.penalty,
                            source_tag: ENTROPY_SAFEGUARD_TAG.to_owned(),
                            time_remaining: Some(self.config.duration),
                        },
                    )?;
                }
                debug!(entity_id = %dodge.defender, penalty = self.config.penalty, "safeguard armed");
            }
            CombatEvent::OnHit(hit) if ctx.state.is_alive(hit.defender) => {
                let cleared = ctx
                    .state
                    .clear_roll_modifiers(hit.defender, ENTROPY_SAFEGUARD_TAG)?;
                if cleared > 0 {
                    debug!(entity_id = %hit.defender, "safeguard cleared");
                }
            }
            _ => {}
        }
        Ok(())
    }
}
