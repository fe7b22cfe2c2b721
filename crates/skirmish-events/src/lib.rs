//! Skirmish — Event Bus and Reactive Effect Handlers.
//!
//! Listeners subscribe per [`EventKind`](skirmish_core::event::EventKind).
//! Dispatch runs over a snapshot of the listener list and isolates every
//! invocation, so one failing listener never stops the others or the
//! caller. Listeners mutate the world only through the State Manager
//! handed to them in a [`ReactionContext`].

pub mod bus;
pub mod handlers;
pub mod listener;
pub mod safeguard;

pub use bus::{DispatchReport, EventBus, ListenerFailure, SubscriptionId};
pub use handlers::{ReactiveEffectConfig, ReactiveEffectHandler, load_reactive_effects};
pub use listener::{Listener, ListenerError, ReactionContext};
pub use safeguard::{ENTROPY_SAFEGUARD_TAG, EntropySafeguard};
