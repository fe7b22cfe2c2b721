//! Kind-keyed event bus with snapshot dispatch and per-listener isolation.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use skirmish_core::event::{CombatEvent, EventKind};
use skirmish_core::rng::DeterministicRng;
use skirmish_state::StateManager;
use tracing::{debug, warn};

use crate::listener::{Listener, ReactionContext};

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(u64);

/// A listener invocation that returned an error or panicked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerFailure {
    /// Registration that failed.
    pub subscription: SubscriptionId,
    /// `Listener::name` of the failing listener.
    pub listener: String,
    /// Dotted type of the event being dispatched.
    pub event_type: String,
    /// Error or panic message.
    pub message: String,
    /// Whether the listener panicked rather than returning `Err`.
    pub panicked: bool,
}

/// Counts for one `dispatch` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Listeners invoked.
    pub invoked: usize,
    /// Invocations that failed.
    pub failed: usize,
}

#[derive(Clone)]
struct Registration {
    id: SubscriptionId,
    listener: Rc<dyn Listener>,
}

/// Single-threaded pub/sub hub for [`CombatEvent`]s.
///
/// Subscribing the same listener twice registers it twice: it is then
/// invoked twice per dispatch, and each `unsubscribe` removes one
/// registration.
#[derive(Default)]
pub struct EventBus {
    registrations: RefCell<BTreeMap<EventKind, Vec<Registration>>>,
    next_id: Cell<u64>,
    failures: RefCell<Vec<ListenerFailure>>,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: BTreeMap<EventKind, usize> = self
            .registrations
            .borrow()
            .iter()
            .map(|(kind, list)| (*kind, list.len()))
            .collect();
        f.debug_struct("EventBus")
            .field("registrations", &counts)
            .field("failures", &self.failures.borrow().len())
            .finish_non_exhaustive()
    }
}

impl EventBus {
    /// Creates a bus with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` for events of `kind`, after any existing ones.
    pub fn subscribe(&self, kind: EventKind, listener: Rc<dyn Listener>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        debug!(?kind, listener = listener.name(), subscription = id.0, "listener subscribed");
        self.registrations
            .borrow_mut()
            .entry(kind)
            .or_default()
            .push(Registration { id, listener });
        id
    }

    /// Removes the earliest registration of `listener` for `kind`.
    /// Returns whether one was found.
    pub fn unsubscribe<L: Listener + ?Sized>(&self, kind: EventKind, listener: &Rc<L>) -> bool {
        let mut registrations = self.registrations.borrow_mut();
        let Some(list) = registrations.get_mut(&kind) else {
            return false;
        };
        let position = list.iter().position(|registration| {
            std::ptr::addr_eq(Rc::as_ptr(&registration.listener), Rc::as_ptr(listener))
        });
        position.is_some_and(|index| {
            list.remove(index);
            true
        })
    }

    /// Removes the registration `id`, whatever its kind.
    pub fn unsubscribe_id(&self, id: SubscriptionId) -> bool {
        let mut registrations = self.registrations.borrow_mut();
        for list in registrations.values_mut() {
            if let Some(index) = list.iter().position(|registration| registration.id == id) {
                list.remove(index);
                return true;
            }
        }
        false
    }

    /// Number of registrations for `kind`.
    #[must_use]
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.registrations.borrow().get(&kind).map_or(0, Vec::len)
    }

    /// Invokes every listener registered for the event's kind, in
    /// registration order, over the list as it was when dispatch started.
    ///
    /// Failures are logged and recorded, never returned.
    pub fn dispatch(
        &self,
        event: &CombatEvent,
        state: &mut StateManager,
        rng: &mut dyn DeterministicRng,
    ) -> DispatchReport {
        let snapshot: Vec<Registration> = self
            .registrations
            .borrow()
            .get(&event.kind())
            .cloned()
            .unwrap_or_default();

        let mut report = DispatchReport::default();
        let mut ctx = ReactionContext {
            state,
            rng,
            bus: self,
        };
        for registration in &snapshot {
            report.invoked += 1;
            let listener = &registration.listener;
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| listener.on_event(event, &mut ctx)));
            let (message, panicked) = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => (err.to_string(), false),
                Err(payload) => (panic_message(payload.as_ref()), true),
            };

            report.failed += 1;
            warn!(
                listener = listener.name(),
                subscription = registration.id.0,
                event_type = event.event_type(),
                panicked,
                error = %message,
                "listener failed"
            );
            self.failures.borrow_mut().push(ListenerFailure {
                subscription: registration.id,
                listener: listener.name().to_owned(),
                event_type: event.event_type().to_owned(),
                message,
                panicked,
            });
        }
        report
    }

    /// Failures recorded so far.
    #[must_use]
    pub fn failures(&self) -> Vec<ListenerFailure> {
        self.failures.borrow().clone()
    }

    /// Drains the recorded failures.
    pub fn take_failures(&self) -> Vec<ListenerFailure> {
        self.failures.borrow_mut().drain(..).collect()
    }

    /// Drops every registration and recorded failure.
    pub fn clear(&self) {
        self.registrations.borrow_mut().clear();
        self.failures.borrow_mut().clear();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::ListenerError;
    use skirmish_core::event::EntityEvent;
    use skirmish_test_support::{FixedRng, entity_id, init_tracing};

    #[derive(Default)]
    struct Counter {
        calls: Cell<u32>,
    }

    impl Listener for Counter {
        fn name(&self) -> &str {
            "counter"
        }

        fn on_event(&self, _: &CombatEvent, _: &mut ReactionContext<'_>) -> Result<(), ListenerError> {
            self.calls.set(self.calls.get() + 1);
            Ok(())
        }
    }

    struct Failing;

    impl Listener for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn on_event(&self, _: &CombatEvent, _: &mut ReactionContext<'_>) -> Result<(), ListenerError> {
            Err(ListenerError::Failed("always fails".to_owned()))
        }
    }

    struct Panicking;

    impl Listener for Panicking {
        fn on_event(&self, _: &CombatEvent, _: &mut ReactionContext<'_>) -> Result<(), ListenerError> {
            panic!("listener exploded");
        }
    }

    /// Subscribes `late` the first time it runs.
    struct Recruiter {
        late: Rc<Counter>,
        done: Cell<bool>,
    }

    impl Listener for Recruiter {
        fn on_event(&self, _: &CombatEvent, ctx: &mut ReactionContext<'_>) -> Result<(), ListenerError> {
            if !self.done.replace(true) {
                ctx.bus.subscribe(EventKind::EntitySpawn, self.late.clone());
            }
            Ok(())
        }
    }

    /// Unsubscribes `victim` the first time it runs.
    struct Dismisser {
        victim: Rc<Counter>,
    }

    impl Listener for Dismisser {
        fn on_event(&self, _: &CombatEvent, ctx: &mut ReactionContext<'_>) -> Result<(), ListenerError> {
            ctx.bus.unsubscribe(EventKind::EntitySpawn, &self.victim);
            Ok(())
        }
    }

    fn spawn() -> CombatEvent {
        CombatEvent::EntitySpawn(EntityEvent {
            entity_id: entity_id(1),
        })
    }

    fn dispatch(bus: &EventBus) -> DispatchReport {
        bus.dispatch(&spawn(), &mut StateManager::new(), &mut FixedRng::never())
    }

    #[test]
    fn test_failing_listener_does_not_stop_the_next_one() {
        // Arrange
        init_tracing();
        let bus = EventBus::new();
        let counter = Rc::new(Counter::default());
        bus.subscribe(EventKind::EntitySpawn, Rc::new(Failing));
        bus.subscribe(EventKind::EntitySpawn, counter.clone());

        // Act
        let report = dispatch(&bus);

        // Assert
        assert_eq!(report, DispatchReport { invoked: 2, failed: 1 });
        assert_eq!(counter.calls.get(), 1);
        let failures = bus.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].listener, "failing");
        assert_eq!(failures[0].event_type, "entity.spawn");
        assert!(!failures[0].panicked);
    }

    #[test]
    fn test_panicking_listener_is_contained() {
        init_tracing();
        let bus = EventBus::new();
        let counter = Rc::new(Counter::default());
        bus.subscribe(EventKind::EntitySpawn, Rc::new(Panicking));
        bus.subscribe(EventKind::EntitySpawn, counter.clone());

        let report = dispatch(&bus);

        assert_eq!(report.failed, 1);
        assert_eq!(counter.calls.get(), 1);
        let failure = &bus.take_failures()[0];
        assert!(failure.panicked);
        assert_eq!(failure.message, "listener exploded");
        assert!(bus.failures().is_empty());
    }

    #[test]
    fn test_subscription_during_dispatch_applies_next_time() {
        // Arrange
        let bus = EventBus::new();
        let late = Rc::new(Counter::default());
        bus.subscribe(
            EventKind::EntitySpawn,
            Rc::new(Recruiter {
                late: late.clone(),
                done: Cell::new(false),
            }),
        );

        // Act
        let first = dispatch(&bus);
        let second = dispatch(&bus);

        // Assert
        assert_eq!(first.invoked, 1);
        assert_eq!(second.invoked, 2);
        assert_eq!(late.calls.get(), 1);
    }

    #[test]
    fn test_unsubscribe_during_dispatch_applies_next_time() {
        // Arrange
        let bus = EventBus::new();
        let victim = Rc::new(Counter::default());
        bus.subscribe(
            EventKind::EntitySpawn,
            Rc::new(Dismisser {
                victim: victim.clone(),
            }),
        );
        bus.subscribe(EventKind::EntitySpawn, victim.clone());

        // Act
        let first = dispatch(&bus);
        let second = dispatch(&bus);

        // Assert
        assert_eq!(first.invoked, 2);
        assert_eq!(second.invoked, 1);
        assert_eq!(victim.calls.get(), 1);
        assert_eq!(bus.listener_count(EventKind::EntitySpawn), 1);
    }

    #[test]
    fn test_duplicate_subscription_is_invoked_twice() {
        let bus = EventBus::new();
        let counter = Rc::new(Counter::default());
        bus.subscribe(EventKind::EntitySpawn, counter.clone());
        bus.subscribe(EventKind::EntitySpawn, counter.clone());

        dispatch(&bus);
        assert_eq!(counter.calls.get(), 2);

        assert!(bus.unsubscribe(EventKind::EntitySpawn, &counter));
        dispatch(&bus);
        assert_eq!(counter.calls.get(), 3);
    }

    #[test]
    fn test_unsubscribe_by_id_and_unknown_listener() {
        let bus = EventBus::new();
        let counter = Rc::new(Counter::default());
        let id = bus.subscribe(EventKind::EntitySpawn, counter.clone());

        assert!(!bus.unsubscribe(EventKind::EntityDeath, &counter));
        assert!(bus.unsubscribe_id(id));
        assert!(!bus.unsubscribe_id(id));
        assert_eq!(bus.listener_count(EventKind::EntitySpawn), 0);
    }

    #[test]
    fn test_other_kinds_are_not_invoked() {
        let bus = EventBus::new();
        let counter = Rc::new(Counter::default());
        bus.subscribe(EventKind::EntityDeath, counter.clone());

        let report = dispatch(&bus);

        assert_eq!(report.invoked, 0);
        assert_eq!(counter.calls.get(), 0);
    }
}
