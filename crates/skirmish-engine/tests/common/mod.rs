//! Shared listeners and builders for engine integration tests.
#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use skirmish_core::content::{EffectDefinition, SkillDefinition, Trigger, TriggerTarget};
use skirmish_core::event::{CombatEvent, EventKind};
use skirmish_events::{Listener, ListenerError, ReactionContext};

/// Records every event it receives.
#[derive(Debug, Default)]
pub struct Recorder {
    events: RefCell<Vec<CombatEvent>>,
}

impl Recorder {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn events(&self) -> Vec<CombatEvent> {
        self.events.borrow().clone()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.events.borrow().iter().filter(|e| e.kind() == kind).count()
    }
}

impl Listener for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    fn on_event(
        &self,
        event: &CombatEvent,
        _ctx: &mut ReactionContext<'_>,
    ) -> Result<(), ListenerError> {
        self.events.borrow_mut().push(event.clone());
        Ok(())
    }
}

/// Always returns an error.
#[derive(Debug)]
pub struct Failing;

impl Listener for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    fn on_event(
        &self,
        _event: &CombatEvent,
        _ctx: &mut ReactionContext<'_>,
    ) -> Result<(), ListenerError> {
        Err(ListenerError::Failed("always fails".to_owned()))
    }
}

/// Always panics.
#[derive(Debug)]
pub struct Panicking;

impl Listener for Panicking {
    fn name(&self) -> &str {
        "panicking"
    }

    fn on_event(
        &self,
        _event: &CombatEvent,
        _ctx: &mut ReactionContext<'_>,
    ) -> Result<(), ListenerError> {
        panic!("listener blew up");
    }
}

/// A basic attack that always applies `effect` to its target on hit.
pub fn attack_applying(id: &str, effect: EffectDefinition) -> SkillDefinition {
    SkillDefinition {
        triggers: vec![Trigger {
            on: EventKind::OnHit,
            proc_rate: 1.0,
            effect,
            stacks: 1,
            duration: None,
            target: TriggerTarget::EventTarget,
        }],
        ..SkillDefinition::basic_attack(id)
    }
}
