//! Configuration-driven reactive effects.
//!
//! Every "when X happens, maybe apply effect Y" reaction is one
//! [`ReactiveEffectConfig`] value run by the same handler type.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use skirmish_core::content::{EffectDefinition, TriggerTarget};
use skirmish_core::effect::EffectInstance;
use skirmish_core::error::DomainError;
use skirmish_core::event::{CombatEvent, EventKind};
use skirmish_core::stats::clamp_probability;
use tracing::{debug, info};
use uuid::Uuid;

use crate::bus::{EventBus, SubscriptionId};
use crate::listener::{Listener, ListenerError, ReactionContext};

fn default_stacks() -> u32 {
    1
}

/// One reactive effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactiveEffectConfig {
    /// Handler name, used in logs.
    pub name: String,
    /// Event kind that can set it off.
    pub listen_for: EventKind,
    /// Probability of applying the effect per matching event.
    pub proc_rate: f64,
    /// Effect applied on a successful proc.
    pub effect: EffectDefinition,
    /// Stacks applied per proc.
    #[serde(default = "default_stacks")]
    pub stacks: u32,
    /// Overrides the definition's duration when set.
    #[serde(default)]
    pub duration: Option<f64>,
    /// Who receives the effect.
    #[serde(default)]
    pub target: TriggerTarget,
    /// Message logged on a proc. Placeholders: `{source}`, `{target}`,
    /// `{effect}`, `{stacks}`.
    #[serde(default)]
    pub message_template: Option<String>,
}

/// Parses a YAML list of reactive effect configs.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the document cannot be parsed or a
/// proc rate lies outside `[0, 1]`.
pub fn load_reactive_effects(source: &str) -> Result<Vec<ReactiveEffectConfig>, DomainError> {
    let configs: Vec<ReactiveEffectConfig> = serde_yaml::from_str(source)
        .map_err(|e| DomainError::Validation(format!("invalid reactive effects: {e}")))?;
    if let Some(bad) = configs
        .iter()
        .find(|config| !(0.0..=1.0).contains(&config.proc_rate))
    {
        return Err(DomainError::Validation(format!(
            "reactive effect {} has proc_rate {} outside [0, 1]",
            bad.name, bad.proc_rate
        )));
    }
    Ok(configs)
}

/// The single listener type behind every reactive effect.
#[derive(Debug, Clone)]
pub struct ReactiveEffectHandler {
    config: ReactiveEffectConfig,
}

impl ReactiveEffectHandler {
    /// Creates a handler for `config`.
    #[must_use]
    pub fn new(config: ReactiveEffectConfig) -> Self {
        Self { config }
    }

    /// The handler's configuration.
    #[must_use]
    pub fn config(&self) -> &ReactiveEffectConfig {
        &self.config
    }

    /// Subscribes the handler to its configured event kind.
    pub fn register(self: Rc<Self>, bus: &EventBus) -> SubscriptionId {
        bus.subscribe(self.config.listen_for, self)
    }

    /// Renders the message template, if any.
    #[must_use]
    pub fn render_message(&self, source: Uuid, target: Uuid, stacks: u32) -> Option<String> {
        self.config.message_template.as_ref().map(|template| {
            template
                .replace("{source}", &source.to_string())
                .replace("{target}", &target.to_string())
                .replace("{effect}", &self.config.effect.id)
                .replace("{stacks}", &stacks.to_string())
        })
    }
}

impl Listener for ReactiveEffectHandler {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn on_event(
        &self,
        event: &CombatEvent,
        ctx: &mut ReactionContext<'_>,
    ) -> Result<(), ListenerError> {
        if event.kind() != self.config.listen_for {
            return Ok(());
        }
        let recipient = match self.config.target {
            TriggerTarget::EventTarget => event.target(),
            TriggerTarget::EventSource => event.source(),
        };
        let Some(target) = recipient.filter(|id| ctx.state.is_alive(*id)) else {
            return Ok(());
        };
        if ctx.rng.uniform() >= clamp_probability(self.config.proc_rate) {
            return Ok(());
        }

        let source = event.source().unwrap_or(target);
        let effect = EffectInstance::from_definition(
            &self.config.effect,
            source,
            self.config.stacks,
            self.config.duration,
            &mut *ctx.rng,
        );
        let application = ctx.state.apply_effect(target, effect)?;
        debug!(
            handler = %self.config.name,
            %target,
            stacks = application.stacks,
            "reactive effect applied"
        );
        if let Some(message) = self.render_message(source, target, application.stacks) {
            info!(handler = %self.config.name, "{message}");
        }
        Ok(())
    }
}
