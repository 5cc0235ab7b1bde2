//! Crossfading state machine over registered blend trees.
//!
//! Exactly one state is `current` and is driven toward influence 1; any number of
//! previously current states are `fading` toward 0. A state appears in at most one of
//! the two. Transitions are triggered three ways:
//!
//! - by name, through [`StateMachine::handle_event`];
//! - by data, polled at the start of every [`StateMachine::update`];
//! - automatically, when the current state reports a loop or one-shot completion.
//!
//! `update` runs the frame in a fixed order: data transitions, crossfade (which pushes
//! clip weights), mixer advance, state ticks, event relay, automatic transitions.

use std::fmt;

use hashbrown::HashMap;
use serde_json::Value as JsonValue;

use crate::error::BlendError;
use crate::event::{AnimationEvent, EventEmitter, EventKind, ListenerId};
use crate::ids::{IdAllocator, StateId};
use crate::mixer::{ClipMixer, Mixer};
use crate::node::{AnimationNode, AnimationTree};
use crate::numeric::{ensure_non_negative, lerp};
use crate::Result;

/// Guard evaluated with the trigger's arguments.
pub type Condition = Box<dyn Fn(&[JsonValue]) -> bool>;

/// Options for a transition registration.
pub struct TransitionCfg {
    pub to: StateId,
    pub duration: f32,
    pub from: Option<StateId>,
    pub condition: Option<Condition>,
    /// Argument handed to a data transition's condition.
    pub data: Option<JsonValue>,
}

impl TransitionCfg {
    pub fn new(to: StateId, duration: f32) -> Self {
        Self {
            to,
            duration,
            from: None,
            condition: None,
            data: None,
        }
    }

    /// Only fire while `from` is current. Event transitions without it match any state.
    pub fn from(mut self, from: StateId) -> Self {
        self.from = Some(from);
        self
    }

    pub fn when(mut self, condition: impl Fn(&[JsonValue]) -> bool + 'static) -> Self {
        self.condition = Some(Box::new(condition));
        self
    }

    pub fn with_data(mut self, data: JsonValue) -> Self {
        self.data = Some(data);
        self
    }
}

impl fmt::Debug for TransitionCfg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionCfg")
            .field("to", &self.to)
            .field("duration", &self.duration)
            .field("from", &self.from)
            .field("condition", &self.condition.is_some())
            .field("data", &self.data)
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Trigger {
    Event(String),
    Data,
    Automatic,
}

impl Trigger {
    fn label(&self) -> &str {
        match self {
            Trigger::Event(name) => name.as_str(),
            Trigger::Data => "data",
            Trigger::Automatic => "automatic",
        }
    }
}

struct Transition {
    trigger: Trigger,
    from: Option<StateId>,
    to: StateId,
    duration: f32,
    condition: Option<Condition>,
    data: Option<JsonValue>,
}

impl Transition {
    fn matches(&self, current: StateId, args: &[JsonValue]) -> bool {
        self.from.map_or(true, |from| from == current)
            && self.condition.as_ref().map_or(true, |cond| cond(args))
    }
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("trigger", &self.trigger)
            .field("from", &self.from)
            .field("to", &self.to)
            .field("duration", &self.duration)
            .field("condition", &self.condition.is_some())
            .finish()
    }
}

#[derive(Debug)]
pub struct StateMachine<M: Mixer = ClipMixer> {
    ids: IdAllocator,
    /// Indexed by `StateId`.
    states: Vec<AnimationNode>,
    current: StateId,
    fading: Vec<StateId>,
    transition_time_left: f32,
    transitions: Vec<Transition>,
    /// Event name → indices into `transitions`, in registration order.
    by_event: HashMap<String, Vec<usize>>,
    mixer: M,
    emitter: EventEmitter,
}

impl<M: Mixer> StateMachine<M> {
    /// Register `initial` as the current state at full influence and enter it.
    pub fn new(initial: impl Into<AnimationNode>, mixer: M) -> Result<Self> {
        let mut machine = Self {
            ids: IdAllocator::new(),
            states: Vec::new(),
            current: StateId(0),
            fading: Vec::new(),
            transition_time_left: 0.0,
            transitions: Vec::new(),
            by_event: HashMap::new(),
            mixer,
            emitter: EventEmitter::new(),
        };
        let current = machine.add_state(initial);
        machine.current = current;
        let node = &mut machine.states[current.0 as usize];
        node.set_influence(1.0)?;
        node.on_enter();
        machine.relay_events();
        Ok(machine)
    }

    /// Register a tree that transitions can target. It stays at its current influence
    /// (0 for a freshly built tree) until it becomes current.
    pub fn add_state(&mut self, node: impl Into<AnimationNode>) -> StateId {
        let id = self.ids.alloc_state();
        self.states.push(node.into());
        id
    }

    pub fn state(&self, id: StateId) -> Option<&AnimationNode> {
        self.states.get(id.0 as usize)
    }

    pub fn state_mut(&mut self, id: StateId) -> Option<&mut AnimationNode> {
        self.states.get_mut(id.0 as usize)
    }

    pub fn current(&self) -> StateId {
        self.current
    }

    pub fn fading(&self) -> &[StateId] {
        &self.fading
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition_time_left > 0.0
    }

    pub fn transition_time_left(&self) -> f32 {
        self.transition_time_left
    }

    pub fn mixer(&self) -> &M {
        &self.mixer
    }

    pub fn mixer_mut(&mut self) -> &mut M {
        &mut self.mixer
    }

    /// Listen to every event relayed from the machine's states.
    pub fn on(
        &mut self,
        kind: EventKind,
        handler: impl FnMut(&AnimationEvent) + 'static,
    ) -> ListenerId {
        self.emitter.on(kind, handler)
    }

    pub fn once(
        &mut self,
        kind: EventKind,
        handler: impl FnMut(&AnimationEvent) + 'static,
    ) -> ListenerId {
        self.emitter.once(kind, handler)
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        self.emitter.off(id)
    }

    /// Take the events relayed since the last drain.
    pub fn drain_events(&mut self) -> Vec<AnimationEvent> {
        self.emitter.drain()
    }

    /// Transition on `name`. Without `from`, the transition fires from any current state.
    pub fn add_event_transition(&mut self, name: &str, cfg: TransitionCfg) -> Result<()> {
        let index = self.register(Trigger::Event(name.to_string()), cfg)?;
        self.by_event.entry(name.to_string()).or_default().push(index);
        Ok(())
    }

    /// Transition polled every `update` while `from` is current. The condition is required
    /// and receives the configured data, if any.
    pub fn add_data_transition(&mut self, from: StateId, cfg: TransitionCfg) -> Result<()> {
        if cfg.condition.is_none() {
            return Err(BlendError::MissingCondition);
        }
        self.register(Trigger::Data, cfg.from(from)).map(|_| ())
    }

    /// Transition fired when `from` is current and reports `Iterate` or `Finish`.
    pub fn add_automatic_transition(&mut self, from: StateId, cfg: TransitionCfg) -> Result<()> {
        self.register(Trigger::Automatic, cfg.from(from)).map(|_| ())
    }

    /// Fire the first transition registered under `name` whose `from` matches the current
    /// state and whose condition accepts `args`. Returns whether one fired.
    pub fn handle_event(&mut self, name: &str, args: &[JsonValue]) -> Result<bool> {
        let current = self.current;
        let found = self.by_event.get(name).and_then(|indices| {
            indices
                .iter()
                .map(|&i| &self.transitions[i])
                .find(|t| t.matches(current, args))
                .map(|t| (t.to, t.duration))
        });
        match found {
            Some((to, duration)) => {
                log::debug!("event {name:?} fired transition {current:?} -> {to:?}");
                self.transition_to(to, duration)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Make `to` current and crossfade over `duration` seconds. A no-op if `to` is
    /// already current; zero duration completes the crossfade immediately.
    pub fn transition_to(&mut self, to: StateId, duration: f32) -> Result<()> {
        let duration = ensure_non_negative("transition duration", duration)?;
        self.ensure_state(to)?;
        if to == self.current {
            return Ok(());
        }
        let previous = self.current;
        log::debug!("transition {previous:?} -> {to:?} over {duration}s");

        self.fading.retain(|&s| s != to && s != previous);
        self.fading.push(previous);
        self.current = to;
        self.transition_time_left = duration;

        self.states[previous.0 as usize].on_exit();
        self.states[to.0 as usize].on_enter();
        if duration == 0.0 {
            self.finish_crossfade()?;
        }
        self.relay_events();
        Ok(())
    }

    /// Advance one frame by `dt` seconds.
    pub fn update(&mut self, dt: f32) -> Result<()> {
        let dt = ensure_non_negative("delta time", dt)?;

        self.poll_data_transitions()?;
        self.crossfade(dt)?;
        self.mixer.advance(dt);

        let current = self.current;
        self.states[current.0 as usize].tick(dt);
        for &id in &self.fading {
            self.states[id.0 as usize].tick(dt);
        }

        let completed = self.relay_events();
        if completed {
            self.fire_automatic_transition(current)?;
        }
        Ok(())
    }

    fn register(&mut self, trigger: Trigger, cfg: TransitionCfg) -> Result<usize> {
        let duration = ensure_non_negative("transition duration", cfg.duration)?;
        self.ensure_state(cfg.to)?;
        if let Some(from) = cfg.from {
            self.ensure_state(from)?;
            if from == cfg.to {
                return Err(BlendError::InvalidLoop);
            }
        }
        let duplicate = self
            .transitions
            .iter()
            .any(|t| t.trigger == trigger && t.from == cfg.from && t.to == cfg.to);
        if duplicate {
            return Err(BlendError::DuplicateTransition {
                trigger: trigger.label().to_string(),
            });
        }
        self.transitions.push(Transition {
            trigger,
            from: cfg.from,
            to: cfg.to,
            duration,
            condition: cfg.condition,
            data: cfg.data,
        });
        Ok(self.transitions.len() - 1)
    }

    fn ensure_state(&self, id: StateId) -> Result<()> {
        if (id.0 as usize) < self.states.len() {
            Ok(())
        } else {
            Err(BlendError::UnknownState { state: id })
        }
    }

    fn poll_data_transitions(&mut self) -> Result<()> {
        let current = self.current;
        let found = self
            .transitions
            .iter()
            .filter(|t| t.trigger == Trigger::Data)
            .find(|t| match &t.data {
                Some(data) => t.matches(current, std::slice::from_ref(data)),
                None => t.matches(current, &[]),
            })
            .map(|t| (t.to, t.duration));
        if let Some((to, duration)) = found {
            log::debug!("data transition {current:?} -> {to:?}");
            self.transition_to(to, duration)?;
        }
        Ok(())
    }

    fn fire_automatic_transition(&mut self, from: StateId) -> Result<()> {
        if from != self.current {
            return Ok(());
        }
        let found = self
            .transitions
            .iter()
            .filter(|t| t.trigger == Trigger::Automatic)
            .find(|t| t.matches(from, &[]))
            .map(|t| (t.to, t.duration));
        if let Some((to, duration)) = found {
            log::debug!("automatic transition {from:?} -> {to:?}");
            self.transition_to(to, duration)?;
        }
        Ok(())
    }

    fn crossfade(&mut self, dt: f32) -> Result<()> {
        if self.transition_time_left <= 0.0 {
            return Ok(());
        }
        let t = (dt / self.transition_time_left).min(1.0);
        for &id in &self.fading {
            let node = &mut self.states[id.0 as usize];
            let influence = lerp(node.influence(), 0.0, t).clamp(0.0, 1.0);
            node.set_influence(influence)?;
        }
        let node = &mut self.states[self.current.0 as usize];
        let influence = lerp(node.influence(), 1.0, t).clamp(0.0, 1.0);
        node.set_influence(influence)?;

        self.transition_time_left = (self.transition_time_left - dt).max(0.0);
        if self.transition_time_left == 0.0 {
            self.finish_crossfade()?;
        }
        Ok(())
    }

    /// Snap fading states to 0 and the current state to 1.
    fn finish_crossfade(&mut self) -> Result<()> {
        for id in std::mem::take(&mut self.fading) {
            self.states[id.0 as usize].set_influence(0.0)?;
        }
        self.states[self.current.0 as usize].set_influence(1.0)?;
        self.transition_time_left = 0.0;
        Ok(())
    }

    /// Re-emit every state's queued events through the machine. Returns whether the
    /// current state reported a completion.
    fn relay_events(&mut self) -> bool {
        let mut completed = false;
        for (index, node) in self.states.iter_mut().enumerate() {
            let is_current = index == self.current.0 as usize;
            for event in node.drain_events() {
                completed |= is_current && event.kind.is_completion();
                self.emitter.emit(event);
            }
        }
        completed
    }
}
