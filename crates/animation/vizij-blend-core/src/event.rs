//! Lifecycle events and the per-node listener registry.
//!
//! Every leaf and tree owns an [`EventEmitter`]. Emitting an event runs the matching
//! listeners synchronously and also queues the event so the owning parent (a tree or
//! the state machine) can relay it upward on its next drain.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::NodeId;

/// Upper bound on queued, undrained events per node.
pub const MAX_PENDING_EVENTS: usize = 1024;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Play,
    Stop,
    Enter,
    Exit,
    Iterate,
    Finish,
}

impl EventKind {
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Play => "play",
            Self::Stop => "stop",
            Self::Enter => "enter",
            Self::Exit => "exit",
            Self::Iterate => "iterate",
            Self::Finish => "finish",
        }
    }

    /// Loop completion (`Iterate`) or one-shot completion (`Finish`).
    #[inline]
    pub fn is_completion(&self) -> bool {
        matches!(self, Self::Iterate | Self::Finish)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationEvent {
    pub kind: EventKind,
    /// Leaf whose clip produced the event; `None` for enter/exit.
    pub clip: Option<NodeId>,
    /// Node that emitted this copy of the event.
    pub source: NodeId,
}

impl AnimationEvent {
    /// Same event, re-emitted by `source`.
    #[inline]
    pub fn relayed_by(self, source: NodeId) -> Self {
        Self { source, ..self }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ListenerId(u32);

type Handler = Box<dyn FnMut(&AnimationEvent)>;

struct Listener {
    id: ListenerId,
    kind: EventKind,
    once: bool,
    handler: Handler,
}

#[derive(Default)]
pub struct EventEmitter {
    listeners: Vec<Listener>,
    pending: VecDeque<AnimationEvent>,
    next_listener: u32,
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("listeners", &self.listeners.len())
            .field("pending", &self.pending.len())
            .finish()
    }
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `handler` for every event of `kind`.
    pub fn on(
        &mut self,
        kind: EventKind,
        handler: impl FnMut(&AnimationEvent) + 'static,
    ) -> ListenerId {
        self.register(kind, false, Box::new(handler))
    }

    /// Run `handler` for the next event of `kind` only.
    pub fn once(
        &mut self,
        kind: EventKind,
        handler: impl FnMut(&AnimationEvent) + 'static,
    ) -> ListenerId {
        self.register(kind, true, Box::new(handler))
    }

    /// Remove a listener. Returns false if it was already gone.
    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| l.id != id);
        self.listeners.len() != before
    }

    pub fn emit(&mut self, event: AnimationEvent) {
        self.listeners.retain_mut(|l| {
            if l.kind != event.kind {
                return true;
            }
            (l.handler)(&event);
            !l.once
        });
        if self.pending.len() >= MAX_PENDING_EVENTS {
            log::warn!(
                "event queue for node {:?} full; dropping oldest event",
                event.source
            );
            self.pending.pop_front();
        }
        self.pending.push_back(event);
    }

    /// Take every queued event, oldest first.
    pub fn drain(&mut self) -> Vec<AnimationEvent> {
        self.pending.drain(..).collect()
    }

    #[inline]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn register(&mut self, kind: EventKind, once: bool, handler: Handler) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener = self.next_listener.wrapping_add(1);
        self.listeners.push(Listener {
            id,
            kind,
            once,
            handler,
        });
        id
    }
}
