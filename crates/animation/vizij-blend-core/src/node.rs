//! Shared contract for leaves and trees, and the tagged variant the scheduler stores.

use crate::event::{AnimationEvent, EventEmitter, EventKind, ListenerId};
use crate::ids::NodeId;
use crate::state::ClipState;
use crate::tree::{FreeformBlendTree, LinearBlendTree, PolarBlendTree};
use crate::Result;

/// Influence propagation and lifecycle hooks implemented by every leaf and tree.
pub trait AnimationTree {
    fn id(&self) -> NodeId;

    /// Current propagated weight in [0, 1].
    fn influence(&self) -> f32;

    /// Validate and apply a new influence, rescaling every descendant leaf while keeping
    /// each leaf's locally computed weight. A no-op if unchanged.
    fn set_influence(&mut self, influence: f32) -> Result<()>;

    /// The node became the state machine's active node.
    fn on_enter(&mut self);

    /// The node stopped being the state machine's active node.
    fn on_exit(&mut self);

    /// Per-frame hook; leaves use it to detect loop completion.
    fn tick(&mut self, dt: f32);

    fn emitter_mut(&mut self) -> &mut EventEmitter;

    /// Take the events queued since the last drain.
    fn drain_events(&mut self) -> Vec<AnimationEvent>;

    fn on(
        &mut self,
        kind: EventKind,
        handler: impl FnMut(&AnimationEvent) + 'static,
    ) -> ListenerId
    where
        Self: Sized,
    {
        self.emitter_mut().on(kind, handler)
    }

    fn once(
        &mut self,
        kind: EventKind,
        handler: impl FnMut(&AnimationEvent) + 'static,
    ) -> ListenerId
    where
        Self: Sized,
    {
        self.emitter_mut().once(kind, handler)
    }
}

/// A blend leaf or any of the tree kinds.
#[derive(Debug)]
pub enum AnimationNode {
    Clip(ClipState),
    Linear(LinearBlendTree),
    Polar(PolarBlendTree),
    Freeform(FreeformBlendTree),
}

macro_rules! dispatch {
    ($self:expr, $node:ident => $body:expr) => {
        match $self {
            AnimationNode::Clip($node) => $body,
            AnimationNode::Linear($node) => $body,
            AnimationNode::Polar($node) => $body,
            AnimationNode::Freeform($node) => $body,
        }
    };
}

impl AnimationTree for AnimationNode {
    fn id(&self) -> NodeId {
        dispatch!(self, n => n.id())
    }

    fn influence(&self) -> f32 {
        dispatch!(self, n => n.influence())
    }

    fn set_influence(&mut self, influence: f32) -> Result<()> {
        dispatch!(self, n => n.set_influence(influence))
    }

    fn on_enter(&mut self) {
        dispatch!(self, n => n.on_enter())
    }

    fn on_exit(&mut self) {
        dispatch!(self, n => n.on_exit())
    }

    fn tick(&mut self, dt: f32) {
        dispatch!(self, n => n.tick(dt))
    }

    fn emitter_mut(&mut self) -> &mut EventEmitter {
        dispatch!(self, n => n.emitter_mut())
    }

    fn drain_events(&mut self) -> Vec<AnimationEvent> {
        dispatch!(self, n => n.drain_events())
    }
}

impl AnimationNode {
    pub fn as_clip(&self) -> Option<&ClipState> {
        match self {
            Self::Clip(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_linear(&self) -> Option<&LinearBlendTree> {
        match self {
            Self::Linear(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_linear_mut(&mut self) -> Option<&mut LinearBlendTree> {
        match self {
            Self::Linear(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_polar(&self) -> Option<&PolarBlendTree> {
        match self {
            Self::Polar(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_polar_mut(&mut self) -> Option<&mut PolarBlendTree> {
        match self {
            Self::Polar(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_freeform(&self) -> Option<&FreeformBlendTree> {
        match self {
            Self::Freeform(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_freeform_mut(&mut self) -> Option<&mut FreeformBlendTree> {
        match self {
            Self::Freeform(t) => Some(t),
            _ => None,
        }
    }
}

impl From<ClipState> for AnimationNode {
    fn from(value: ClipState) -> Self {
        Self::Clip(value)
    }
}

impl From<LinearBlendTree> for AnimationNode {
    fn from(value: LinearBlendTree) -> Self {
        Self::Linear(value)
    }
}

impl From<PolarBlendTree> for AnimationNode {
    fn from(value: PolarBlendTree) -> Self {
        Self::Polar(value)
    }
}

impl From<FreeformBlendTree> for AnimationNode {
    fn from(value: FreeformBlendTree) -> Self {
        Self::Freeform(value)
    }
}
