//! Blend trees: weight distribution over anchors placed in a parameter space.
//!
//! - [`linear`]: 1D, bracketing pair of sorted scalar anchors.
//! - [`polar`]: ray/ring grid, angular pass times radial pass, optional center leaf.
//! - [`freeform`]: arbitrary 2D points, barycentric weights over a Delaunay triangulation.
//!
//! Each tree keeps a locally normalized weight per anchor (summing to 1) and pushes
//! `local weight × influence` to the anchored node whenever either factor changes.

/// Implements [`AnimationTree`] for a tree type holding a `core: BlendCore<_>` field.
macro_rules! impl_animation_tree {
    ($tree:ty) => {
        impl $crate::node::AnimationTree for $tree {
            fn id(&self) -> $crate::ids::NodeId {
                self.core.id
            }

            fn influence(&self) -> f32 {
                self.core.influence
            }

            fn set_influence(&mut self, influence: f32) -> $crate::Result<()> {
                self.core.set_influence(influence)
            }

            fn on_enter(&mut self) {
                self.core.emit_lifecycle($crate::event::EventKind::Enter);
            }

            fn on_exit(&mut self) {
                self.core.emit_lifecycle($crate::event::EventKind::Exit);
            }

            fn tick(&mut self, dt: f32) {
                self.core.tick(dt);
            }

            fn emitter_mut(&mut self) -> &mut $crate::event::EventEmitter {
                &mut self.core.emitter
            }

            fn drain_events(&mut self) -> Vec<$crate::event::AnimationEvent> {
                self.core.emitter.drain()
            }
        }
    };
}

pub mod freeform;
pub mod linear;
pub mod polar;

pub use freeform::{FreeformAnchor, FreeformBlendTree};
pub use linear::{LinearAnchor, LinearBlendTree};
pub use polar::{PolarAnchor, PolarBlendTree};

use crate::event::{AnimationEvent, EventEmitter, EventKind};
use crate::ids::NodeId;
use crate::node::{AnimationNode, AnimationTree};
use crate::numeric::ensure_unit;
use crate::Result;

#[derive(Debug)]
pub(crate) struct Anchor<P> {
    pub node: AnimationNode,
    pub position: P,
    /// Locally normalized weight in [0, 1].
    pub weight: f32,
}

/// Bookkeeping shared by every tree kind.
#[derive(Debug)]
pub(crate) struct BlendCore<P> {
    pub id: NodeId,
    pub influence: f32,
    pub emitter: EventEmitter,
    pub anchors: Vec<Anchor<P>>,
}

impl<P> BlendCore<P> {
    pub fn new(anchors: Vec<(AnimationNode, P)>) -> Self {
        Self {
            id: NodeId::next(),
            influence: 0.0,
            emitter: EventEmitter::new(),
            anchors: anchors
                .into_iter()
                .map(|(node, position)| Anchor {
                    node,
                    position,
                    weight: 0.0,
                })
                .collect(),
        }
    }

    pub fn set_influence(&mut self, influence: f32) -> Result<()> {
        let influence = ensure_unit("influence", influence)?;
        if influence == self.influence {
            return Ok(());
        }
        self.influence = influence;
        self.propagate()
    }

    /// Replace every local weight and push the result down.
    pub fn apply_weights(&mut self, weights: impl IntoIterator<Item = f32>) -> Result<()> {
        for (anchor, w) in self.anchors.iter_mut().zip(weights) {
            anchor.weight = w.clamp(0.0, 1.0);
        }
        self.propagate()
    }

    fn propagate(&mut self) -> Result<()> {
        let influence = self.influence;
        for anchor in &mut self.anchors {
            anchor
                .node
                .set_influence((anchor.weight * influence).clamp(0.0, 1.0))?;
        }
        self.relay_events();
        Ok(())
    }

    pub fn tick(&mut self, dt: f32) {
        for anchor in &mut self.anchors {
            anchor.node.tick(dt);
        }
        self.relay_events();
    }

    pub fn emit_lifecycle(&mut self, kind: EventKind) {
        self.emitter.emit(AnimationEvent {
            kind,
            clip: None,
            source: self.id,
        });
    }

    /// Re-emit child leaf activity as this tree so listeners need not know the tree shape.
    /// Child enter/exit stay local to the child.
    fn relay_events(&mut self) {
        for anchor in &mut self.anchors {
            for event in anchor.node.drain_events() {
                if matches!(event.kind, EventKind::Enter | EventKind::Exit) {
                    continue;
                }
                self.emitter.emit(event.relayed_by(self.id));
            }
        }
    }

    pub fn anchor_weights(&self) -> Vec<f32> {
        self.anchors
            .iter()
            .map(|a| a.weight * self.influence)
            .collect()
    }
}
