//! 1D blend tree over scalar anchors.

use super::BlendCore;
use crate::error::BlendError;
use crate::node::AnimationNode;
use crate::numeric::ensure_number;
use crate::Result;

pub struct LinearAnchor {
    pub node: AnimationNode,
    pub value: f32,
}

impl LinearAnchor {
    pub fn new(node: impl Into<AnimationNode>, value: f32) -> Self {
        Self {
            node: node.into(),
            value,
        }
    }
}

/// Blends between the two anchors bracketing the blend value.
///
/// Anchors are kept sorted ascending. The blend value is clamped to the first and last
/// anchor values, which pins the interpolation parameter of the outer segments to 0 and 1
/// while interior anchors keep their original spacing.
#[derive(Debug)]
pub struct LinearBlendTree {
    core: BlendCore<f32>,
    blend: f32,
}

impl LinearBlendTree {
    /// Requires at least two anchors with distinct, valid values. Starts blended at the
    /// lowest anchor.
    pub fn new(anchors: Vec<LinearAnchor>) -> Result<Self> {
        if anchors.len() < 2 {
            return Err(BlendError::InsufficientAnchors {
                required: 2,
                actual: anchors.len(),
            });
        }
        let mut entries = Vec::with_capacity(anchors.len());
        for anchor in anchors {
            let value = ensure_number("anchor value", anchor.value)?;
            entries.push((anchor.node, value));
        }
        entries.sort_by(|a, b| a.1.total_cmp(&b.1));
        if let Some(pair) = entries.windows(2).find(|w| w[0].1 == w[1].1) {
            return Err(BlendError::DuplicateValue { value: pair[0].1 });
        }

        let blend = entries[0].1;
        let mut tree = Self {
            core: BlendCore::new(entries),
            blend,
        };
        tree.recompute()?;
        Ok(tree)
    }

    /// Move the blend value. Values outside the anchor range are clamped; an unchanged
    /// (clamped) value is a no-op.
    pub fn set_blend(&mut self, value: f32) -> Result<()> {
        let value = ensure_number("blend value", value)?.clamp(self.min(), self.max());
        if value == self.blend {
            return Ok(());
        }
        self.blend = value;
        self.recompute()
    }

    pub fn blend(&self) -> f32 {
        self.blend
    }

    /// Sorted anchor values.
    pub fn values(&self) -> Vec<f32> {
        self.core.anchors.iter().map(|a| a.position).collect()
    }

    /// Influence-scaled weight per anchor, in ascending value order.
    pub fn anchor_weights(&self) -> Vec<f32> {
        self.core.anchor_weights()
    }

    pub fn len(&self) -> usize {
        self.core.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.core.anchors.is_empty()
    }

    pub fn anchor(&self, index: usize) -> Option<&AnimationNode> {
        self.core.anchors.get(index).map(|a| &a.node)
    }

    pub fn anchor_mut(&mut self, index: usize) -> Option<&mut AnimationNode> {
        self.core.anchors.get_mut(index).map(|a| &mut a.node)
    }

    fn min(&self) -> f32 {
        self.core.anchors[0].position
    }

    fn max(&self) -> f32 {
        self.core.anchors[self.core.anchors.len() - 1].position
    }

    fn recompute(&mut self) -> Result<()> {
        let x = self.blend;
        let anchors = &self.core.anchors;
        let n = anchors.len();
        // First anchor with a value above x, kept within [1, n - 1] so (left, right) is a segment.
        let right = anchors.partition_point(|a| a.position <= x).clamp(1, n - 1);
        let left = right - 1;
        let (lo, hi) = (anchors[left].position, anchors[right].position);
        let t = ((x - lo) / (hi - lo)).clamp(0.0, 1.0);
        log::trace!("linear tree {:?}: blend {x} in [{lo}, {hi}] t={t}", self.core.id);

        let weights = (0..n).map(|i| {
            if i == left {
                1.0 - t
            } else if i == right {
                t
            } else {
                0.0
            }
        });
        self.core.apply_weights(weights)
    }
}

impl_animation_tree!(LinearBlendTree);
