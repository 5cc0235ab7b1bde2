//! Polar blend tree: anchors on concentric rings sampled at a shared set of rays.
//!
//! Weights come from two independent 1D passes. The angular pass interpolates between
//! the two rays bracketing the query going forward (counter-clockwise), so wraparound
//! past 2π needs no special casing. The radial pass interpolates between the two
//! bracketing rings, or between the innermost ring and the optional center leaf.

use super::BlendCore;
use crate::error::BlendError;
use crate::node::AnimationNode;
use crate::numeric::{
    angular_distance_forward, ensure_azimuth, ensure_non_negative, ensure_number,
    normalize_azimuth,
};
use crate::Result;

pub struct PolarAnchor {
    pub node: AnimationNode,
    pub radius: f32,
    /// Radians in [0, 2π]; 2π is the same ray as 0.
    pub azimuth: f32,
}

impl PolarAnchor {
    pub fn new(node: impl Into<AnimationNode>, radius: f32, azimuth: f32) -> Self {
        Self {
            node: node.into(),
            radius,
            azimuth,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Slot {
    Grid { ring: usize, ray: usize },
    Center,
}

#[derive(Debug, Clone, Copy)]
struct PolarPosition {
    radius: f32,
    azimuth: f32,
    slot: Slot,
}

#[derive(Debug)]
pub struct PolarBlendTree {
    core: BlendCore<PolarPosition>,
    /// Distinct ring radii, ascending.
    rings: Vec<f32>,
    /// Distinct ray azimuths in [0, 2π), ascending.
    rays: Vec<f32>,
    has_center: bool,
    /// (azimuth, radius) of the last applied blend.
    blend: (f32, f32),
}

impl PolarBlendTree {
    /// Build a tree from at least two ring anchors forming a complete ray/ring grid, plus an
    /// optional center node at radius 0. Starts blended at the first ray on the innermost
    /// ring, or at the center when one is present.
    pub fn new(anchors: Vec<PolarAnchor>, center: Option<AnimationNode>) -> Result<Self> {
        if anchors.len() < 2 {
            return Err(BlendError::InsufficientAnchors {
                required: 2,
                actual: anchors.len(),
            });
        }

        let mut coords = Vec::with_capacity(anchors.len());
        for anchor in &anchors {
            let radius = ensure_non_negative("anchor radius", anchor.radius)?;
            let azimuth = normalize_azimuth(ensure_azimuth("anchor azimuth", anchor.azimuth)?);
            if coords.contains(&(radius, azimuth)) {
                return Err(BlendError::DuplicateCoordinates {
                    radius: anchor.radius,
                    azimuth: anchor.azimuth,
                });
            }
            coords.push((radius, azimuth));
        }

        let rings = sorted_distinct(coords.iter().map(|c| c.0));
        let rays = sorted_distinct(coords.iter().map(|c| c.1));
        if rays.len() < 2 {
            return Err(BlendError::InsufficientRays { rays: rays.len() });
        }
        for &ring in &rings {
            let count = coords.iter().filter(|c| c.0 == ring).count();
            if count != rays.len() {
                return Err(BlendError::InvalidGrid {
                    reason: format!(
                        "ring at radius {ring} has {count} of the {} rays",
                        rays.len()
                    ),
                });
            }
        }
        if center.is_some() && rings[0] == 0.0 {
            return Err(BlendError::InvalidGrid {
                reason: "a center node cannot coexist with a ring at radius 0".to_string(),
            });
        }

        let mut entries: Vec<(AnimationNode, PolarPosition)> = anchors
            .into_iter()
            .zip(coords)
            .map(|(anchor, (radius, azimuth))| {
                let slot = Slot::Grid {
                    ring: index_of(&rings, radius),
                    ray: index_of(&rays, azimuth),
                };
                (
                    anchor.node,
                    PolarPosition {
                        radius,
                        azimuth,
                        slot,
                    },
                )
            })
            .collect();
        let has_center = center.is_some();
        if let Some(node) = center {
            entries.push((
                node,
                PolarPosition {
                    radius: 0.0,
                    azimuth: 0.0,
                    slot: Slot::Center,
                },
            ));
        }

        let blend = (rays[0], if has_center { 0.0 } else { rings[0] });
        let mut tree = Self {
            core: BlendCore::new(entries),
            rings,
            rays,
            has_center,
            blend,
        };
        tree.recompute()?;
        Ok(tree)
    }

    /// Move the blend position. Any finite azimuth is accepted and wrapped into [0, 2π).
    /// The radius is clamped to the outermost ring, and to the innermost ring unless a
    /// center node is present.
    pub fn set_blend(&mut self, azimuth: f32, radius: f32) -> Result<()> {
        let azimuth = normalize_azimuth(ensure_number("blend azimuth", azimuth)?);
        let radius = ensure_non_negative("blend radius", radius)?;
        let floor = if self.has_center { 0.0 } else { self.rings[0] };
        let radius = radius.clamp(floor, self.rings[self.rings.len() - 1]);
        if (azimuth, radius) == self.blend {
            return Ok(());
        }
        self.blend = (azimuth, radius);
        self.recompute()
    }

    /// (azimuth, radius) of the current blend position.
    pub fn blend(&self) -> (f32, f32) {
        self.blend
    }

    /// Influence-scaled weight per anchor, in construction order with the center last.
    pub fn anchor_weights(&self) -> Vec<f32> {
        self.core.anchor_weights()
    }

    /// Influence-scaled weight of the center node, if any.
    pub fn center_weight(&self) -> Option<f32> {
        self.core
            .anchors
            .iter()
            .find(|a| a.position.slot == Slot::Center)
            .map(|a| a.weight * self.core.influence)
    }

    /// (radius, azimuth) of each ring anchor in construction order; azimuths are normalized.
    pub fn coordinates(&self) -> Vec<(f32, f32)> {
        self.core
            .anchors
            .iter()
            .filter(|a| a.position.slot != Slot::Center)
            .map(|a| (a.position.radius, a.position.azimuth))
            .collect()
    }

    pub fn rings(&self) -> &[f32] {
        &self.rings
    }

    pub fn rays(&self) -> &[f32] {
        &self.rays
    }

    pub fn len(&self) -> usize {
        self.core.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.core.anchors.is_empty()
    }

    pub fn anchor_mut(&mut self, index: usize) -> Option<&mut AnimationNode> {
        self.core.anchors.get_mut(index).map(|a| &mut a.node)
    }

    fn recompute(&mut self) -> Result<()> {
        let (azimuth, radius) = self.blend;
        let ray_weights = self.ray_weights(azimuth);
        let (ring_weights, center_weight) = self.ring_weights(radius);
        log::trace!(
            "polar tree {:?}: azimuth {azimuth} radius {radius}",
            self.core.id
        );

        let weights: Vec<f32> = self
            .core
            .anchors
            .iter()
            .map(|a| match a.position.slot {
                Slot::Grid { ring, ray } => ring_weights[ring] * ray_weights[ray],
                Slot::Center => center_weight,
            })
            .collect();
        self.core.apply_weights(weights)
    }

    fn ray_weights(&self, azimuth: f32) -> Vec<f32> {
        let k = self.rays.len();
        let mut weights = vec![0.0; k];
        // Last ray at or before the query; wraps to the final ray below the first one.
        let left = match self.rays.partition_point(|a| *a <= azimuth) {
            0 => k - 1,
            i => i - 1,
        };
        let right = (left + 1) % k;
        let span = angular_distance_forward(self.rays[left], self.rays[right]);
        let t = (angular_distance_forward(self.rays[left], azimuth) / span).clamp(0.0, 1.0);
        weights[left] = 1.0 - t;
        weights[right] = t;
        weights
    }

    fn ring_weights(&self, radius: f32) -> (Vec<f32>, f32) {
        let m = self.rings.len();
        let mut weights = vec![0.0; m];
        let inner = self.rings[0];
        if radius < inner {
            // Only reachable with a center node; the radius floor is the innermost ring otherwise.
            let s = (radius / inner).clamp(0.0, 1.0);
            weights[0] = s;
            return (weights, 1.0 - s);
        }
        if m == 1 {
            weights[0] = 1.0;
            return (weights, 0.0);
        }
        let outer = self.rings.partition_point(|r| *r <= radius).clamp(1, m - 1);
        let lo = outer - 1;
        let t = ((radius - self.rings[lo]) / (self.rings[outer] - self.rings[lo]))
            .clamp(0.0, 1.0);
        weights[lo] = 1.0 - t;
        weights[outer] = t;
        (weights, 0.0)
    }
}

fn sorted_distinct(values: impl Iterator<Item = f32>) -> Vec<f32> {
    let mut out: Vec<f32> = values.collect();
    out.sort_by(f32::total_cmp);
    out.dedup();
    out
}

fn index_of(sorted: &[f32], value: f32) -> usize {
    sorted.partition_point(|v| *v < value)
}

impl_animation_tree!(PolarBlendTree);
