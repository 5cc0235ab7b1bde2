//! Freeform 2D blend tree over a Delaunay triangulation of its anchors.
//!
//! Inside the convex hull the weights are the barycentric coordinates of the containing
//! triangle. Outside, the query is projected onto the nearest hull edge and the two edge
//! endpoints share the weight linearly.

use super::BlendCore;
use crate::config::Config;
use crate::node::AnimationNode;
use crate::numeric::{barycentric, ensure_number, Vec2};
use crate::triangulate::{triangulate, Triangulation};
use crate::Result;

pub struct FreeformAnchor {
    pub node: AnimationNode,
    pub x: f32,
    pub y: f32,
}

impl FreeformAnchor {
    pub fn new(node: impl Into<AnimationNode>, x: f32, y: f32) -> Self {
        Self {
            node: node.into(),
            x,
            y,
        }
    }
}

#[derive(Debug)]
pub struct FreeformBlendTree {
    core: BlendCore<Vec2>,
    triangulation: Triangulation,
    /// Hull edges, derived once from the boundary map.
    hull_edges: Vec<(usize, usize)>,
    blend: Vec2,
    containment_epsilon: f64,
}

impl FreeformBlendTree {
    /// Triangulate at least three distinct, non-collinear anchors with the default config.
    pub fn new(anchors: Vec<FreeformAnchor>) -> Result<Self> {
        Self::with_config(anchors, &Config::default())
    }

    /// Starts blended at the first anchor's position.
    pub fn with_config(anchors: Vec<FreeformAnchor>, config: &Config) -> Result<Self> {
        let mut entries = Vec::with_capacity(anchors.len());
        for anchor in anchors {
            let position = Vec2::new(
                ensure_number("anchor x", anchor.x)?,
                ensure_number("anchor y", anchor.y)?,
            );
            entries.push((anchor.node, position));
        }
        let points: Vec<Vec2> = entries.iter().map(|(_, p)| *p).collect();
        let triangulation = triangulate(&points, config)?;
        let hull_edges = triangulation.boundary_edges();

        let mut tree = Self {
            core: BlendCore::new(entries),
            triangulation,
            hull_edges,
            blend: points[0],
            containment_epsilon: config.containment_epsilon,
        };
        tree.recompute()?;
        Ok(tree)
    }

    /// Move the blend point. Points outside the hull are projected onto it; an unchanged
    /// point is a no-op.
    pub fn set_blend(&mut self, x: f32, y: f32) -> Result<()> {
        let point = Vec2::new(ensure_number("blend x", x)?, ensure_number("blend y", y)?);
        if point == self.blend {
            return Ok(());
        }
        self.blend = point;
        self.recompute()
    }

    pub fn blend(&self) -> Vec2 {
        self.blend
    }

    /// Influence-scaled weight per anchor, in construction order.
    pub fn anchor_weights(&self) -> Vec<f32> {
        self.core.anchor_weights()
    }

    pub fn positions(&self) -> Vec<Vec2> {
        self.core.anchors.iter().map(|a| a.position).collect()
    }

    /// Triangles as anchor indices.
    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangulation.triangles
    }

    pub fn triangulation(&self) -> &Triangulation {
        &self.triangulation
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

    fn point(&self, index: usize) -> [f64; 2] {
        let p = self.core.anchors[index].position;
        [f64::from(p.x), f64::from(p.y)]
    }

    /// Barycentric weights of the first triangle containing `p`, within tolerance.
    fn locate(&self, p: [f64; 2]) -> Option<([usize; 3], [f64; 3])> {
        let eps = self.containment_epsilon;
        self.triangulation.triangles.iter().find_map(|&t| {
            let bary = barycentric(p, self.point(t[0]), self.point(t[1]), self.point(t[2]))?;
            bary.iter().all(|&c| c >= -eps).then_some((t, bary))
        })
    }

    /// Closest point on the hull as `(a, b, t)`, meaning `lerp(a, b, t)`.
    fn project_onto_hull(&self, p: [f64; 2]) -> Option<(usize, usize, f64)> {
        let mut best: Option<(f64, usize, usize, f64)> = None;
        for &(a, b) in &self.hull_edges {
            let (pa, pb) = (self.point(a), self.point(b));
            let edge = [pb[0] - pa[0], pb[1] - pa[1]];
            let len_sq = edge[0] * edge[0] + edge[1] * edge[1];
            if len_sq == 0.0 {
                continue;
            }
            let t = (((p[0] - pa[0]) * edge[0] + (p[1] - pa[1]) * edge[1]) / len_sq)
                .clamp(0.0, 1.0);
            let q = [pa[0] + edge[0] * t, pa[1] + edge[1] * t];
            let d = (p[0] - q[0]).powi(2) + (p[1] - q[1]).powi(2);
            if best.map_or(true, |(bd, ..)| d < bd) {
                best = Some((d, a, b, t));
            }
        }
        best.map(|(_, a, b, t)| (a, b, t))
    }

    fn recompute(&mut self) -> Result<()> {
        let p = [f64::from(self.blend.x), f64::from(self.blend.y)];
        let mut weights = vec![0.0_f32; self.core.anchors.len()];

        if let Some((tri, bary)) = self.locate(p) {
            // Points just outside an edge within tolerance carry tiny negative coordinates.
            let clamped = bary.map(|c| c.max(0.0));
            let total: f64 = clamped.iter().sum();
            for (&i, c) in tri.iter().zip(clamped) {
                weights[i] = (c / total) as f32;
            }
            log::trace!(
                "freeform tree {:?}: ({}, {}) in triangle {tri:?}",
                self.core.id,
                self.blend.x,
                self.blend.y
            );
        } else if let Some((a, b, t)) = self.project_onto_hull(p) {
            weights[a] = (1.0 - t) as f32;
            weights[b] = t as f32;
            log::trace!(
                "freeform tree {:?}: ({}, {}) projected onto hull edge ({a}, {b}) t={t}",
                self.core.id,
                self.blend.x,
                self.blend.y
            );
        }
        self.core.apply_weights(weights)
    }
}

impl_animation_tree!(FreeformBlendTree);
