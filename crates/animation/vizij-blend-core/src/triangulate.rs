//! Incremental Bowyer-Watson Delaunay triangulation for freeform anchors.
//!
//! Runs once per tree construction. The output is the list of real triangles (indices
//! into the input points) and a boundary map giving each hull vertex its two hull
//! neighbours, used to project queries that fall outside the hull.

use hashbrown::HashMap;

use crate::config::Config;
use crate::error::BlendError;
use crate::numeric::Vec2;
use crate::Result;

/// Hull vertex → its two neighbouring hull vertices.
pub type BoundaryEdgeMap = HashMap<usize, [usize; 2]>;

#[derive(Debug, Clone)]
pub struct Triangulation {
    pub triangles: Vec<[usize; 3]>,
    pub boundary: BoundaryEdgeMap,
}

impl Triangulation {
    /// Each hull edge once, as `(low, high)` vertex indices, sorted.
    pub fn boundary_edges(&self) -> Vec<(usize, usize)> {
        let mut edges: Vec<(usize, usize)> = self
            .boundary
            .iter()
            .flat_map(|(&v, ns)| ns.iter().filter(move |&&n| v < n).map(move |&n| (v, n)))
            .collect();
        edges.sort_unstable();
        edges
    }
}

#[derive(Debug, Clone, Copy)]
struct Triangle {
    v: [usize; 3],
    center: [f64; 2],
    radius_sq: f64,
}

impl Triangle {
    fn new(v: [usize; 3], pts: &[[f64; 2]]) -> Self {
        let (a, b, c) = (pts[v[0]], pts[v[1]], pts[v[2]]);
        let d = 2.0 * (a[0] * (b[1] - c[1]) + b[0] * (c[1] - a[1]) + c[0] * (a[1] - b[1]));
        if d == 0.0 || !d.is_finite() {
            // Degenerate: treat the circumcircle as unbounded so the next insertion removes it.
            return Self {
                v,
                center: a,
                radius_sq: f64::INFINITY,
            };
        }
        let a2 = a[0] * a[0] + a[1] * a[1];
        let b2 = b[0] * b[0] + b[1] * b[1];
        let c2 = c[0] * c[0] + c[1] * c[1];
        let ux = (a2 * (b[1] - c[1]) + b2 * (c[1] - a[1]) + c2 * (a[1] - b[1])) / d;
        let uy = (a2 * (c[0] - b[0]) + b2 * (a[0] - c[0]) + c2 * (b[0] - a[0])) / d;
        let radius_sq = (a[0] - ux).powi(2) + (a[1] - uy).powi(2);
        Self {
            v,
            center: [ux, uy],
            radius_sq,
        }
    }

    #[inline]
    fn circumcircle_contains(&self, p: [f64; 2]) -> bool {
        let dx = p[0] - self.center[0];
        let dy = p[1] - self.center[1];
        dx * dx + dy * dy < self.radius_sq
    }

    #[inline]
    fn edges(&self) -> [(usize, usize); 3] {
        let [a, b, c] = self.v;
        [(a, b), (b, c), (c, a)]
    }
}

#[inline]
fn edge_key(a: usize, b: usize) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Super-triangle enlargements tried before a thin point set is rejected.
const SUPER_TRIANGLE_ATTEMPTS: u32 = 4;
const SUPER_TRIANGLE_GROWTH: f64 = 1e3;

/// Triangulate `points`. Callers validate finiteness; this rejects fewer than three
/// points, duplicates, and sets that are collinear or too thin to triangulate.
pub fn triangulate(points: &[Vec2], cfg: &Config) -> Result<Triangulation> {
    let n = points.len();
    if n < 3 {
        return Err(BlendError::InsufficientAnchors {
            required: 3,
            actual: n,
        });
    }
    let pts: Vec<[f64; 2]> = points
        .iter()
        .map(|p| [f64::from(p.x), f64::from(p.y)])
        .collect();

    for (i, p) in pts.iter().enumerate() {
        if pts[..i].contains(p) {
            return Err(BlendError::DuplicatePoint {
                x: points[i].x,
                y: points[i].y,
            });
        }
    }
    if all_collinear(&pts, cfg.collinear_epsilon) {
        return Err(BlendError::CollinearPoints);
    }

    // A thin triangle's circumcircle can swallow a super-triangle vertex, and the triangle is
    // then discarded with the super triangles. Grow the super triangle until the hull is whole.
    let mut scale = cfg.super_triangle_scale;
    for _ in 0..SUPER_TRIANGLE_ATTEMPTS {
        let triangles = bowyer_watson(&pts, scale);
        if covers_hull(&pts, &triangles, cfg.collinear_epsilon) {
            let boundary = boundary_map(&triangles)?;
            log::debug!(
                "triangulated {n} points into {} triangles ({} hull vertices, scale {scale})",
                triangles.len(),
                boundary.len()
            );
            return Ok(Triangulation {
                triangles,
                boundary,
            });
        }
        log::debug!("super triangle at scale {scale} clipped the hull of {n} points");
        scale *= SUPER_TRIANGLE_GROWTH;
    }
    log::warn!("{n} points are too close to collinear to triangulate");
    Err(BlendError::CollinearPoints)
}

/// Real triangles of the Delaunay triangulation of `points` plus a super triangle of
/// `scale` times the bounding box.
fn bowyer_watson(points: &[[f64; 2]], scale: f64) -> Vec<[usize; 3]> {
    let n = points.len();
    let (mut min, mut max) = (points[0], points[0]);
    for p in points {
        min = [min[0].min(p[0]), min[1].min(p[1])];
        max = [max[0].max(p[0]), max[1].max(p[1])];
    }
    let extent = (max[0] - min[0]).max(max[1] - min[1]) * scale;
    let mid = [(min[0] + max[0]) / 2.0, (min[1] + max[1]) / 2.0];

    // Super-triangle vertices are appended after the real points.
    let mut pts = Vec::with_capacity(n + 3);
    pts.extend_from_slice(points);
    pts.push([mid[0] - extent, mid[1] - extent]);
    pts.push([mid[0], mid[1] + extent]);
    pts.push([mid[0] + extent, mid[1] - extent]);

    let mut triangles = vec![Triangle::new([n, n + 1, n + 2], &pts)];
    for i in 0..n {
        let p = pts[i];
        let (bad, good): (Vec<Triangle>, Vec<Triangle>) =
            triangles.into_iter().partition(|t| t.circumcircle_contains(p));

        // The cavity's outer polygon: edges used by exactly one bad triangle.
        let mut counts: HashMap<(usize, usize), u32> = HashMap::new();
        for t in &bad {
            for (a, b) in t.edges() {
                *counts.entry(edge_key(a, b)).or_insert(0) += 1;
            }
        }
        triangles = good;
        for t in &bad {
            for (a, b) in t.edges() {
                if counts[&edge_key(a, b)] == 1 {
                    triangles.push(Triangle::new([a, b, i], &pts));
                }
            }
        }
    }

    triangles
        .into_iter()
        .filter(|t| t.v.iter().all(|&v| v < n))
        .map(|t| t.v)
        .collect()
}

/// Every point is a vertex and no point lies outside any boundary edge, so the triangles
/// tile the whole convex hull.
fn covers_hull(pts: &[[f64; 2]], triangles: &[[usize; 3]], eps: f64) -> bool {
    if triangles.is_empty() {
        return false;
    }
    let mut used = vec![false; pts.len()];
    // Edge → (uses, vertex opposite its first use).
    let mut edges: HashMap<(usize, usize), (u32, usize)> = HashMap::new();
    for t in triangles {
        for k in 0..3 {
            let (a, b, c) = (t[k], t[(k + 1) % 3], t[(k + 2) % 3]);
            used[a] = true;
            edges.entry(edge_key(a, b)).or_insert((0, c)).0 += 1;
        }
    }
    if used.contains(&false) {
        return false;
    }

    edges
        .iter()
        .filter(|(_, (uses, _))| *uses == 1)
        .all(|(&(a, b), &(_, c))| {
            let (pa, pb) = (pts[a], pts[b]);
            let inner = cross(pa, pb, pts[c]);
            if inner == 0.0 {
                return true;
            }
            let len = dist_sq(pa, pb).sqrt();
            pts.iter().all(|&p| {
                cross(pa, pb, p) * inner.signum() >= -eps * len * dist_sq(pa, p).sqrt()
            })
        })
}

/// Twice the signed area of `(a, b, p)`; positive when `p` is left of `a → b`.
#[inline]
fn cross(a: [f64; 2], b: [f64; 2], p: [f64; 2]) -> f64 {
    (b[0] - a[0]) * (p[1] - a[1]) - (b[1] - a[1]) * (p[0] - a[0])
}

fn all_collinear(pts: &[[f64; 2]], eps: f64) -> bool {
    let origin = pts[0];
    // Farthest point from the origin gives the most stable reference direction.
    let far = pts
        .iter()
        .copied()
        .max_by(|a, b| dist_sq(origin, *a).total_cmp(&dist_sq(origin, *b)))
        .unwrap_or(origin);
    let dir = [far[0] - origin[0], far[1] - origin[1]];
    let dir_len = dist_sq(origin, far).sqrt();
    pts.iter().all(|p| {
        let v = [p[0] - origin[0], p[1] - origin[1]];
        let cross = dir[0] * v[1] - dir[1] * v[0];
        cross.abs() <= eps * dir_len * dist_sq(origin, *p).sqrt()
    })
}

#[inline]
fn dist_sq(a: [f64; 2], b: [f64; 2]) -> f64 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)
}

fn boundary_map(triangles: &[[usize; 3]]) -> Result<BoundaryEdgeMap> {
    let mut counts: HashMap<(usize, usize), u32> = HashMap::new();
    for t in triangles {
        for (a, b) in [(t[0], t[1]), (t[1], t[2]), (t[2], t[0])] {
            *counts.entry(edge_key(a, b)).or_insert(0) += 1;
        }
    }

    let mut neighbours: HashMap<usize, Vec<usize>> = HashMap::new();
    for (&(a, b), &count) in &counts {
        if count == 1 {
            neighbours.entry(a).or_default().push(b);
            neighbours.entry(b).or_default().push(a);
        }
    }

    let mut boundary = BoundaryEdgeMap::with_capacity(neighbours.len());
    for (vertex, ns) in neighbours {
        match ns.as_slice() {
            [a, b] => {
                boundary.insert(vertex, [*a, *b]);
            }
            _ => {
                return Err(BlendError::InternalInvariantViolation {
                    reason: format!(
                        "hull vertex {vertex} has {} boundary neighbours, expected 2",
                        ns.len()
                    ),
                })
            }
        }
    }
    Ok(boundary)
}
