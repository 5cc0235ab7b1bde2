//! Numeric tuning for the freeform triangulator and point locator.

use serde::{Deserialize, Serialize};

/// Configuration for triangulation tolerances.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Oversize factor applied to the anchor bounding box when building the
    /// Bowyer-Watson super triangle. Thin anchor sets enlarge it further.
    pub super_triangle_scale: f64,
    /// Barycentric slack when testing whether a query lies inside a triangle.
    pub containment_epsilon: f64,
    /// Relative cross-product tolerance below which three points count as collinear.
    pub collinear_epsilon: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            super_triangle_scale: 100.0,
            containment_epsilon: 1e-6,
            collinear_epsilon: 1e-9,
        }
    }
}
