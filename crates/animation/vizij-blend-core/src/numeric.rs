//! Validated scalar helpers shared by every tree.
//!
//! - finite/safe-magnitude checks and the unit, non-negative, positive and azimuth domains
//! - azimuth normalization and forward angular distance (fixes the rotation direction)
//! - barycentric solve for the freeform tree

use std::f32::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::error::BlendError;
use crate::Result;

/// Largest magnitude accepted for any externally supplied number (2^53 - 1).
pub const MAX_SAFE_MAGNITUDE: f32 = 9_007_199_254_740_991_u64 as f32;

/// 2D point in a freeform parameter space.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Finite and within the safe magnitude.
pub fn ensure_number(name: &str, value: f32) -> Result<f32> {
    if value.is_finite() && value.abs() <= MAX_SAFE_MAGNITUDE {
        Ok(value)
    } else {
        Err(BlendError::InvalidNumber {
            name: name.to_string(),
            value,
        })
    }
}

/// A valid number in [0, 1].
pub fn ensure_unit(name: &str, value: f32) -> Result<f32> {
    let value = ensure_number(name, value)?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(BlendError::OutOfUnitRange {
            name: name.to_string(),
            value,
        })
    }
}

/// A valid number ≥ 0.
pub fn ensure_non_negative(name: &str, value: f32) -> Result<f32> {
    let value = ensure_number(name, value)?;
    if value >= 0.0 {
        Ok(value)
    } else {
        Err(BlendError::OutOfRange {
            name: name.to_string(),
            value,
            min: 0.0,
        })
    }
}

/// A valid number > 0.
pub fn ensure_positive(name: &str, value: f32) -> Result<f32> {
    let value = ensure_number(name, value)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(BlendError::OutOfRange {
            name: name.to_string(),
            value,
            min: f32::MIN_POSITIVE,
        })
    }
}

/// A valid number in [0, 2π].
pub fn ensure_azimuth(name: &str, value: f32) -> Result<f32> {
    let value = ensure_number(name, value)?;
    if (0.0..=TAU).contains(&value) {
        Ok(value)
    } else {
        Err(BlendError::InvalidAzimuth {
            name: name.to_string(),
            value,
        })
    }
}

/// Map any angle into [0, 2π).
pub fn normalize_azimuth(azimuth: f32) -> f32 {
    let m = azimuth % TAU;
    let m = if m < 0.0 { m + TAU } else { m };
    // `-ε % TAU + TAU` can round up to exactly TAU
    if m >= TAU {
        0.0
    } else {
        m
    }
}

/// Non-negative sweep travelling forward (counter-clockwise) from `from` to `to`.
#[inline]
pub fn angular_distance_forward(from: f32, to: f32) -> f32 {
    let d = to - from;
    if d < 0.0 {
        d + TAU
    } else {
        d
    }
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Barycentric coordinates `(u, v, w)` of `p` with respect to triangle `(a, b, c)`,
/// so that `p = u*a + v*b + w*c` and `u + v + w = 1`.
/// Returns `None` for a degenerate (zero-area) triangle.
pub fn barycentric(p: [f64; 2], a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> Option<[f64; 3]> {
    let v0 = [b[0] - a[0], b[1] - a[1]];
    let v1 = [c[0] - a[0], c[1] - a[1]];
    let v2 = [p[0] - a[0], p[1] - a[1]];
    let den = v0[0] * v1[1] - v1[0] * v0[1];
    if den == 0.0 || !den.is_finite() {
        return None;
    }
    let v = (v2[0] * v1[1] - v1[0] * v2[1]) / den;
    let w = (v0[0] * v2[1] - v2[0] * v0[1]) / den;
    Some([1.0 - v - w, v, w])
}
