//! Error types for blend trees and the state machine

use serde::{Deserialize, Serialize};

use crate::ids::StateId;

/// Every failure raised by validation, construction, or transition bookkeeping.
///
/// All errors are raised synchronously by the call that violated its contract, and
/// validation always precedes mutation, so a failed call leaves prior state untouched.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum BlendError {
    /// Non-finite or beyond the safe integer magnitude
    #[error("Invalid number for {name}: {value}")]
    InvalidNumber { name: String, value: f32 },

    /// Finite but below the allowed minimum
    #[error("{name} = {value} is out of range (minimum {min})")]
    OutOfRange { name: String, value: f32, min: f32 },

    /// Finite but outside [0, 1]
    #[error("{name} = {value} is outside [0, 1]")]
    OutOfUnitRange { name: String, value: f32 },

    /// Finite but outside [0, 2π]
    #[error("Invalid azimuth for {name}: {value}")]
    InvalidAzimuth { name: String, value: f32 },

    /// Clip duration must be positive
    #[error("Invalid clip duration: {duration}")]
    InvalidDuration { duration: f32 },

    #[error("Insufficient anchors: {actual} supplied, at least {required} required")]
    InsufficientAnchors { required: usize, actual: usize },

    #[error("Duplicate anchor value: {value}")]
    DuplicateValue { value: f32 },

    #[error("Duplicate polar coordinates: radius {radius}, azimuth {azimuth}")]
    DuplicateCoordinates { radius: f32, azimuth: f32 },

    #[error("Duplicate point: ({x}, {y})")]
    DuplicatePoint { x: f32, y: f32 },

    #[error("All points are collinear; no triangulation is possible")]
    CollinearPoints,

    #[error("Invalid polar grid: {reason}")]
    InvalidGrid { reason: String },

    #[error("Insufficient rays: {rays} distinct azimuth(s), at least 2 required")]
    InsufficientRays { rays: usize },

    /// A transition whose source and target are the same state
    #[error("Transition loops back onto its source state")]
    InvalidLoop,

    #[error("Duplicate transition for trigger {trigger}")]
    DuplicateTransition { trigger: String },

    #[error("State {state:?} is not registered with this machine")]
    UnknownState { state: StateId },

    #[error("Data transitions require a condition")]
    MissingCondition,

    /// Triangulation produced an inconsistent boundary. Never caused by user input.
    #[error("Internal invariant violated: {reason}")]
    InternalInvariantViolation { reason: String },
}

impl BlendError {
    /// Get error category for logging/metrics
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidNumber { .. }
            | Self::OutOfRange { .. }
            | Self::OutOfUnitRange { .. }
            | Self::InvalidAzimuth { .. } => "validation",
            Self::InvalidDuration { .. }
            | Self::InsufficientAnchors { .. }
            | Self::DuplicateValue { .. }
            | Self::DuplicateCoordinates { .. }
            | Self::DuplicatePoint { .. }
            | Self::CollinearPoints
            | Self::InvalidGrid { .. }
            | Self::InsufficientRays { .. } => "construction",
            Self::InvalidLoop
            | Self::DuplicateTransition { .. }
            | Self::UnknownState { .. }
            | Self::MissingCondition => "transition",
            Self::InternalInvariantViolation { .. } => "internal",
        }
    }
}
