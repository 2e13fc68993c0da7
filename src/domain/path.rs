//! Procedural centerline generation.
//!
//! Two generators share the [`PathGenerator`] capability: the [`EndlessRoad`] grows forward on
//! demand and steers around obstacles, the [`LoopTrack`] is a closed spline produced in one go
//! from a seed. Their algorithms are deliberately kept apart.

mod endless;
mod looped;

pub use endless::{EndlessRoad, RoadConfig};
pub use looped::{LoopConfig, LoopTrack};

use thiserror::Error;

use super::{Angle, ObstacleField, Position};

#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct CenterlinePoint {
    pub position: Position,
    pub heading: Angle,
}

impl CenterlinePoint {
    pub const fn new(position: Position, heading: Angle) -> Self {
        Self { position, heading }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum GenerationMode {
    #[default]
    Endless,
    Loop,
}

impl GenerationMode {
    pub fn toggled(self) -> Self {
        match self {
            GenerationMode::Endless => GenerationMode::Loop,
            GenerationMode::Loop => GenerationMode::Endless,
        }
    }
}

pub trait PathGenerator: Send + Sync {
    /// Generated centerline. Indices are stable: points are never removed or rewritten.
    fn points(&self) -> &[CenterlinePoint];

    fn is_closed(&self) -> bool;

    /// Nominal spacing between consecutive points.
    fn step_length(&self) -> f64;

    /// Grows the centerline until it holds at least `min_count` points and returns how many
    /// points were appended. Generators that are complete after construction append nothing.
    fn ensure_ahead(&mut self, obstacles: &ObstacleField, min_count: usize) -> usize;

    /// Index of the most recently generated point.
    fn frontier(&self) -> usize {
        self.points().len().saturating_sub(1)
    }

    fn first(&self) -> Option<CenterlinePoint> {
        self.points().first().copied()
    }

    fn last(&self) -> Option<CenterlinePoint> {
        self.points().last().copied()
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathError {
    #[error("smoothing must lie strictly between 0 and 1, got {0}")]
    InvalidSmoothing(f64),
    #[error("resample probability must lie within [0, 1], got {0}")]
    InvalidProbability(f64),
    #[error("step length must be positive, got {0}")]
    InvalidStepLength(f64),
    #[error("curvature limit must not be negative, got {0}")]
    InvalidCurvature(f64),
    #[error("avoidance margin must not be negative, got {0}")]
    InvalidMargin(f64),
    #[error("hard cap must allow at least 2 points, got {0}")]
    InvalidCapacity(usize),
    #[error("a loop needs at least 3 control points, got {0}")]
    TooFewControlPoints(usize),
    #[error("a loop needs at least 3 samples, got {0}")]
    TooFewSegments(usize),
    #[error("base radius must be positive, got {0}")]
    InvalidBaseRadius(f64),
    #[error("radial jitter {jitter} must be non-negative and below the base radius {radius}")]
    InvalidRadialJitter { jitter: f64, radius: f64 },
    #[error("angular jitter must lie within [0, 0.5), got {0}")]
    InvalidAngularJitter(f64),
}
