//! Closed track through jittered control points on a circle.

use std::f64::consts::TAU;

use rand::Rng;

use super::{CenterlinePoint, PathError, PathGenerator};
use crate::domain::{spline::ClosedSpline, Lcg, ObstacleField, Position};

#[derive(Clone, Debug, PartialEq)]
pub struct LoopConfig {
    pub control_points: usize,
    pub base_radius: f64,
    /// Uniform radial perturbation of each control point, in meters.
    pub radial_jitter: f64,
    /// Angular perturbation as a fraction of the spacing between control points.
    pub angular_jitter: f64,
    /// Number of centerline samples around the loop.
    pub segments: usize,
}

impl LoopConfig {
    pub fn validate(&self) -> Result<(), PathError> {
        if self.control_points < 3 {
            return Err(PathError::TooFewControlPoints(self.control_points));
        }
        if self.segments < 3 {
            return Err(PathError::TooFewSegments(self.segments));
        }
        if !(self.base_radius > 0.0) {
            return Err(PathError::InvalidBaseRadius(self.base_radius));
        }
        if !(self.radial_jitter >= 0.0 && self.radial_jitter < self.base_radius) {
            return Err(PathError::InvalidRadialJitter {
                jitter: self.radial_jitter,
                radius: self.base_radius,
            });
        }
        if !(0.0..0.5).contains(&self.angular_jitter) {
            return Err(PathError::InvalidAngularJitter(self.angular_jitter));
        }
        Ok(())
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            control_points: 14,
            base_radius: 320.0,
            radial_jitter: 90.0,
            angular_jitter: 0.35,
            segments: 900,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoopTrack {
    seed: u64,
    spline: ClosedSpline,
    points: Vec<CenterlinePoint>,
    step_length: f64,
}

impl LoopTrack {
    /// Builds the loop. The same configuration and seed always yield the same track.
    pub fn generate(config: &LoopConfig, seed: u64) -> Result<Self, PathError> {
        config.validate()?;
        let spline = ClosedSpline::new(control_points(config, seed));
        let samples = spline.sample(config.segments);
        let n = samples.len();

        // Central differences wrap around, so the tangent is continuous across the seam.
        let points = (0..n)
            .map(|i| {
                let previous = samples[(i + n - 1) % n];
                let next = samples[(i + 1) % n];
                CenterlinePoint::new(samples[i], (next - previous).angle())
            })
            .collect::<Vec<_>>();
        let perimeter = (0..n)
            .map(|i| samples[i].distance(samples[(i + 1) % n]))
            .sum::<f64>();

        Ok(Self {
            seed,
            spline,
            points,
            step_length: perimeter / n as f64,
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Control points sorted by angle around the origin.
    pub fn control_points(&self) -> &[Position] {
        self.spline.control_points()
    }

    pub fn perimeter(&self) -> f64 {
        self.step_length * self.points.len() as f64
    }
}

fn control_points(config: &LoopConfig, seed: u64) -> Vec<Position> {
    let mut rng = Lcg::new(seed);
    let spacing = TAU / config.control_points as f64;
    let max_angle_offset = config.angular_jitter * spacing;
    let mut points = (0..config.control_points)
        .map(|i| {
            let angle = i as f64 * spacing + rng.random_range(-max_angle_offset..=max_angle_offset);
            let radius = config.base_radius
                + rng.random_range(-config.radial_jitter..=config.radial_jitter);
            Position::new(radius * angle.cos(), radius * angle.sin())
        })
        .collect::<Vec<_>>();
    // A star-shaped polygon ordered by angle cannot cross itself.
    points.sort_by(|a, b| {
        a.angle()
            .normalized()
            .radians()
            .total_cmp(&b.angle().normalized().radians())
    });
    points
}

impl PathGenerator for LoopTrack {
    fn points(&self) -> &[CenterlinePoint] {
        &self.points
    }

    fn is_closed(&self) -> bool {
        true
    }

    fn step_length(&self) -> f64 {
        self.step_length
    }

    fn ensure_ahead(&mut self, _obstacles: &ObstacleField, _min_count: usize) -> usize {
        0
    }
}
