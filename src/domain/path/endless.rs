//! Forward-growing road with greedy obstacle avoidance.
//!
//! Each new point is placed one step ahead of the previous one. The heading bends with smoothed
//! noise and, when the candidate runs into the obstacle field, is nudged away from the nearest
//! obstacle. Every accepted heading change stays within `max_curvature * step_length`. After a
//! bounded number of attempts the last candidate is accepted regardless, so generation never
//! stalls.

use log::{debug, info, trace};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::{CenterlinePoint, PathError, PathGenerator};
use crate::domain::{Angle, NoiseConfig, ObstacleField, Position, SmoothedNoise};

#[derive(Clone, Debug, PartialEq)]
pub struct RoadConfig {
    pub step_length: f64,
    /// Maximum heading change per meter of road.
    pub max_curvature: f64,
    /// Time step fed to the noise generator per new point.
    pub generation_dt: f64,
    pub noise: NoiseConfig,
    /// Clearance added around every obstacle when testing candidates.
    pub avoid_margin: f64,
    pub max_attempts: usize,
    /// Heading nudge away from the nearest obstacle per attempt.
    pub avoidance_turn: f64,
    /// Heading nudge per attempt when no obstacle hint is available.
    pub random_turn: f64,
    /// Additional points probed beyond the candidate along its heading.
    pub lookahead_steps: usize,
    /// Hard cap on the number of points. Extension stops silently once reached.
    pub max_points: usize,
    pub initial_points: usize,
}

impl RoadConfig {
    pub fn validate(&self) -> Result<(), PathError> {
        self.noise.validate()?;
        if !(self.step_length > 0.0) {
            return Err(PathError::InvalidStepLength(self.step_length));
        }
        if !(self.max_curvature >= 0.0) {
            return Err(PathError::InvalidCurvature(self.max_curvature));
        }
        if !(self.avoid_margin >= 0.0) {
            return Err(PathError::InvalidMargin(self.avoid_margin));
        }
        if self.max_points < 2 {
            return Err(PathError::InvalidCapacity(self.max_points));
        }
        Ok(())
    }

    /// Largest heading change between two consecutive points.
    pub fn max_turn(&self) -> f64 {
        self.max_curvature * self.step_length
    }
}

impl Default for RoadConfig {
    fn default() -> Self {
        Self {
            step_length: 6.0,
            max_curvature: 0.015,
            generation_dt: 1.0 / 60.0,
            noise: NoiseConfig::default(),
            avoid_margin: 0.0,
            max_attempts: 24,
            avoidance_turn: 0.3,
            random_turn: 0.6,
            lookahead_steps: 12,
            max_points: 5000,
            initial_points: 60,
        }
    }
}

#[derive(Clone, Debug)]
pub struct EndlessRoad {
    config: RoadConfig,
    points: Vec<CenterlinePoint>,
    noise: SmoothedNoise,
    rng: ChaCha8Rng,
    capped: bool,
}

impl EndlessRoad {
    /// Road consisting of the single point `start`.
    pub fn new(config: RoadConfig, start: CenterlinePoint, seed: u64) -> Result<Self, PathError> {
        config.validate()?;
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let noise = SmoothedNoise::new(config.noise.clone(), rng.random());
        Ok(Self {
            points: vec![start],
            noise,
            rng,
            capped: false,
            config,
        })
    }

    pub fn config(&self) -> &RoadConfig {
        &self.config
    }

    pub fn is_capped(&self) -> bool {
        self.capped
    }

    /// Appends one point. Returns `false` once the hard cap is reached.
    pub fn extend_one(&mut self, obstacles: &ObstacleField) -> bool {
        if self.points.len() >= self.config.max_points {
            if !self.capped {
                info!(
                    "endless road reached its cap of {} points",
                    self.config.max_points
                );
                self.capped = true;
            }
            return false;
        }
        let Some(previous) = self.points.last().copied() else {
            return false;
        };

        let step = self.config.step_length;
        let max_turn = self.config.max_turn();
        let mut turn = (self.noise.next(self.config.generation_dt)
            * self.config.max_curvature
            * step)
            .clamp(-max_turn, max_turn);
        let mut heading = previous.heading + turn;

        let mut attempts = 0;
        while attempts < self.config.max_attempts
            && self.is_blocked(obstacles, previous.position, heading)
        {
            let candidate = previous.position.advance(heading, step);
            let nudge = match obstacles.nearest_avoidance_heading(candidate) {
                Some(away) => {
                    // Turn towards the side the hint points to.
                    if heading.delta_to(away) >= 0.0 {
                        self.config.avoidance_turn
                    } else {
                        -self.config.avoidance_turn
                    }
                }
                None if self.rng.random_bool(0.5) => self.config.random_turn,
                None => -self.config.random_turn,
            };
            let next_turn = (turn + nudge).clamp(-max_turn, max_turn);
            attempts += 1;
            if next_turn == turn {
                trace!(
                    "avoidance saturated at point {} after {attempts} attempts",
                    self.points.len()
                );
                break;
            }
            turn = next_turn;
            heading = previous.heading + turn;
        }
        if attempts == self.config.max_attempts {
            trace!(
                "avoidance gave up at point {} after {attempts} attempts",
                self.points.len()
            );
        }

        self.points.push(CenterlinePoint::new(
            previous.position.advance(heading, step),
            heading,
        ));
        true
    }

    fn is_blocked(&self, obstacles: &ObstacleField, from: Position, heading: Angle) -> bool {
        let step = self.config.step_length;
        let margin = self.config.avoid_margin;
        let candidate = from.advance(heading, step);
        obstacles.point_hits(candidate, margin)
            || obstacles.segment_hits(from, candidate, margin)
            || (1..=self.config.lookahead_steps)
                .any(|k| obstacles.point_hits(candidate.advance(heading, k as f64 * step), margin))
    }
}

impl PathGenerator for EndlessRoad {
    fn points(&self) -> &[CenterlinePoint] {
        &self.points
    }

    fn is_closed(&self) -> bool {
        false
    }

    fn step_length(&self) -> f64 {
        self.config.step_length
    }

    fn ensure_ahead(&mut self, obstacles: &ObstacleField, min_count: usize) -> usize {
        let before = self.points.len();
        while self.points.len() < min_count {
            if !self.extend_one(obstacles) {
                break;
            }
        }
        let appended = self.points.len() - before;
        if appended > 0 {
            debug!(
                "extended endless road by {appended} points, frontier at {}",
                self.frontier()
            );
        }
        appended
    }
}
