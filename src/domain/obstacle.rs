//! Exclusion zones the road generator steers around.

use super::{Angle, Position};

/// Number of points tested strictly between the end points of a segment.
const SEGMENT_INTERIOR_SAMPLES: usize = 4;

#[derive(Clone, Debug, PartialEq, PartialOrd)]
pub enum Obstacle {
    Circle {
        center: Position,
        radius: f64,
    },
    /// Axis-aligned rectangle.
    Rect {
        center: Position,
        half_x: f64,
        half_z: f64,
    },
}

impl Obstacle {
    pub fn center(&self) -> Position {
        match self {
            Obstacle::Circle { center, .. } | Obstacle::Rect { center, .. } => *center,
        }
    }

    /// Same shape grown by `margin` on every side.
    pub fn inflated(&self, margin: f64) -> Obstacle {
        match *self {
            Obstacle::Circle { center, radius } => Obstacle::Circle {
                center,
                radius: radius + margin,
            },
            Obstacle::Rect {
                center,
                half_x,
                half_z,
            } => Obstacle::Rect {
                center,
                half_x: half_x + margin,
                half_z: half_z + margin,
            },
        }
    }

    pub fn contains(&self, position: Position, margin: f64) -> bool {
        match *self {
            Obstacle::Circle { center, radius } => {
                let dx = position.x() - center.x();
                let dz = position.z() - center.z();
                dx * dx + dz * dz < (radius + margin) * (radius + margin)
            }
            Obstacle::Rect {
                center,
                half_x,
                half_z,
            } => {
                (position.x() - center.x()).abs() < half_x + margin
                    && (position.z() - center.z()).abs() < half_z + margin
            }
        }
    }

    /// Distance from `position` to the shape's surface together with the outward direction.
    ///
    /// Circles report a negative distance for points inside. Rectangles clamp to zero inside
    /// and then point away from their center.
    fn clearance(&self, position: Position) -> (f64, Position) {
        match *self {
            Obstacle::Circle { center, radius } => {
                let offset = position - center;
                (offset.length() - radius, offset)
            }
            Obstacle::Rect {
                center,
                half_x,
                half_z,
            } => {
                let offset = position - center;
                let outside = Position::new(
                    (offset.x().abs() - half_x).max(0.0) * sign(offset.x()),
                    (offset.z().abs() - half_z).max(0.0) * sign(offset.z()),
                );
                let distance = outside.length();
                if distance > 0.0 {
                    (distance, outside)
                } else {
                    (distance, offset)
                }
            }
        }
    }
}

fn sign(value: f64) -> f64 {
    if value == 0.0 {
        0.0
    } else {
        value.signum()
    }
}

#[derive(Clone, Debug, Default, PartialEq, PartialOrd)]
pub struct ObstacleField {
    obstacles: Vec<Obstacle>,
}

impl ObstacleField {
    pub fn new(obstacles: Vec<Obstacle>) -> Self {
        Self { obstacles }
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    pub fn add(&mut self, obstacle: Obstacle) {
        self.obstacles.push(obstacle);
    }

    pub fn point_hits(&self, position: Position, margin: f64) -> bool {
        self.obstacles.iter().any(|o| o.contains(position, margin))
    }

    /// Approximate test: only a fixed number of interior points is checked, so thin obstacles
    /// crossed between two samples are missed.
    pub fn segment_hits(&self, p1: Position, p2: Position, margin: f64) -> bool {
        (1..=SEGMENT_INTERIOR_SAMPLES).any(|i| {
            let t = i as f64 / (SEGMENT_INTERIOR_SAMPLES + 1) as f64;
            self.point_hits(p1.lerp(p2, t), margin)
        })
    }

    /// Direction pointing from the closest obstacle towards `position`.
    pub fn nearest_avoidance_heading(&self, position: Position) -> Option<Angle> {
        self.obstacles
            .iter()
            .map(|o| o.clearance(position))
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, direction)| direction.angle())
    }
}
