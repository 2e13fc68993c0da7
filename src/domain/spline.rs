//! Closed centripetal Catmull-Rom spline.

use super::Position;

/// Exponent of the knot spacing. 0.5 gives the centripetal parameterisation, which avoids
/// cusps and self-intersections within a segment.
const ALPHA: f64 = 0.5;

/// Smallest knot interval, guarding against coincident control points.
const MIN_KNOT_INTERVAL: f64 = 1e-9;

#[derive(Clone, Debug, PartialEq)]
pub struct ClosedSpline {
    control_points: Vec<Position>,
}

impl ClosedSpline {
    pub fn new(control_points: Vec<Position>) -> Self {
        Self { control_points }
    }

    pub fn control_points(&self) -> &[Position] {
        &self.control_points
    }

    /// Number of segments, one per control point since the curve wraps around.
    pub fn segment_count(&self) -> usize {
        self.control_points.len()
    }

    /// Point at global parameter `s` in `[0, segment_count)`. Segment `i` runs from control
    /// point `i` to control point `i + 1`. Values outside the range wrap.
    pub fn point(&self, s: f64) -> Position {
        let n = self.control_points.len();
        match n {
            0 => return Position::default(),
            1 => return self.control_points[0],
            _ => {}
        }
        let s = s.rem_euclid(n as f64);
        let segment = (s.floor() as usize).min(n - 1);
        let u = s - segment as f64;
        let p = |offset: isize| {
            self.control_points[(segment as isize + offset).rem_euclid(n as isize) as usize]
        };
        centripetal_point(p(-1), p(0), p(1), p(2), u)
    }

    /// `count` points at equal parameter steps around the loop, starting at control point 0.
    pub fn sample(&self, count: usize) -> Vec<Position> {
        let n = self.segment_count() as f64;
        (0..count)
            .map(|k| self.point(k as f64 * n / count as f64))
            .collect()
    }
}

fn knot(t: f64, from: Position, to: Position) -> f64 {
    t + from.distance(to).powf(ALPHA).max(MIN_KNOT_INTERVAL)
}

/// Barry-Goldman evaluation of the segment between `p1` and `p2` at `u` in `[0, 1]`.
fn centripetal_point(p0: Position, p1: Position, p2: Position, p3: Position, u: f64) -> Position {
    let t0 = 0.0;
    let t1 = knot(t0, p0, p1);
    let t2 = knot(t1, p1, p2);
    let t3 = knot(t2, p2, p3);
    let t = t1 + (t2 - t1) * u;

    let a1 = p0 * ((t1 - t) / (t1 - t0)) + p1 * ((t - t0) / (t1 - t0));
    let a2 = p1 * ((t2 - t) / (t2 - t1)) + p2 * ((t - t1) / (t2 - t1));
    let a3 = p2 * ((t3 - t) / (t3 - t2)) + p3 * ((t - t2) / (t3 - t2));
    let b1 = a1 * ((t2 - t) / (t2 - t0)) + a2 * ((t - t0) / (t2 - t0));
    let b2 = a2 * ((t3 - t) / (t3 - t1)) + a3 * ((t - t1) / (t3 - t1));
    b1 * ((t2 - t) / (t2 - t1)) + b2 * ((t - t1) / (t2 - t1))
}
