//! Road surface rows derived from the centerline, ready for mesh upload.

use super::{CenterlinePoint, Position};

/// Cross-section of the road at one centerline point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RoadRow {
    pub left: Position,
    pub right: Position,
    /// Texture coordinate along the road.
    pub v: f64,
}

pub fn road_row(index: usize, point: &CenterlinePoint, width: f64, step_length: f64) -> RoadRow {
    let heading = point.heading.radians();
    let normal = Position::new(-heading.sin(), heading.cos());
    let half_width = 0.5 * width;
    RoadRow {
        left: point.position - normal * half_width,
        right: point.position + normal * half_width,
        v: index as f64 * (step_length / 4.0),
    }
}

pub fn road_rows(points: &[CenterlinePoint], width: f64, step_length: f64) -> Vec<RoadRow> {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| road_row(i, p, width, step_length))
        .collect()
}

/// Triangle indices joining consecutive rows, two vertices per row (left, right). Closed roads
/// also join the last row back to the first.
pub fn road_indices(rows: usize, closed: bool) -> Vec<u32> {
    let quads = match (rows, closed) {
        (0 | 1, _) => 0,
        (n, false) => n - 1,
        (n, true) => n,
    };
    (0..quads)
        .flat_map(|i| {
            let a = (2 * i) as u32;
            let b = a + 1;
            let c = (2 * ((i + 1) % rows)) as u32;
            let d = c + 1;
            [a, b, c, b, d, c]
        })
        .collect()
}
