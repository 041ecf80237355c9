//! Trilateration: turning three anchor distances into a tag position.

use crate::Point;

use std::{error::Error, fmt};

/// Why a position could not be computed from a measurement set. Neither
/// case is fatal; the caller keeps its last known fix and waits for the
/// next set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalizeError {
    /// The anchors are collinear or coincident, so the linear system has
    /// no unique solution.
    DegenerateGeometry,
    /// The solution came out NaN, typically from NaN creeping in through
    /// a degenerate input.
    NumericInstability,
}

impl fmt::Display for LocalizeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = match self {
            LocalizeError::DegenerateGeometry => "anchors are collinear or coincident",
            LocalizeError::NumericInstability => "position calculation produced NaN",
        };
        write!(f, "{}", msg)
    }
}

impl Error for LocalizeError {}

/// Solves for the tag position given three anchor positions and the
/// measured distance to each, all in meters. (The radio transmits
/// centimeters; divide by 100 before calling.)
///
/// Subtracting anchor 0's circle equation from anchors 1 and 2 leaves two
/// linear equations,
///
/// ```text
/// 2(x1-x0)x + 2(y1-y0)y = (r0² - r1²) + (x1² - x0²) + (y1² - y0²)
/// 2(x2-x0)x + 2(y2-y0)y = (r0² - r2²) + (x2² - x0²) + (y2² - y0²)
/// ```
///
/// which Cramer's rule solves directly. The result is not clamped to any
/// room; presentation layers decide what to do with out-of-bounds fixes.
pub fn solve_position(
    anchors: &[Point; 3],
    distances_m: &[f64; 3],
) -> Result<Point, LocalizeError> {
    let [p0, p1, p2] = anchors;
    let [r0, r1, r2] = distances_m;

    let a = 2.0 * (p1.x - p0.x);
    let b = 2.0 * (p1.y - p0.y);
    let c = r0 * r0 - r1 * r1 + p1.x * p1.x - p0.x * p0.x + p1.y * p1.y - p0.y * p0.y;

    let d = 2.0 * (p2.x - p0.x);
    let e = 2.0 * (p2.y - p0.y);
    let f = r0 * r0 - r2 * r2 + p2.x * p2.x - p0.x * p0.x + p2.y * p2.y - p0.y * p0.y;

    let denominator = a * e - b * d;
    if denominator == 0.0 || denominator.is_nan() {
        return Err(LocalizeError::DegenerateGeometry);
    }

    let x = (c * e - b * f) / denominator;
    let y = (a * f - c * d) / denominator;
    if x.is_nan() || y.is_nan() {
        return Err(LocalizeError::NumericInstability);
    }

    Ok(Point { x, y })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> [Point; 3] {
        [
            Point { x: 0.0, y: 0.0 },
            Point { x: 6.0, y: 0.0 },
            Point { x: 3.0, y: 5.196 },
        ]
    }

    #[test]
    fn recovers_a_known_tag_position() {
        let anchors = triangle();
        let tag = Point { x: 3.0, y: 2.0 };
        let distances = [
            anchors[0].distance_to(&tag),
            anchors[1].distance_to(&tag),
            anchors[2].distance_to(&tag),
        ];

        let fix = solve_position(&anchors, &distances).unwrap();
        assert!((fix.x - 3.0).abs() < 1e-3);
        assert!((fix.y - 2.0).abs() < 1e-3);
    }

    #[test]
    fn collinear_anchors_are_degenerate() {
        let anchors = [
            Point { x: 0.0, y: 0.0 },
            Point { x: 3.0, y: 0.0 },
            Point { x: 6.0, y: 0.0 },
        ];
        assert_eq!(
            solve_position(&anchors, &[1.0, 2.0, 3.0]),
            Err(LocalizeError::DegenerateGeometry)
        );
    }

    #[test]
    fn coincident_anchors_are_degenerate() {
        let p = Point { x: 2.0, y: 2.0 };
        assert_eq!(
            solve_position(&[p, p, p], &[1.0, 1.0, 1.0]),
            Err(LocalizeError::DegenerateGeometry)
        );
    }

    #[test]
    fn nan_distance_is_caught_not_propagated() {
        let res = solve_position(&triangle(), &[f64::NAN, 2.0, 3.0]);
        assert_eq!(res, Err(LocalizeError::NumericInstability));
    }
}
