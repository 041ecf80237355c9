//! Anchor layout derivation: the user measures the three inter-anchor
//! distances with a tape measure, and this module turns them into room
//! coordinates for the localizer.

use serde::{Deserialize, Serialize};

use crate::Point;

use std::{error::Error, fmt};

/// The rectangular room the rig lives in, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoomBounds {
    /// East-west extent.
    pub width: f64,
    /// North-south extent.
    pub height: f64,
}

impl RoomBounds {
    /// Clamp a point into the room, for presentation purposes.
    pub fn clamp(&self, p: Point) -> Point {
        Point {
            x: p.x.clamp(0.0, self.width),
            y: p.y.clamp(0.0, self.height),
        }
    }
}

/// Why a set of inter-anchor distances could not be turned into a layout.
/// These are configuration mistakes, surfaced to the user as messages
/// rather than crashes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LayoutError {
    /// The three distances violate the (strict) triangle inequality or are
    /// not all positive.
    InvalidTriangle,
    /// The derived layout is bigger than the room.
    LayoutExceedsRoom {
        /// Bounding-box width the layout would need, meters.
        width: f64,
        /// Bounding-box height the layout would need, meters.
        height: f64,
    },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LayoutError::InvalidTriangle => write!(
                f,
                "invalid anchor distances: each distance must be positive and \
                 shorter than the sum of the other two"
            ),
            LayoutError::LayoutExceedsRoom { width, height } => write!(
                f,
                "anchor layout needs {:.2} m x {:.2} m and does not fit the room; \
                 enlarge the room or shorten the anchor distances",
                width, height
            ),
        }
    }
}

impl Error for LayoutError {}

/// Canonical anchor placement: three room coordinates plus the pairwise
/// distances they were generated from. The two representations are kept
/// consistent through every operation here.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorLayout {
    /// Positions of anchors 0, 1 and 2.
    pub anchors: [Point; 3],
    /// Distance between anchors 0 and 1, meters.
    pub d01: f64,
    /// Distance between anchors 0 and 2, meters.
    pub d02: f64,
    /// Distance between anchors 1 and 2, meters.
    pub d12: f64,
}

fn is_valid_triangle(a: f64, b: f64, c: f64) -> bool {
    a + b > c && a + c > b && b + c > a && a > 0.0 && b > 0.0 && c > 0.0
}

/// Derives anchor coordinates from the three pairwise distances and
/// centers the resulting triangle in the room.
///
/// Anchor 0 goes at the origin and anchor 1 on the positive x-axis, so
/// anchor 2 lands at `x2 = (d01² + d02² - d12²) / (2·d01)`,
/// `y2 = sqrt(d02² - x2²)`. The non-negative root is always taken: the
/// layout commits to the upper half-plane and never returns the mirror
/// solution. The whole triangle is then translated so its bounding box
/// sits centered in the room, which makes the result deterministic in the
/// inputs.
pub fn compute_layout(
    d01: f64,
    d02: f64,
    d12: f64,
    room: &RoomBounds,
) -> Result<AnchorLayout, LayoutError> {
    if !is_valid_triangle(d01, d02, d12) {
        return Err(LayoutError::InvalidTriangle);
    }

    let anchor0 = Point { x: 0.0, y: 0.0 };
    let anchor1 = Point { x: d01, y: 0.0 };

    let x2 = (d01 * d01 + d02 * d02 - d12 * d12) / (2.0 * d01);
    let y2_squared = d02 * d02 - x2 * x2;
    // The triangle inequality should rule this out, but floating-point
    // slack near degenerate triangles can still push the radicand negative.
    if y2_squared < 0.0 {
        return Err(LayoutError::InvalidTriangle);
    }
    let anchor2 = Point {
        x: x2,
        y: y2_squared.sqrt(),
    };

    let min_x = anchor0.x.min(anchor1.x).min(anchor2.x);
    let max_x = anchor0.x.max(anchor1.x).max(anchor2.x);
    let min_y = anchor0.y.min(anchor1.y).min(anchor2.y);
    let max_y = anchor0.y.max(anchor1.y).max(anchor2.y);

    let required_width = max_x - min_x;
    let required_height = max_y - min_y;
    if required_width > room.width || required_height > room.height {
        return Err(LayoutError::LayoutExceedsRoom {
            width: required_width,
            height: required_height,
        });
    }

    let offset_x = (room.width - required_width) / 2.0 - min_x;
    let offset_y = (room.height - required_height) / 2.0 - min_y;
    let place = |p: Point| Point {
        x: p.x + offset_x,
        y: p.y + offset_y,
    };

    Ok(AnchorLayout {
        anchors: [place(anchor0), place(anchor1), place(anchor2)],
        d01,
        d02,
        d12,
    })
}

impl AnchorLayout {
    /// Manually reposition one anchor, clamped to the room, and recompute
    /// the pairwise distances from the edited coordinates. This is the
    /// reverse of [`compute_layout`]: coordinates lead, distances follow.
    /// Indexes other than 0..=2 leave the layout untouched.
    pub fn move_anchor(&mut self, index: usize, to: Point, room: &RoomBounds) {
        let Some(anchor) = self.anchors.get_mut(index) else {
            return;
        };
        *anchor = room.clamp(to);

        let [a0, a1, a2] = &self.anchors;
        self.d01 = a0.distance_to(a1);
        self.d02 = a0.distance_to(a2);
        self.d12 = a1.distance_to(a2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOM: RoomBounds = RoomBounds {
        width: 10.0,
        height: 10.0,
    };

    #[test]
    fn equilateral_layout_reproduces_its_distances() {
        let layout = compute_layout(6.0, 6.0, 6.0, &ROOM).unwrap();
        let [a0, a1, a2] = &layout.anchors;

        assert!((a0.distance_to(a1) - 6.0).abs() < 1e-6);
        assert!((a0.distance_to(a2) - 6.0).abs() < 1e-6);
        assert!((a1.distance_to(a2) - 6.0).abs() < 1e-6);
    }

    #[test]
    fn layout_is_centered_in_the_room() {
        let layout = compute_layout(6.0, 6.0, 6.0, &ROOM).unwrap();
        let xs: Vec<f64> = layout.anchors.iter().map(|p| p.x).collect();
        let ys: Vec<f64> = layout.anchors.iter().map(|p| p.y).collect();

        let mid_x = (xs.iter().cloned().fold(f64::MAX, f64::min)
            + xs.iter().cloned().fold(f64::MIN, f64::max))
            / 2.0;
        let mid_y = (ys.iter().cloned().fold(f64::MAX, f64::min)
            + ys.iter().cloned().fold(f64::MIN, f64::max))
            / 2.0;
        assert!((mid_x - ROOM.width / 2.0).abs() < 1e-9);
        assert!((mid_y - ROOM.height / 2.0).abs() < 1e-9);

        // Same inputs, same placement.
        assert_eq!(layout, compute_layout(6.0, 6.0, 6.0, &ROOM).unwrap());
    }

    #[test]
    fn impossible_triangle_is_rejected() {
        assert_eq!(
            compute_layout(1.0, 1.0, 10.0, &ROOM),
            Err(LayoutError::InvalidTriangle)
        );
        assert_eq!(
            compute_layout(0.0, 6.0, 6.0, &ROOM),
            Err(LayoutError::InvalidTriangle)
        );
        // Degenerate (collinear) triangles fail the strict inequality too.
        assert_eq!(
            compute_layout(3.0, 3.0, 6.0, &ROOM),
            Err(LayoutError::InvalidTriangle)
        );
    }

    #[test]
    fn oversized_layout_is_rejected() {
        let small = RoomBounds {
            width: 5.0,
            height: 5.0,
        };
        match compute_layout(6.0, 6.0, 6.0, &small) {
            Err(LayoutError::LayoutExceedsRoom { width, .. }) => {
                assert!((width - 6.0).abs() < 1e-9);
            }
            other => panic!("expected LayoutExceedsRoom, got {:?}", other),
        }
    }

    #[test]
    fn moving_an_anchor_keeps_distances_consistent() {
        let mut layout = compute_layout(6.0, 6.0, 6.0, &ROOM).unwrap();
        // Way outside the room; should clamp to the near corner.
        layout.move_anchor(2, Point { x: 14.0, y: -3.0 }, &ROOM);

        assert_eq!(layout.anchors[2], Point { x: 10.0, y: 0.0 });
        let [a0, a1, a2] = &layout.anchors;
        assert!((layout.d01 - a0.distance_to(a1)).abs() < 1e-12);
        assert!((layout.d02 - a0.distance_to(a2)).abs() < 1e-12);
        assert!((layout.d12 - a1.distance_to(a2)).abs() < 1e-12);
    }

    #[test]
    fn moving_an_out_of_range_index_is_a_no_op() {
        let mut layout = compute_layout(6.0, 6.0, 6.0, &ROOM).unwrap();
        let before = layout.clone();
        layout.move_anchor(7, Point { x: 1.0, y: 1.0 }, &ROOM);
        assert_eq!(layout, before);
    }
}
