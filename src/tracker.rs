//! Glue between the measurement store and the solvers: drains complete
//! measurement sets, converts units, and produces tag fixes.

use log::warn;

use crate::layout::AnchorLayout;
use crate::localizer::solve_position;
use crate::measurement::Id;
use crate::measurement_store::MeasurementStore;
use crate::proximity::{classify, ProximityLevel};
use crate::Point;

use std::time::Instant;

/// The anchors that take part in trilateration, in the order the solver
/// expects them.
pub const POSITIONING_ANCHORS: [Id; 3] = [0, 1, 2];

/// One position fix for the tag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TagFix {
    /// Where the tag is, room-relative meters. Not clamped to the room;
    /// a noisy fix can land slightly outside it.
    pub position: Point,
    /// Feedback level for the auxiliary anchor, when one is tracked and
    /// in range.
    pub proximity: Option<ProximityLevel>,
    /// When the underlying measurement set was completed.
    pub captured_at: Instant,
}

/// Polls the store for complete measurement sets and turns them into
/// [`TagFix`]es against a fixed anchor layout.
pub struct Tracker {
    layout: AnchorLayout,
    aux_anchor: Option<Id>,
    required: Vec<Id>,
}

impl Tracker {
    /// A tracker over anchors 0..=2, optionally also gating on and
    /// classifying an auxiliary anchor. With an auxiliary anchor set, no
    /// fix is produced until it reports too.
    pub fn new(layout: AnchorLayout, aux_anchor: Option<Id>) -> Self {
        let mut required = POSITIONING_ANCHORS.to_vec();
        if let Some(id) = aux_anchor {
            if !required.contains(&id) {
                required.push(id);
            }
        }
        Tracker {
            layout,
            aux_anchor,
            required,
        }
    }

    /// The anchor ids a measurement set must cover before a fix comes out.
    pub fn required_ids(&self) -> &[Id] {
        &self.required
    }

    /// The layout fixes are solved against.
    pub fn layout(&self) -> &AnchorLayout {
        &self.layout
    }

    /// Swap in a new layout, e.g. after the user re-measures distances.
    pub fn set_layout(&mut self, layout: AnchorLayout) {
        self.layout = layout;
    }

    /// Take one complete measurement set from the store, if available, and
    /// solve it. Geometry failures are logged and swallowed: the set is
    /// already consumed, and the caller just keeps its last known fix.
    pub fn poll(&self, store: &MeasurementStore) -> Option<TagFix> {
        let set = store.try_take_complete_set(&self.required)?;

        // Ranges arrive in whole centimeters; the solver wants meters.
        let mut ranges_m = [0.0_f64; 3];
        for (range, m) in ranges_m.iter_mut().zip(&set.anchors) {
            // The store only hands out complete records, but stay total.
            *range = f64::from(m.distance?) / 100.0;
        }

        let position = match solve_position(&self.layout.anchors, &ranges_m) {
            Ok(p) => p,
            Err(e) => {
                warn!("dropping measurement set: {}", e);
                return None;
            }
        };

        let proximity = self.aux_anchor.and_then(|id| {
            set.anchors
                .iter()
                .find(|m| m.id == id)
                .and_then(|m| m.distance)
                .and_then(classify)
        });

        Some(TagFix {
            position,
            proximity,
            captured_at: set.captured_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{compute_layout, RoomBounds};

    const ROOM: RoomBounds = RoomBounds {
        width: 10.0,
        height: 10.0,
    };

    fn feed_distances(store: &MeasurementStore, layout: &AnchorLayout, tag: Point) {
        for (id, anchor) in layout.anchors.iter().enumerate() {
            let cm = (anchor.distance_to(&tag) * 100.0).round() as i32;
            store.ingest_line(&format!("INFO : TWR[{id}].distance : {cm}"));
        }
    }

    #[test]
    fn lines_in_fix_out() {
        let layout = compute_layout(6.0, 6.0, 6.0, &ROOM).unwrap();
        let tracker = Tracker::new(layout.clone(), None);
        let store = MeasurementStore::new();

        let tag = Point { x: 5.0, y: 4.0 };
        feed_distances(&store, &layout, tag);

        let fix = tracker.poll(&store).unwrap();
        // The wire carries whole centimeters, so allow a little slack.
        assert!(fix.position.distance_to(&tag) < 0.05);
        assert_eq!(fix.proximity, None);

        // The set was consumed; no second fix until fresh data arrives.
        assert!(tracker.poll(&store).is_none());
    }

    #[test]
    fn auxiliary_anchor_gates_and_classifies() {
        let layout = compute_layout(6.0, 6.0, 6.0, &ROOM).unwrap();
        let tracker = Tracker::new(layout.clone(), Some(3));
        assert_eq!(tracker.required_ids(), &[0, 1, 2, 3]);

        let store = MeasurementStore::new();
        feed_distances(&store, &layout, Point { x: 5.0, y: 4.0 });
        // Three positioning anchors are in, but the auxiliary one is not.
        assert!(tracker.poll(&store).is_none());

        store.ingest_line("INFO : TWR[3].distance : 25");
        let fix = tracker.poll(&store).unwrap();
        assert_eq!(fix.proximity, Some(ProximityLevel::Contact));
    }

    #[test]
    fn degenerate_layout_yields_no_fix() {
        // Hand-built collinear layout; compute_layout would refuse it.
        let layout = AnchorLayout {
            anchors: [
                Point { x: 1.0, y: 1.0 },
                Point { x: 2.0, y: 1.0 },
                Point { x: 3.0, y: 1.0 },
            ],
            d01: 1.0,
            d02: 2.0,
            d12: 1.0,
        };
        let tracker = Tracker::new(layout, None);
        let store = MeasurementStore::new();
        for id in 0..3 {
            store.ingest_line(&format!("INFO : TWR[{id}].distance : 100"));
        }
        assert!(tracker.poll(&store).is_none());
    }
}
