//! The thread-safe store where per-anchor readings accumulate until every
//! anchor in a required group has reported a distance.

use log::{debug, trace};

use crate::measurement::{AnchorMeasurement, Id, MeasurementSet};
use crate::telemetry_decoder::{decode_line, TwrField, TwrReport};

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Instant,
};

/// Latest-reading store keyed by anchor id. Clones share the same
/// underlying map, so the serial reader thread can ingest while the
/// tracking loop polls; the single mutex keeps the two from interleaving.
#[derive(Debug, Default, Clone)]
pub struct MeasurementStore {
    anchors: Arc<Mutex<HashMap<Id, AnchorMeasurement>>>,
}

impl MeasurementStore {
    /// An empty store.
    pub fn new() -> Self {
        MeasurementStore {
            anchors: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Feed one raw telemetry line through the decoder into the store.
    /// Lines that decode to nothing are dropped without complaint;
    /// malformed telemetry is expected on a live link.
    pub fn ingest_line(&self, raw: &str) {
        match decode_line(raw) {
            Some(report) => {
                trace!("ingesting {:?}", report);
                self.apply(report);
            }
            None => trace!("ignoring line {:?}", raw),
        }
    }

    /// Merge one decoded field into the anchor's record, creating the
    /// record with all other fields unset if this anchor is new.
    pub fn apply(&self, report: TwrReport) {
        let mut anchors = self.anchors.lock().unwrap();
        let entry = anchors
            .entry(report.id)
            .or_insert_with(|| AnchorMeasurement::new(report.id));
        match report.field {
            TwrField::NLos(v) => entry.n_los = Some(v),
            TwrField::Distance(v) => entry.distance = Some(v),
            TwrField::AoaAzimuth(v) => entry.azimuth = Some(v),
            TwrField::AoaElevation(v) => entry.elevation = Some(v),
        }
    }

    /// All-or-nothing handoff: if every id in `required` has a record with
    /// a distance, return those measurements (in `required` order) and
    /// remove exactly those entries. Otherwise return `None` and leave the
    /// store untouched, so partial state keeps filling in.
    ///
    /// Removing on success is what makes emission at-most-once per
    /// fully-fresh set: a distance can never be reused across two results.
    /// The cost is that no result is emitted until the slowest anchor
    /// reports.
    pub fn try_take_complete_set(&self, required: &[Id]) -> Option<MeasurementSet> {
        let mut anchors = self.anchors.lock().unwrap();

        let mut set = Vec::with_capacity(required.len());
        for id in required {
            match anchors.get(id) {
                Some(m) if m.is_complete_for_positioning() => set.push(m.clone()),
                _ => return None,
            }
        }
        for id in required {
            anchors.remove(id);
        }

        debug!("measurement set complete for anchors {:?}", required);
        Some(MeasurementSet {
            anchors: set,
            captured_at: Instant::now(),
        })
    }

    /// A copy of the stored record for `id`, if any. Mostly useful for
    /// inspection and tests.
    pub fn get(&self, id: Id) -> Option<AnchorMeasurement> {
        self.anchors.lock().unwrap().get(&id).cloned()
    }

    /// Discard everything, e.g. when the serial link drops, so stale
    /// partial measurements cannot leak into the next session.
    pub fn clear(&self) {
        self.anchors.lock().unwrap().clear();
    }
}
