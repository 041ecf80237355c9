//! Core measurement types shared across the ingestion pipeline.

use std::time::Instant;

/// Anchor identifier. The firmware numbers anchors with small non-negative
/// integers, 0 through 3 on our rig.
pub type Id = u32;

/// The latest readings reported by one anchor. Each telemetry line carries
/// exactly one field for one anchor, so fields fill in (and are overwritten)
/// independently.
#[derive(Debug, Clone, PartialEq)]
pub struct AnchorMeasurement {
    /// Which anchor reported.
    pub id: Id,
    /// Line-of-sight indicator, 0 when the path was unobstructed.
    pub n_los: Option<i32>,
    /// Two-way-ranging distance in centimeters, as transmitted.
    pub distance: Option<i32>,
    /// Angle-of-arrival azimuth, degrees.
    pub azimuth: Option<f32>,
    /// Angle-of-arrival elevation, degrees.
    pub elevation: Option<f32>,
}

impl AnchorMeasurement {
    /// A fresh record with every field unset.
    pub fn new(id: Id) -> Self {
        AnchorMeasurement {
            id,
            n_los: None,
            distance: None,
            azimuth: None,
            elevation: None,
        }
    }

    /// Whether this anchor can participate in a position fix. Only the
    /// distance is required; angle fields may stay absent.
    pub fn is_complete_for_positioning(&self) -> bool {
        self.distance.is_some()
    }
}

/// One complete round of measurements, emitted at most once per fully-fresh
/// set of required anchors. The measurements appear in required-id order.
#[derive(Debug, Clone)]
pub struct MeasurementSet {
    /// The measurements, one per required anchor.
    pub anchors: Vec<AnchorMeasurement>,
    /// When the set was completed, on the monotonic clock.
    pub captured_at: Instant,
}

/// `LineSource`
///
/// A clearable iterator that yields raw telemetry lines when iterated upon.
/// Lets the pipeline run against a real serial port, a replay, or the
/// simulator interchangeably.
pub trait LineSource: Iterator<Item = String> {
    /// Drop any buffered lines.
    fn clear(&mut self);
}
