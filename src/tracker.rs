//! Single-object re-identification across frames.
//!
//! Matching is deliberately simple: same class label and a top-left corner that
//! moved less than a fixed radius on each axis. No motion model, no IoU.

use serde::Serialize;

use crate::detect::Detection;
use crate::DEFAULT_MATCH_RADIUS_PX;

/// First valid measurement after (re)selection, used for relative depth.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Baseline {
    pub initial_width_px: f64,
    pub initial_distance_cm: f64,
}

/// The object the user selected, as last seen.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrackedObject {
    detection: Detection,
    baseline: Option<Baseline>,
    missed_frames: u32,
}

impl TrackedObject {
    pub fn new(detection: Detection) -> Self {
        Self {
            detection,
            baseline: None,
            missed_frames: 0,
        }
    }

    pub fn detection(&self) -> &Detection {
        &self.detection
    }

    pub fn class_label(&self) -> &str {
        &self.detection.class_label
    }

    pub fn baseline(&self) -> Option<Baseline> {
        self.baseline
    }

    /// Consecutive frames without a matching detection.
    pub fn missed_frames(&self) -> u32 {
        self.missed_frames
    }

    /// Record the baseline if none is held yet. Returns true when it was captured.
    ///
    /// Width and distance are only ever set together.
    pub fn capture_baseline(&mut self, initial_width_px: f64, initial_distance_cm: f64) -> bool {
        if self.baseline.is_some() {
            return false;
        }
        self.baseline = Some(Baseline {
            initial_width_px,
            initial_distance_cm,
        });
        true
    }
}

/// Picks the current detection that continues a tracked object.
#[derive(Clone, Copy, Debug)]
pub struct ObjectTracker {
    match_radius_px: f64,
}

impl Default for ObjectTracker {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_RADIUS_PX)
    }
}

impl ObjectTracker {
    pub fn new(match_radius_px: f64) -> Self {
        Self { match_radius_px }
    }

    pub fn match_radius_px(&self) -> f64 {
        self.match_radius_px
    }

    /// Index of the first detection that matches `previous`, in detector order.
    ///
    /// The detector's own ordering is the tie-break when several candidates qualify:
    /// arbitrary, but deterministic for a given detector output.
    pub fn find_match(&self, previous: &Detection, detections: &[Detection]) -> Option<usize> {
        detections.iter().position(|candidate| {
            candidate.class_label == previous.class_label
                && (candidate.bbox.x - previous.bbox.x).abs() < self.match_radius_px
                && (candidate.bbox.y - previous.bbox.y).abs() < self.match_radius_px
        })
    }

    /// Advance `previous` by one frame.
    ///
    /// On a match the detection is replaced and the baseline carried over. With no
    /// match the object is treated as occluded: the old detection is kept and the
    /// miss counter grows. This never loses the object on its own.
    pub fn track(&self, previous: TrackedObject, detections: &[Detection]) -> TrackedObject {
        match self.find_match(&previous.detection, detections) {
            Some(index) => TrackedObject {
                detection: detections[index].clone(),
                baseline: previous.baseline,
                missed_frames: 0,
            },
            None => {
                log::trace!(
                    "no match for {:?} among {} detections",
                    previous.detection.class_label,
                    detections.len()
                );
                TrackedObject {
                    missed_frames: previous.missed_frames.saturating_add(1),
                    ..previous
                }
            }
        }
    }
}
