//! Measurement session: one user selection followed across frames.
//!
//! ```text
//!   Idle --select--> Tracking --reset--> Idle
//!                    Tracking --frame--> Tracking   (measured or pending)
//! ```
//!
//! The session is synchronous and holds no clock. Frames may arrive at any cadence
//! and a late detector result is simply applied on top of whatever state is current;
//! the last caller to `frame` wins.

use anyhow::Result;
use serde::Serialize;

use crate::camera::CameraFrameContext;
use crate::detect::{Detection, DetectorBackend};
use crate::dimensions::{self, Dimensions};
use crate::distance::{relative_depth, DistanceEstimator};
use crate::tracker::{ObjectTracker, TrackedObject};
use crate::DEFAULT_MIN_SELECTION_SCORE;

/// Tunables that are not owned by the estimator or tracker.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionSettings {
    /// Detections scoring below this cannot be selected.
    pub min_selection_score: f64,
    /// Return to idle after this many consecutive unmatched frames. `None` never expires.
    pub max_occlusion_frames: Option<u32>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            min_selection_score: DEFAULT_MIN_SELECTION_SCORE,
            max_occlusion_frames: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SessionState {
    Idle,
    Tracking(TrackedObject),
}

/// A measurement for one frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Measurement {
    /// The tracked detection this frame was measured from.
    pub detection: Detection,
    /// Unrounded pinhole distance.
    pub distance_cm: f64,
    pub dimensions: Dimensions,
    /// Distance implied by box growth since the baseline was captured.
    pub relative_distance_cm: Option<f64>,
}

/// What a frame produced.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FrameOutcome {
    /// Nothing is selected.
    Idle,
    /// Tracking, but no distance this frame (unknown class, bad geometry, out of range).
    Pending { tracked: Detection },
    Measured(Measurement),
}

impl FrameOutcome {
    pub fn measurement(&self) -> Option<&Measurement> {
        match self {
            FrameOutcome::Measured(m) => Some(m),
            _ => None,
        }
    }

    pub fn dimensions(&self) -> Option<Dimensions> {
        self.measurement().map(|m| m.dimensions)
    }
}

pub struct MeasurementSession {
    detector: Box<dyn DetectorBackend>,
    estimator: DistanceEstimator,
    tracker: ObjectTracker,
    settings: SessionSettings,
    state: SessionState,
}

impl MeasurementSession {
    pub fn new(
        detector: Box<dyn DetectorBackend>,
        estimator: DistanceEstimator,
        tracker: ObjectTracker,
        settings: SessionSettings,
    ) -> Self {
        Self {
            detector,
            estimator,
            tracker,
            settings,
            state: SessionState::Idle,
        }
    }

    /// Session with default estimator, tracker and settings.
    pub fn with_detector(detector: Box<dyn DetectorBackend>) -> Self {
        Self::new(
            detector,
            DistanceEstimator::default(),
            ObjectTracker::default(),
            SessionSettings::default(),
        )
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_tracking(&self) -> bool {
        matches!(self.state, SessionState::Tracking(_))
    }

    pub fn tracked(&self) -> Option<&TrackedObject> {
        match &self.state {
            SessionState::Tracking(tracked) => Some(tracked),
            SessionState::Idle => None,
        }
    }

    pub fn detector_name(&self) -> &'static str {
        self.detector.name()
    }

    pub fn estimator(&self) -> &DistanceEstimator {
        &self.estimator
    }

    /// Calibrate the session's lens. Returns the stored focal length.
    pub fn calibrate(
        &mut self,
        known_width_cm: f64,
        known_distance_cm: f64,
        observed_pixel_width: f64,
    ) -> Result<f64> {
        self.estimator
            .focal_mut()
            .calibrate(known_width_cm, known_distance_cm, observed_pixel_width)
    }

    pub fn warm_up(&mut self) -> Result<()> {
        self.detector.warm_up()
    }

    /// Start tracking `detection`, replacing any current selection.
    ///
    /// Refused (returns false, state unchanged) if the score is below the selection
    /// threshold. A new selection never inherits the previous baseline.
    pub fn select(&mut self, detection: Detection) -> bool {
        if !(detection.score >= self.settings.min_selection_score) {
            log::warn!(
                "refusing to select {:?}: score {:.2} below {:.2}",
                detection.class_label,
                detection.score,
                self.settings.min_selection_score
            );
            return false;
        }
        log::info!(
            "tracking {:?} at ({:.0}, {:.0})",
            detection.class_label,
            detection.bbox.x,
            detection.bbox.y
        );
        self.state = SessionState::Tracking(TrackedObject::new(detection));
        true
    }

    /// Select the first detection whose box contains `(x, y)`.
    pub fn select_at(&mut self, x: f64, y: f64, detections: &[Detection]) -> Option<&Detection> {
        let hit = detections.iter().find(|d| d.bbox.contains(x, y))?;
        if !self.select(hit.clone()) {
            return None;
        }
        self.tracked().map(TrackedObject::detection)
    }

    /// Drop the selection and its baseline.
    pub fn reset(&mut self) {
        if self.is_tracking() {
            log::info!("measurement session reset");
        }
        self.state = SessionState::Idle;
    }

    /// Run the injected detector on `pixels`, then [`Self::frame`].
    pub fn process_frame(
        &mut self,
        pixels: &[u8],
        ctx: &CameraFrameContext,
    ) -> Result<FrameOutcome> {
        let detections = self
            .detector
            .detect(pixels, ctx.image_width_px, ctx.image_height_px)?;
        log::trace!("{} detections from {}", detections.len(), self.detector.name());
        Ok(self.frame(&detections, ctx))
    }

    /// Advance tracking with this frame's detections and measure the tracked object.
    pub fn frame(&mut self, detections: &[Detection], ctx: &CameraFrameContext) -> FrameOutcome {
        let previous = match std::mem::replace(&mut self.state, SessionState::Idle) {
            SessionState::Idle => return FrameOutcome::Idle,
            SessionState::Tracking(tracked) => tracked,
        };

        let mut tracked = self.tracker.track(previous, detections);

        if let Some(limit) = self.settings.max_occlusion_frames {
            if tracked.missed_frames() > limit {
                log::info!(
                    "lost {:?} after {} unmatched frames",
                    tracked.class_label(),
                    tracked.missed_frames()
                );
                return FrameOutcome::Idle;
            }
        }

        let outcome = self.measure(&mut tracked, ctx);
        self.state = SessionState::Tracking(tracked);
        outcome
    }

    fn measure(&self, tracked: &mut TrackedObject, ctx: &CameraFrameContext) -> FrameOutcome {
        let detection = tracked.detection().clone();
        let image_width = f64::from(ctx.image_width_px);
        let image_height = f64::from(ctx.image_height_px);
        let fov_degrees = ctx.fov_degrees_or(self.estimator.fov_degrees());

        let Some(distance_cm) = self.estimator.estimate_with_fov(
            &detection.class_label,
            detection.bbox.width,
            image_width,
            fov_degrees,
        ) else {
            return FrameOutcome::Pending { tracked: detection };
        };

        if tracked.capture_baseline(detection.bbox.width, distance_cm) {
            log::debug!(
                "baseline for {:?}: {}px at {:.1}cm",
                detection.class_label,
                detection.bbox.width,
                distance_cm
            );
        }

        let relative_distance_cm = tracked.baseline().and_then(|b| {
            relative_depth(b.initial_distance_cm, b.initial_width_px, detection.bbox.width)
        });

        let dimensions = dimensions::compute(
            detection.bbox.width,
            detection.bbox.height,
            distance_cm,
            image_width,
            image_height,
            fov_degrees,
        );

        FrameOutcome::Measured(Measurement {
            detection,
            distance_cm,
            dimensions,
            relative_distance_cm,
        })
    }
}
