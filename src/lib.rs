//! Dimension Kernel
//!
//! Turns a stream of per-frame object detections into real-world size estimates for
//! one user-selected object.
//!
//! # Pipeline
//!
//! 1. **Tracking**: the selected object is re-identified in each frame by class label
//!    and top-left proximity. Missing matches keep the last known box.
//! 2. **Distance**: a pinhole model relates the catalogued real width of the class to
//!    its pixel width, using a focal length derived from the field of view or pinned
//!    by calibration.
//! 3. **Dimensions**: width and height follow from similar triangles, depth is
//!    approximated, and a confidence score is attached.
//!
//! Anything that cannot be computed is reported as absent, never as an error.
//! Errors (`anyhow::Result`) only come from configuration, calibration input and
//! detector backends.
//!
//! # Module Structure
//!
//! - `catalog`: known real-world widths per class
//! - `camera`: frame geometry and focal length
//! - `distance`: distance estimation and relative depth
//! - `dimensions`: real-world size and confidence
//! - `tracker`: single-object re-identification
//! - `session`: per-frame orchestration over an injected detector
//! - `detect`: detection types and the detector capability
//! - `config`: file and environment configuration

pub mod camera;
pub mod catalog;
pub mod config;
pub mod detect;
pub mod dimensions;
pub mod distance;
pub mod session;
pub mod tracker;

pub use camera::{CalibrationSample, CameraFrameContext, FocalLengthEstimator};
pub use config::MeasureConfig;
pub use detect::{BBox, Detection, DetectorBackend, ScriptedBackend};
pub use dimensions::Dimensions;
pub use distance::{relative_depth, DistanceEstimator};
pub use session::{FrameOutcome, Measurement, MeasurementSession, SessionSettings, SessionState};
pub use tracker::{Baseline, ObjectTracker, TrackedObject};

// -------------------- Calibration Constants --------------------
//
// Empirical values with no derivation behind them. They are kept fixed so results
// are reproducible and are expected to be retuned against real captures.

/// Horizontal field of view assumed for an uncalibrated webcam.
pub const DEFAULT_FOV_DEGREES: f64 = 60.0;

/// Closer than a hand's reach: the catalog widths stop being meaningful.
pub const MIN_DISTANCE_CM: f64 = 10.0;

/// Farther than the single-width model is trusted.
pub const MAX_DISTANCE_CM: f64 = 1000.0;

/// Distance at which the confidence distance factor peaks.
pub const CONFIDENCE_SWEET_SPOT_CM: f64 = 100.0;

/// Distance from the sweet spot at which the distance factor reaches zero.
pub const CONFIDENCE_DISTANCE_FALLOFF_CM: f64 = 200.0;

/// Box area (px^2) at and above which the size factor is 1.
pub const MIN_RELIABLE_BOX_AREA_PX: f64 = 100.0 * 100.0;

/// Depth as a fraction of the mean of width and height.
pub const DEPTH_RATIO: f64 = 0.7;

/// Tracker tolerance on each axis of the top-left corner.
pub const DEFAULT_MATCH_RADIUS_PX: f64 = 50.0;

/// Detector score required to select an object.
pub const DEFAULT_MIN_SELECTION_SCORE: f64 = 0.6;
