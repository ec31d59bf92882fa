//! Pinhole distance estimation from a detection's pixel width.

use crate::camera::FocalLengthEstimator;
use crate::{catalog, DEFAULT_FOV_DEGREES, MAX_DISTANCE_CM, MIN_DISTANCE_CM};

/// Converts a class label and pixel width into a distance in centimeters.
///
/// Returns full precision; rounding happens only when dimensions are reported.
#[derive(Clone, Debug)]
pub struct DistanceEstimator {
    focal: FocalLengthEstimator,
    fov_degrees: f64,
    min_cm: f64,
    max_cm: f64,
}

impl Default for DistanceEstimator {
    fn default() -> Self {
        Self::new(FocalLengthEstimator::new())
    }
}

impl DistanceEstimator {
    pub fn new(focal: FocalLengthEstimator) -> Self {
        Self {
            focal,
            fov_degrees: DEFAULT_FOV_DEGREES,
            min_cm: MIN_DISTANCE_CM,
            max_cm: MAX_DISTANCE_CM,
        }
    }

    /// FOV assumed when the focal length is not calibrated.
    pub fn with_fov(mut self, fov_degrees: f64) -> Self {
        self.fov_degrees = fov_degrees;
        self
    }

    /// Plausibility window; estimates outside `[min_cm, max_cm]` are discarded.
    pub fn with_range(mut self, min_cm: f64, max_cm: f64) -> Self {
        self.min_cm = min_cm;
        self.max_cm = max_cm;
        self
    }

    pub fn fov_degrees(&self) -> f64 {
        self.fov_degrees
    }

    pub fn range(&self) -> (f64, f64) {
        (self.min_cm, self.max_cm)
    }

    pub fn focal(&self) -> &FocalLengthEstimator {
        &self.focal
    }

    pub fn focal_mut(&mut self) -> &mut FocalLengthEstimator {
        &mut self.focal
    }

    /// Estimate distance with the estimator's configured FOV.
    pub fn estimate(
        &self,
        class_label: &str,
        pixel_width_px: f64,
        image_width_px: f64,
    ) -> Option<f64> {
        self.estimate_with_fov(class_label, pixel_width_px, image_width_px, self.fov_degrees)
    }

    /// Estimate distance assuming `fov_degrees` for this frame.
    ///
    /// `None` when the class is not catalogued, either width is not positive, or the
    /// result falls outside the plausibility window.
    pub fn estimate_with_fov(
        &self,
        class_label: &str,
        pixel_width_px: f64,
        image_width_px: f64,
        fov_degrees: f64,
    ) -> Option<f64> {
        let Some(real_width_cm) = catalog::lookup(class_label) else {
            log::debug!("no known width for class {:?}", class_label);
            return None;
        };

        // NaN fails both comparisons and is rejected here too
        if !(pixel_width_px > 0.0 && image_width_px > 0.0) {
            log::debug!(
                "invalid geometry: pixel width {} image width {}",
                pixel_width_px,
                image_width_px
            );
            return None;
        }

        let focal_length_px = self
            .focal
            .effective_focal_length_px(image_width_px, fov_degrees);
        let distance_cm = real_width_cm * focal_length_px / pixel_width_px;

        if !distance_cm.is_finite() || distance_cm < self.min_cm || distance_cm > self.max_cm {
            log::debug!(
                "distance {:.1}cm for {:?} outside [{}, {}]",
                distance_cm,
                class_label,
                self.min_cm,
                self.max_cm
            );
            return None;
        }

        log::trace!(
            "{:?}: {}cm wide, focal {:.1}px, {}px -> {:.1}cm",
            class_label,
            real_width_cm,
            focal_length_px,
            pixel_width_px,
            distance_cm
        );
        Some(distance_cm)
    }
}

/// Distance implied by bounding-box growth relative to a baseline.
///
/// A current width larger than the baseline width means the object came closer.
/// `None` if the current width is not positive.
pub fn relative_depth(
    initial_distance_cm: f64,
    initial_width_px: f64,
    current_width_px: f64,
) -> Option<f64> {
    if !(current_width_px > 0.0) {
        return None;
    }
    Some(initial_distance_cm * (initial_width_px / current_width_px))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_phone_scenario() {
        let estimator = DistanceEstimator::default();
        let distance = estimator.estimate("cell phone", 100.0, 1280.0).unwrap();
        assert!((distance - 77.6).abs() < 0.05, "got {}", distance);
        assert_eq!(distance.round(), 78.0);
    }

    #[test]
    fn distance_keeps_full_precision() {
        let estimator = DistanceEstimator::default();
        let distance = estimator.estimate("cell phone", 100.0, 1280.0).unwrap();
        assert_ne!(distance, distance.round());
    }

    #[test]
    fn unknown_class_and_bad_geometry_are_none() {
        let estimator = DistanceEstimator::default();
        assert!(estimator.estimate("spaceship", 100.0, 1280.0).is_none());
        assert!(estimator.estimate("cup", 0.0, 1280.0).is_none());
        assert!(estimator.estimate("cup", -5.0, 1280.0).is_none());
        assert!(estimator.estimate("cup", 100.0, 0.0).is_none());
        assert!(estimator.estimate("cup", f64::NAN, 1280.0).is_none());
    }

    #[test]
    fn out_of_range_distances_are_rejected() {
        let mut focal = FocalLengthEstimator::new();
        focal.calibrate(10.0, 100.0, 100.0).unwrap(); // 1000px
        let estimator = DistanceEstimator::new(focal);

        // car: 180 * 1000 / 120 == 1500cm
        assert!(estimator.estimate("car", 120.0, 1280.0).is_none());
        // cup: 8 * 1000 / 1000 == 8cm
        assert!(estimator.estimate("cup", 1000.0, 1280.0).is_none());
        // boundaries are inclusive: 8 * 1000 / 800 == 10cm, 180 * 1000 / 180 == 1000cm
        assert_eq!(estimator.estimate("cup", 800.0, 1280.0), Some(10.0));
        assert_eq!(estimator.estimate("car", 180.0, 1280.0), Some(1000.0));
    }

    #[test]
    fn calibrated_round_trip() {
        let mut focal = FocalLengthEstimator::new();
        focal.calibrate(8.0, 50.0, 200.0).unwrap();
        let estimator = DistanceEstimator::new(focal);
        let distance = estimator.estimate("cup", 200.0, 1280.0).unwrap();
        assert!((distance - 50.0).abs() < 1e-9);
    }

    #[test]
    fn fov_override_changes_focal_length() {
        let estimator = DistanceEstimator::default();
        let narrow = estimator.estimate_with_fov("cup", 100.0, 1000.0, 40.0).unwrap();
        let wide = estimator.estimate_with_fov("cup", 100.0, 1000.0, 90.0).unwrap();
        assert!(narrow > wide);
        assert!((wide - 40.0).abs() < 1e-9);
    }

    #[test]
    fn relative_depth_scales_inversely_with_width() {
        assert_eq!(relative_depth(100.0, 50.0, 100.0), Some(50.0));
        assert_eq!(relative_depth(100.0, 50.0, 25.0), Some(200.0));
        assert_eq!(relative_depth(100.0, 50.0, 50.0), Some(100.0));
        assert!(relative_depth(100.0, 50.0, 0.0).is_none());
    }
}
