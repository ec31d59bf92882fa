//! Camera model: per-frame geometry and the effective focal length.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Geometry of the frame a detection list belongs to. Read-only to the kernel.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraFrameContext {
    pub image_width_px: u32,
    pub image_height_px: u32,
    /// Per-frame FOV. `None` defers to the distance estimator's configured FOV.
    #[serde(default)]
    pub horizontal_fov_degrees: Option<f64>,
}

impl CameraFrameContext {
    pub fn new(image_width_px: u32, image_height_px: u32) -> Self {
        Self {
            image_width_px,
            image_height_px,
            horizontal_fov_degrees: None,
        }
    }

    pub fn with_fov(mut self, horizontal_fov_degrees: f64) -> Self {
        self.horizontal_fov_degrees = Some(horizontal_fov_degrees);
        self
    }

    /// The frame's FOV, or `default_fov_degrees` when the source did not report one.
    pub fn fov_degrees_or(&self, default_fov_degrees: f64) -> f64 {
        self.horizontal_fov_degrees.unwrap_or(default_fov_degrees)
    }
}

/// A reference measurement used to pin the focal length.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSample {
    pub known_width_cm: f64,
    pub known_distance_cm: f64,
    pub observed_pixel_width: f64,
}

impl CalibrationSample {
    /// `observed_pixel_width * known_distance_cm / known_width_cm`.
    pub fn focal_length_px(&self) -> Result<f64> {
        for (name, value) in [
            ("known_width_cm", self.known_width_cm),
            ("known_distance_cm", self.known_distance_cm),
            ("observed_pixel_width", self.observed_pixel_width),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(anyhow!("{} must be a positive number, got {}", name, value));
            }
        }
        Ok(self.observed_pixel_width * self.known_distance_cm / self.known_width_cm)
    }
}

/// Holds the lens assumption used to turn pixel widths into distances.
///
/// Calibration lives on the estimator instance rather than in process-wide state.
/// Once set it is used for every subsequent call, regardless of image width or FOV,
/// until `calibrate` is called again or it is cleared. Sessions that share a lens can
/// clone one estimator; sessions on different cameras keep their own.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FocalLengthEstimator {
    calibrated_px: Option<f64>,
}

impl FocalLengthEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Estimator that starts out calibrated to `focal_length_px`.
    pub fn with_focal_length(focal_length_px: f64) -> Result<Self> {
        if !focal_length_px.is_finite() || focal_length_px <= 0.0 {
            return Err(anyhow!(
                "focal length must be a positive number, got {}",
                focal_length_px
            ));
        }
        Ok(Self {
            calibrated_px: Some(focal_length_px),
        })
    }

    /// Pin the focal length from a reference object of known size and distance.
    ///
    /// Returns the stored focal length in pixels.
    pub fn calibrate(
        &mut self,
        known_width_cm: f64,
        known_distance_cm: f64,
        observed_pixel_width: f64,
    ) -> Result<f64> {
        self.calibrate_with(&CalibrationSample {
            known_width_cm,
            known_distance_cm,
            observed_pixel_width,
        })
    }

    pub fn calibrate_with(&mut self, sample: &CalibrationSample) -> Result<f64> {
        let focal = sample.focal_length_px()?;
        log::info!(
            "focal length calibrated to {:.2}px ({}cm wide at {}cm spans {}px)",
            focal,
            sample.known_width_cm,
            sample.known_distance_cm,
            sample.observed_pixel_width
        );
        self.calibrated_px = Some(focal);
        Ok(focal)
    }

    /// Drop the calibration and fall back to the FOV model.
    pub fn clear_calibration(&mut self) {
        self.calibrated_px = None;
    }

    pub fn calibration(&self) -> Option<f64> {
        self.calibrated_px
    }

    /// Calibrated focal length if present, otherwise `(w / 2) / tan(fov / 2)`.
    pub fn effective_focal_length_px(
        &self,
        image_width_px: f64,
        assumed_fov_degrees: f64,
    ) -> f64 {
        match self.calibrated_px {
            Some(focal) => focal,
            None => focal_length_from_fov(image_width_px, assumed_fov_degrees),
        }
    }
}

/// Pinhole focal length in pixels for a horizontal field of view.
pub fn focal_length_from_fov(image_width_px: f64, fov_degrees: f64) -> f64 {
    (image_width_px / 2.0) / (fov_degrees.to_radians() / 2.0).tan()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_FOV_DEGREES;

    #[test]
    fn fov_model_matches_pinhole() {
        let estimator = FocalLengthEstimator::new();
        let focal = estimator.effective_focal_length_px(1280.0, 60.0);
        assert!((focal - 640.0 / 30f64.to_radians().tan()).abs() < 1e-9);
        assert!((focal - 1108.5).abs() < 0.1);

        // 90 degrees: tan(45) == 1, so focal == half width
        let focal_90 = estimator.effective_focal_length_px(1000.0, 90.0);
        assert!((focal_90 - 500.0).abs() < 1e-9);
    }

    #[test]
    fn calibration_overrides_fov_until_cleared() -> Result<()> {
        let mut estimator = FocalLengthEstimator::new();
        let focal = estimator.calibrate(10.0, 50.0, 200.0)?;
        assert_eq!(focal, 1000.0);
        assert_eq!(estimator.effective_focal_length_px(1280.0, 60.0), 1000.0);
        assert_eq!(estimator.effective_focal_length_px(320.0, 90.0), 1000.0);

        estimator.calibrate(8.0, 40.0, 100.0)?;
        assert_eq!(estimator.calibration(), Some(500.0));

        estimator.clear_calibration();
        assert!(estimator.calibration().is_none());
        assert!((estimator.effective_focal_length_px(1000.0, 90.0) - 500.0).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn calibration_rejects_degenerate_samples() {
        let mut estimator = FocalLengthEstimator::new();
        assert!(estimator.calibrate(0.0, 50.0, 200.0).is_err());
        assert!(estimator.calibrate(10.0, -1.0, 200.0).is_err());
        assert!(estimator.calibrate(10.0, 50.0, f64::NAN).is_err());
        assert!(estimator.calibration().is_none());
        assert!(FocalLengthEstimator::with_focal_length(0.0).is_err());
    }

    #[test]
    fn context_fov_falls_back_when_unreported() -> Result<()> {
        let ctx = CameraFrameContext::new(1280, 720);
        assert_eq!(ctx.horizontal_fov_degrees, None);
        assert_eq!(ctx.fov_degrees_or(DEFAULT_FOV_DEGREES), 60.0);
        assert_eq!(ctx.with_fov(75.0).fov_degrees_or(DEFAULT_FOV_DEGREES), 75.0);

        let parsed: CameraFrameContext =
            serde_json::from_str(r#"{"image_width_px": 640, "image_height_px": 480}"#)?;
        assert_eq!(parsed, CameraFrameContext::new(640, 480));
        Ok(())
    }
}
