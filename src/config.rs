use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;

use crate::camera::{CalibrationSample, FocalLengthEstimator};
use crate::distance::DistanceEstimator;
use crate::session::SessionSettings;
use crate::tracker::ObjectTracker;
use crate::{
    DEFAULT_FOV_DEGREES, DEFAULT_MATCH_RADIUS_PX, DEFAULT_MIN_SELECTION_SCORE, MAX_DISTANCE_CM,
    MIN_DISTANCE_CM,
};

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct MeasureConfigFile {
    fov_degrees: Option<f64>,
    focal_length_px: Option<f64>,
    calibration: Option<CalibrationSample>,
    distance: Option<DistanceConfigFile>,
    tracker: Option<TrackerConfigFile>,
    selection: Option<SelectionConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct DistanceConfigFile {
    min_cm: Option<f64>,
    max_cm: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct TrackerConfigFile {
    match_radius_px: Option<f64>,
    max_occlusion_frames: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct SelectionConfigFile {
    min_score: Option<f64>,
}

/// Runtime configuration for a measurement session.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasureConfig {
    pub fov_degrees: f64,
    /// Pinned focal length. Takes precedence over the FOV model when set.
    pub focal_length_px: Option<f64>,
    pub min_distance_cm: f64,
    pub max_distance_cm: f64,
    pub match_radius_px: f64,
    pub max_occlusion_frames: Option<u32>,
    pub min_selection_score: f64,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            fov_degrees: DEFAULT_FOV_DEGREES,
            focal_length_px: None,
            min_distance_cm: MIN_DISTANCE_CM,
            max_distance_cm: MAX_DISTANCE_CM,
            match_radius_px: DEFAULT_MATCH_RADIUS_PX,
            max_occlusion_frames: None,
            min_selection_score: DEFAULT_MIN_SELECTION_SCORE,
        }
    }
}

impl MeasureConfig {
    /// Load from `MEASURE_CONFIG` (if set), apply `MEASURE_*` overrides, validate.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("MEASURE_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load a single file without environment overrides.
    pub fn from_path(path: &Path) -> Result<Self> {
        let mut cfg = Self::from_file(read_config_file(path)?)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: MeasureConfigFile) -> Result<Self> {
        let defaults = Self::default();
        let focal_length_px = match (file.focal_length_px, file.calibration) {
            (Some(_), Some(_)) => {
                return Err(anyhow!(
                    "set either focal_length_px or calibration, not both"
                ))
            }
            (Some(focal), None) => Some(focal),
            (None, Some(sample)) => Some(sample.focal_length_px()?),
            (None, None) => None,
        };
        let distance = file.distance.unwrap_or_default();
        let tracker = file.tracker.unwrap_or_default();
        Ok(Self {
            fov_degrees: file.fov_degrees.unwrap_or(defaults.fov_degrees),
            focal_length_px,
            min_distance_cm: distance.min_cm.unwrap_or(defaults.min_distance_cm),
            max_distance_cm: distance.max_cm.unwrap_or(defaults.max_distance_cm),
            match_radius_px: tracker
                .match_radius_px
                .unwrap_or(defaults.match_radius_px),
            max_occlusion_frames: tracker.max_occlusion_frames,
            min_selection_score: file
                .selection
                .and_then(|selection| selection.min_score)
                .unwrap_or(defaults.min_selection_score),
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(fov) = env_f64("MEASURE_FOV_DEGREES")? {
            self.fov_degrees = fov;
        }
        if let Some(focal) = env_f64("MEASURE_FOCAL_LENGTH_PX")? {
            self.focal_length_px = Some(focal);
        }
        if let Ok(frames) = std::env::var("MEASURE_MAX_OCCLUSION_FRAMES") {
            let frames = frames.trim();
            if !frames.is_empty() {
                let parsed: u32 = frames.parse().map_err(|_| {
                    anyhow!("MEASURE_MAX_OCCLUSION_FRAMES must be a non-negative integer")
                })?;
                self.max_occlusion_frames = Some(parsed);
            }
        }
        if let Some(score) = env_f64("MEASURE_MIN_SELECTION_SCORE")? {
            self.min_selection_score = score;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if !(self.fov_degrees > 0.0 && self.fov_degrees < 180.0) {
            return Err(anyhow!(
                "fov_degrees must be in (0, 180), got {}",
                self.fov_degrees
            ));
        }
        if let Some(focal) = self.focal_length_px {
            if !focal.is_finite() || focal <= 0.0 {
                return Err(anyhow!("focal_length_px must be positive, got {}", focal));
            }
        }
        if !(self.min_distance_cm > 0.0 && self.min_distance_cm < self.max_distance_cm) {
            return Err(anyhow!(
                "distance range must satisfy 0 < min < max, got [{}, {}]",
                self.min_distance_cm,
                self.max_distance_cm
            ));
        }
        if !(self.match_radius_px >= 0.0) {
            return Err(anyhow!(
                "match_radius_px must be non-negative, got {}",
                self.match_radius_px
            ));
        }
        if !(0.0..=1.0).contains(&self.min_selection_score) {
            return Err(anyhow!(
                "min_selection_score must be in [0, 1], got {}",
                self.min_selection_score
            ));
        }
        Ok(())
    }

    pub fn focal_estimator(&self) -> Result<FocalLengthEstimator> {
        match self.focal_length_px {
            Some(focal) => FocalLengthEstimator::with_focal_length(focal),
            None => Ok(FocalLengthEstimator::new()),
        }
    }

    pub fn distance_estimator(&self) -> Result<DistanceEstimator> {
        Ok(DistanceEstimator::new(self.focal_estimator()?)
            .with_fov(self.fov_degrees)
            .with_range(self.min_distance_cm, self.max_distance_cm))
    }

    pub fn tracker(&self) -> ObjectTracker {
        ObjectTracker::new(self.match_radius_px)
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            min_selection_score: self.min_selection_score,
            max_occlusion_frames: self.max_occlusion_frames,
        }
    }
}

fn read_config_file(path: &Path) -> Result<MeasureConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let cfg = if is_toml {
        toml::from_str(&raw).map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    } else {
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?
    };
    Ok(cfg)
}

fn env_f64(key: &str) -> Result<Option<f64>> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| anyhow!("{} must be a number", key)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() -> Result<()> {
        let cfg = MeasureConfig::default();
        cfg.validate()?;
        assert_eq!(cfg.fov_degrees, 60.0);
        assert_eq!(cfg.min_selection_score, 0.6);
        assert!(cfg.max_occlusion_frames.is_none());
        Ok(())
    }

    #[test]
    fn calibration_sample_becomes_focal_length() -> Result<()> {
        let file = MeasureConfigFile {
            calibration: Some(CalibrationSample {
                known_width_cm: 10.0,
                known_distance_cm: 50.0,
                observed_pixel_width: 200.0,
            }),
            ..Default::default()
        };
        let cfg = MeasureConfig::from_file(file)?;
        assert_eq!(cfg.focal_length_px, Some(1000.0));
        assert_eq!(cfg.focal_estimator()?.calibration(), Some(1000.0));
        Ok(())
    }

    #[test]
    fn focal_and_calibration_conflict() {
        let file = MeasureConfigFile {
            focal_length_px: Some(900.0),
            calibration: Some(CalibrationSample {
                known_width_cm: 10.0,
                known_distance_cm: 50.0,
                observed_pixel_width: 200.0,
            }),
            ..Default::default()
        };
        assert!(MeasureConfig::from_file(file).is_err());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let bad = [
            MeasureConfig {
                fov_degrees: 0.0,
                ..Default::default()
            },
            MeasureConfig {
                fov_degrees: 180.0,
                ..Default::default()
            },
            MeasureConfig {
                min_distance_cm: 500.0,
                max_distance_cm: 100.0,
                ..Default::default()
            },
            MeasureConfig {
                min_selection_score: 1.5,
                ..Default::default()
            },
            MeasureConfig {
                focal_length_px: Some(-1.0),
                ..Default::default()
            },
            MeasureConfig {
                match_radius_px: f64::NAN,
                ..Default::default()
            },
        ];
        for cfg in bad {
            assert!(cfg.validate().is_err(), "{:?}", cfg);
        }
    }
}
