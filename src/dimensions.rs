//! Real-world size from a bounding box and a distance.
//!
//! Uses similar triangles: at distance `d` a camera with horizontal field of view
//! `fov` sees a slab `2 * d * tan(fov / 2)` wide, and a box covering a fraction of the
//! image covers the same fraction of that slab. Depth is unobservable from one view
//! and is approximated from the other two dimensions.

use serde::{Deserialize, Serialize};

use crate::{
    CONFIDENCE_DISTANCE_FALLOFF_CM, CONFIDENCE_SWEET_SPOT_CM, DEPTH_RATIO, MIN_RELIABLE_BOX_AREA_PX,
};

/// Rounded real-world size estimate for one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width_cm: i64,
    pub height_cm: i64,
    pub depth_cm: i64,
    /// 0..=100
    pub confidence_pct: u8,
}

/// Unrounded intermediate values, for callers that chain further math.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RawDimensions {
    pub width_cm: f64,
    pub height_cm: f64,
    pub depth_cm: f64,
    /// 0.0..=1.0
    pub confidence: f64,
}

impl RawDimensions {
    pub fn rounded(&self) -> Dimensions {
        Dimensions {
            width_cm: self.width_cm.round() as i64,
            height_cm: self.height_cm.round() as i64,
            depth_cm: self.depth_cm.round() as i64,
            confidence_pct: (self.confidence * 100.0).round().clamp(0.0, 100.0) as u8,
        }
    }
}

/// Compute rounded dimensions. See [`compute_raw`].
pub fn compute(
    bbox_width_px: f64,
    bbox_height_px: f64,
    distance_cm: f64,
    image_width_px: f64,
    image_height_px: f64,
    fov_degrees: f64,
) -> Dimensions {
    compute_raw(
        bbox_width_px,
        bbox_height_px,
        distance_cm,
        image_width_px,
        image_height_px,
        fov_degrees,
    )
    .rounded()
}

pub fn compute_raw(
    bbox_width_px: f64,
    bbox_height_px: f64,
    distance_cm: f64,
    image_width_px: f64,
    image_height_px: f64,
    fov_degrees: f64,
) -> RawDimensions {
    let fov_radians = fov_degrees.to_radians();
    let view_width_cm = 2.0 * distance_cm * (fov_radians / 2.0).tan();
    let view_height_cm = view_width_cm * (image_height_px / image_width_px);

    let width_cm = (bbox_width_px / image_width_px) * view_width_cm;
    let height_cm = (bbox_height_px / image_height_px) * view_height_cm;
    let depth_cm = (width_cm + height_cm) / 2.0 * DEPTH_RATIO;

    RawDimensions {
        width_cm,
        height_cm,
        depth_cm,
        confidence: confidence(bbox_width_px, bbox_height_px, distance_cm),
    }
}

/// Product of the distance, size and aspect factors, in `[0, 1]`.
pub fn confidence(bbox_width_px: f64, bbox_height_px: f64, distance_cm: f64) -> f64 {
    let product = distance_factor(distance_cm)
        * size_factor(bbox_width_px, bbox_height_px)
        * aspect_factor(bbox_width_px, bbox_height_px);
    if product.is_nan() {
        0.0
    } else {
        product.clamp(0.0, 1.0)
    }
}

/// Peaks at the sweet-spot distance and falls off linearly to zero.
pub fn distance_factor(distance_cm: f64) -> f64 {
    unit(1.0 - (distance_cm - CONFIDENCE_SWEET_SPOT_CM).abs() / CONFIDENCE_DISTANCE_FALLOFF_CM)
}

/// Penalizes boxes smaller than 100x100 px.
pub fn size_factor(bbox_width_px: f64, bbox_height_px: f64) -> f64 {
    unit(bbox_width_px * bbox_height_px / MIN_RELIABLE_BOX_AREA_PX)
}

/// Penalizes elongated boxes; 1.0 for squares.
pub fn aspect_factor(bbox_width_px: f64, bbox_height_px: f64) -> f64 {
    let aspect_ratio = bbox_width_px / bbox_height_px;
    unit(1.0 - (aspect_ratio - 1.0).abs() / 2.0)
}

fn unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_box_at_sweet_spot_is_fully_confident() {
        let dims = compute(200.0, 200.0, 100.0, 1280.0, 720.0, 60.0);
        assert_eq!(dims.confidence_pct, 100);
    }

    #[test]
    fn width_follows_similar_triangles() {
        // 90 degree fov: view width == 2 * distance
        let raw = compute_raw(500.0, 500.0, 100.0, 1000.0, 1000.0, 90.0);
        assert!((raw.width_cm - 100.0).abs() < 1e-9);
        assert!((raw.height_cm - 100.0).abs() < 1e-9);
        assert!((raw.depth_cm - 70.0).abs() < 1e-9);

        let dims = raw.rounded();
        assert_eq!(dims.width_cm, 100);
        assert_eq!(dims.height_cm, 100);
        assert_eq!(dims.depth_cm, 70);
    }

    #[test]
    fn height_uses_image_aspect() {
        // 16:9 frame, box spanning half of each axis
        let raw = compute_raw(640.0, 360.0, 100.0, 1280.0, 720.0, 90.0);
        assert!((raw.width_cm - 100.0).abs() < 1e-9);
        assert!((raw.height_cm - 56.25).abs() < 1e-9);
    }

    #[test]
    fn confidence_factors_degrade_as_documented() {
        assert_eq!(distance_factor(100.0), 1.0);
        assert!((distance_factor(200.0) - 0.5).abs() < 1e-12);
        assert!((distance_factor(0.0) - 0.5).abs() < 1e-12);
        assert_eq!(distance_factor(400.0), 0.0);

        assert_eq!(size_factor(100.0, 100.0), 1.0);
        assert!((size_factor(50.0, 50.0) - 0.25).abs() < 1e-12);
        assert_eq!(size_factor(500.0, 500.0), 1.0);

        assert_eq!(aspect_factor(80.0, 80.0), 1.0);
        assert!((aspect_factor(200.0, 100.0) - 0.5).abs() < 1e-12);
        assert_eq!(aspect_factor(400.0, 100.0), 0.0);
    }

    #[test]
    fn confidence_is_bounded_for_degenerate_boxes() {
        for (w, h, d) in [
            (0.0, 0.0, 100.0),
            (10.0, 0.0, 100.0),
            (1e9, 1.0, 5000.0),
            (100.0, 100.0, -50.0),
            (f64::NAN, 10.0, 100.0),
        ] {
            let dims = compute(w, h, d, 1280.0, 720.0, 60.0);
            assert!(dims.confidence_pct <= 100, "{:?}", (w, h, d));
        }
    }

    #[test]
    fn sweet_spot_maximizes_distance_contribution() {
        let at_sweet_spot = compute(150.0, 120.0, 100.0, 1280.0, 720.0, 60.0);
        for distance in [40.0, 90.0, 110.0, 250.0] {
            let other = compute(150.0, 120.0, distance, 1280.0, 720.0, 60.0);
            assert!(other.confidence_pct <= at_sweet_spot.confidence_pct);
        }
    }
}
