use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in pixel coordinates of the frame it was detected in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Point-in-box test with inclusive edges.
    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
    }

    /// Clamp the box into a `image_width` x `image_height` frame.
    ///
    /// The top-left corner is pulled into the frame and the extent is trimmed so the
    /// box never runs past the right or bottom edge. Intended for overlay drawing;
    /// measurement always uses the box as detected.
    pub fn clamp_to(&self, image_width: f64, image_height: f64) -> BBox {
        let x = self.x.clamp(0.0, image_width.max(0.0));
        let y = self.y.clamp(0.0, image_height.max(0.0));
        BBox {
            x,
            y,
            width: self.width.min(image_width - self.x).max(0.0),
            height: self.height.min(image_height - self.y).max(0.0),
        }
    }
}

/// One object reported by a detector for the current frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Detector class label (e.g. "cup", "cell phone").
    #[serde(alias = "class")]
    pub class_label: String,
    /// Detector confidence in [0, 1].
    pub score: f64,
    pub bbox: BBox,
}

impl Detection {
    pub fn new(class_label: impl Into<String>, score: f64, bbox: BBox) -> Self {
        Self {
            class_label: class_label.into(),
            score,
            bbox,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_edge_inclusive() {
        let bbox = BBox::new(10.0, 20.0, 30.0, 40.0);
        assert!(bbox.contains(10.0, 20.0));
        assert!(bbox.contains(40.0, 60.0));
        assert!(bbox.contains(25.0, 35.0));
        assert!(!bbox.contains(9.9, 35.0));
        assert!(!bbox.contains(25.0, 60.1));
    }

    #[test]
    fn clamp_trims_boxes_running_off_frame() {
        let bbox = BBox::new(600.0, 400.0, 100.0, 200.0);
        let clamped = bbox.clamp_to(640.0, 480.0);
        assert_eq!(clamped, BBox::new(600.0, 400.0, 40.0, 80.0));

        let inside = BBox::new(10.0, 10.0, 50.0, 50.0);
        assert_eq!(inside.clamp_to(640.0, 480.0), inside);
    }

    #[test]
    fn clamp_pulls_negative_origin_into_frame() {
        let bbox = BBox::new(-20.0, -5.0, 50.0, 30.0);
        let clamped = bbox.clamp_to(640.0, 480.0);
        assert_eq!(clamped.x, 0.0);
        assert_eq!(clamped.y, 0.0);
        assert_eq!(clamped.width, 50.0);
        assert_eq!(clamped.height, 30.0);
    }

    #[test]
    fn detection_accepts_short_class_key() -> anyhow::Result<()> {
        let det: Detection = serde_json::from_str(
            r#"{"class": "cup", "score": 0.9, "bbox": {"x": 1, "y": 2, "width": 3, "height": 4}}"#,
        )?;
        assert_eq!(det.class_label, "cup");
        assert_eq!(det.bbox, BBox::new(1.0, 2.0, 3.0, 4.0));
        Ok(())
    }
}
