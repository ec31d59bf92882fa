//! Known real-world widths of common object classes.
//!
//! One scalar width per class, in centimeters. The table is deliberately coarse: a
//! "car" is 180 cm whether it is a hatchback seen head-on or a sedan seen side-on.
//! That error is inherent to single-view estimation and is carried into the
//! distance estimate.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Labels follow the COCO class names emitted by common detectors.
const KNOWN_WIDTHS_CM: &[(&str, f64)] = &[
    ("person", 45.0),
    ("bicycle", 60.0),
    ("car", 180.0),
    ("motorcycle", 80.0),
    ("airplane", 3000.0),
    ("bus", 250.0),
    ("train", 300.0),
    ("truck", 250.0),
    ("boat", 200.0),
    ("traffic light", 30.0),
    ("fire hydrant", 35.0),
    ("stop sign", 60.0),
    ("parking meter", 30.0),
    ("bench", 120.0),
    ("bird", 15.0),
    ("cat", 30.0),
    ("dog", 40.0),
    ("horse", 160.0),
    ("sheep", 80.0),
    ("cow", 180.0),
    ("elephant", 300.0),
    ("bear", 150.0),
    ("zebra", 150.0),
    ("giraffe", 200.0),
    ("backpack", 35.0),
    ("umbrella", 80.0),
    ("handbag", 25.0),
    ("tie", 8.0),
    ("suitcase", 50.0),
    ("frisbee", 20.0),
    ("skis", 150.0),
    ("snowboard", 140.0),
    ("sports ball", 22.0),
    ("kite", 100.0),
    ("baseball bat", 70.0),
    ("baseball glove", 25.0),
    ("skateboard", 80.0),
    ("surfboard", 180.0),
    ("tennis racket", 70.0),
    ("bottle", 7.0),
    ("wine glass", 8.0),
    ("cup", 8.0),
    ("fork", 15.0),
    ("knife", 20.0),
    ("spoon", 15.0),
    ("bowl", 15.0),
    ("banana", 18.0),
    ("apple", 8.0),
    ("sandwich", 15.0),
    ("orange", 7.0),
    ("broccoli", 12.0),
    ("carrot", 15.0),
    ("hot dog", 15.0),
    ("pizza", 30.0),
    ("donut", 8.0),
    ("cake", 25.0),
    ("chair", 45.0),
    ("couch", 200.0),
    ("potted plant", 30.0),
    ("bed", 200.0),
    ("dining table", 150.0),
    ("toilet", 60.0),
    ("tv", 100.0),
    ("laptop", 35.0),
    ("mouse", 6.0),
    ("remote", 15.0),
    ("keyboard", 36.0),
    ("cell phone", 7.0),
    ("microwave", 50.0),
    ("oven", 60.0),
    ("toaster", 30.0),
    ("sink", 60.0),
    ("refrigerator", 80.0),
    ("book", 15.0),
    ("clock", 25.0),
    ("vase", 20.0),
    ("scissors", 15.0),
    ("teddy bear", 30.0),
    ("hair drier", 20.0),
    ("toothbrush", 15.0),
];

fn table() -> &'static HashMap<&'static str, f64> {
    static TABLE: OnceLock<HashMap<&'static str, f64>> = OnceLock::new();
    TABLE.get_or_init(|| KNOWN_WIDTHS_CM.iter().copied().collect())
}

/// Typical real-world width of `class_label` in centimeters, case-insensitive.
pub fn lookup(class_label: &str) -> Option<f64> {
    table().get(class_label.to_lowercase().as_str()).copied()
}

/// All catalogued class labels, in table order.
pub fn labels() -> impl Iterator<Item = &'static str> {
    KNOWN_WIDTHS_CM.iter().map(|(label, _)| *label)
}
