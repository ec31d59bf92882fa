use std::collections::VecDeque;
use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Deserialize;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::Detection;

/// One recorded frame of a detection script.
#[derive(Clone, Debug, Deserialize)]
pub struct ScriptedFrame {
    pub image_width: u32,
    pub image_height: u32,
    /// Horizontal field of view for this frame, when it differs from the session default.
    #[serde(default)]
    pub fov_degrees: Option<f64>,
    #[serde(default)]
    pub detections: Vec<Detection>,
}

/// Deterministic detector that replays a fixed sequence of per-frame results.
///
/// Each `detect` call pops the next recorded frame and ignores the pixels. Once the
/// script is exhausted every call returns an empty list.
#[derive(Default)]
pub struct ScriptedBackend {
    frames: VecDeque<Vec<Detection>>,
    calls: u64,
}

impl ScriptedBackend {
    pub fn new<I>(frames: I) -> Self
    where
        I: IntoIterator<Item = Vec<Detection>>,
    {
        Self {
            frames: frames.into_iter().collect(),
            calls: 0,
        }
    }

    /// Frames still queued.
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }

    /// Number of `detect` calls served so far.
    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl DetectorBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn detect(&mut self, _pixels: &[u8], width: u32, height: u32) -> Result<Vec<Detection>> {
        if width == 0 || height == 0 {
            return Err(anyhow!("frame dimensions must be non-zero"));
        }
        self.calls += 1;
        Ok(self.frames.pop_front().unwrap_or_default())
    }
}

/// Load a detection script: a JSON array of [`ScriptedFrame`].
pub fn load_script(path: &Path) -> Result<Vec<ScriptedFrame>> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read detection script {}: {}", path.display(), e))?;
    let frames: Vec<ScriptedFrame> = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid detection script {}: {}", path.display(), e))?;
    for (index, frame) in frames.iter().enumerate() {
        if frame.image_width == 0 || frame.image_height == 0 {
            return Err(anyhow!(
                "frame {} in {} has zero image dimensions",
                index,
                path.display()
            ));
        }
    }
    Ok(frames)
}
