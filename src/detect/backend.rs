use anyhow::Result;

use crate::detect::result::Detection;

/// Object detector capability consumed by a measurement session.
///
/// The neural network itself lives outside this crate. Implementations wrap it and
/// report detections in pixel coordinates of the frame they were given; mixing
/// coordinate spaces is a caller error the kernel cannot detect.
pub trait DetectorBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on a frame.
    ///
    /// The returned order is the detector's own ranking and is used as the tracker's
    /// tie-break, so implementations should keep it stable for identical input.
    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<Vec<Detection>>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
