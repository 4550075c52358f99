use crate::crop_to_region;
use autokw_core::*;
use image::RgbaImage;

/// Screen grabber backed by `xcap`, reading the first attached monitor.
#[derive(Debug, Default)]
pub struct ScreenGrabber;

impl ScreenGrabber {
    pub fn new() -> Self {
        Self
    }
}

impl ScreenCapture for ScreenGrabber {
    fn grab(&mut self, region: Option<Region>) -> Result<RgbaImage, CaptureError> {
        let monitors = xcap::Monitor::all().map_err(|e| CaptureError::Grab(e.to_string()))?;
        let monitor = monitors
            .into_iter()
            .next()
            .ok_or_else(|| CaptureError::NoDisplay("no monitors attached".to_string()))?;

        let frame = monitor
            .capture_image()
            .map_err(|e| CaptureError::Grab(e.to_string()))?;
        // Rebuild through raw bytes so xcap's own `image` version does not leak
        // into our types.
        let (width, height) = (frame.width(), frame.height());
        let screen = RgbaImage::from_raw(width, height, frame.into_raw())
            .ok_or_else(|| CaptureError::Grab("frame buffer size mismatch".to_string()))?;

        Ok(match region {
            Some(region) => crop_to_region(&screen, region),
            None => screen,
        })
    }
}
