//! Desktop automation engine.
//!
//! Input simulation (`input` feature, via `enigo`) and screen capture
//! (`screen` feature, via `xcap`) are optional so the workspace builds on
//! machines without a display stack. Without them, [`connect`] and
//! [`screen_capture`] report the capability as unavailable.
//!
//! The engine publishes mouse, keyboard, `Run` and `Sleep` operations only.
//! It has no window management: `WinWait`, `WinWaitActive`, `WinWaitClose`,
//! `WinActive`, `WinActivate` and `WinGetPos*` are absent from its catalog, so
//! the library's wait keywords, `WaitForActiveWindow` and
//! `GetActiveWindowImage` fail against it with an unknown-operation error.

#[cfg(feature = "input")]
mod input;
pub mod process;
#[cfg(feature = "screen")]
mod screen;

#[cfg(feature = "input")]
pub use input::DesktopEngine;
#[cfg(feature = "screen")]
pub use screen::ScreenGrabber;

use autokw_core::*;
use image::RgbaImage;

/// Connect to the desktop input engine.
pub fn connect() -> Result<Box<dyn AutomationEngine>, EngineError> {
    #[cfg(feature = "input")]
    {
        Ok(Box::new(DesktopEngine::connect()?))
    }
    #[cfg(not(feature = "input"))]
    {
        Err(EngineError::ConnectionFailed(
            "desktop engine built without the `input` feature".to_string(),
        ))
    }
}

/// The screen capture capability, if this build has one.
pub fn screen_capture() -> Option<Box<dyn ScreenCapture>> {
    #[cfg(feature = "screen")]
    {
        Some(Box::new(ScreenGrabber::new()))
    }
    #[cfg(not(feature = "screen"))]
    {
        None
    }
}

/// Crop `image` to `region`, clamped to the image bounds.
pub fn crop_to_region(image: &RgbaImage, region: Region) -> RgbaImage {
    let x = u32::try_from(region.x.max(0)).unwrap_or(0).min(image.width());
    let y = u32::try_from(region.y.max(0)).unwrap_or(0).min(image.height());
    let width = region.width.min(image.width() - x);
    let height = region.height.min(image.height() - y);
    image::imageops::crop_imm(image, x, y, width, height).to_image()
}
