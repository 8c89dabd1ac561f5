//! Advisory PNG snapshots for visual debugging.
//!
//! Callers treat every failure here as non-fatal.

use std::path::Path;

use image::error::{ParameterError, ParameterErrorKind};
use image::{ColorType, ImageError, ImageFormat};
use tracing::debug;

use crate::error::{CaptureError, Result};

/// Write `pixels` (row stride = `width * channels`) to `path` as PNG.
///
/// Supports 1 (gray), 3 (RGB) and 4 (RGBA) channels.
pub fn write_png(
    path: impl AsRef<Path>,
    width: u32,
    height: u32,
    channels: u8,
    pixels: &[u8],
) -> Result<()> {
    let path = path.as_ref();
    let snapshot_err = |source| CaptureError::Snapshot {
        path: path.to_path_buf(),
        source,
    };

    let color = match channels {
        1 => ColorType::L8,
        3 => ColorType::Rgb8,
        4 => ColorType::Rgba8,
        other => {
            return Err(snapshot_err(parameter_error(format!(
                "unsupported channel count {other}"
            ))))
        }
    };

    let expected = width as usize * height as usize * channels as usize;
    if pixels.len() != expected {
        return Err(snapshot_err(parameter_error(format!(
            "buffer is {} bytes, expected {expected}",
            pixels.len()
        ))));
    }

    image::save_buffer_with_format(path, pixels, width, height, color, ImageFormat::Png)
        .map_err(snapshot_err)?;

    debug!(path = %path.display(), width, height, channels, "snapshot written");
    Ok(())
}

fn parameter_error(message: String) -> ImageError {
    ImageError::Parameter(ParameterError::from_kind(ParameterErrorKind::Generic(
        message,
    )))
}
