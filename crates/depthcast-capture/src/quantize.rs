//! Lossy depth quantization, 16-bit samples to 8-bit intensity.
//!
//! Raw 0 is the sensor's "no return" value and always quantizes to 0.

use crate::error::{CaptureError, Result};
use crate::frame::FrameBuffer;

/// One frame of quantized depth, one byte per pixel, row-major.
///
/// Owned and produced fresh for every frame set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantizedDepthBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl QuantizedDepthBuffer {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

/// Depth quantization strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quantization {
    /// `floor(d * 255 / 65535)` over the full 16-bit range.
    #[default]
    Linear,
    /// Rescale raw `[near, far]` onto `1..=255`, clamping values outside it.
    ///
    /// Raw 0 stays 0, so invalid pixels remain distinguishable from `near`.
    Window { near: u16, far: u16 },
}

impl Quantization {
    /// Quantize a single raw sample.
    pub fn apply(self, raw: u16) -> u8 {
        match self {
            Quantization::Linear => quantize_sample(raw),
            Quantization::Window { near, far } => {
                if raw == 0 {
                    return 0;
                }
                if far <= near {
                    return 255;
                }
                let clamped = raw.clamp(near, far);
                let span = u32::from(far - near);
                (1 + u32::from(clamped - near) * 254 / span) as u8
            }
        }
    }

    /// Quantize a full depth frame of `width × height` samples.
    pub fn quantize(self, depth: &[u16], width: u32, height: u32) -> Result<Vec<u8>> {
        let expected = width as usize * height as usize;
        if depth.len() != expected {
            return Err(CaptureError::DepthLength {
                expected,
                actual: depth.len(),
            });
        }
        Ok(depth.iter().map(|&d| self.apply(d)).collect())
    }

    /// Copy the samples out of a depth frame and quantize them.
    pub fn quantize_frame(self, frame: &FrameBuffer<'_>) -> Result<QuantizedDepthBuffer> {
        let samples = frame.depth_samples()?;
        let data = self.quantize(&samples, frame.width(), frame.height())?;
        Ok(QuantizedDepthBuffer {
            width: frame.width(),
            height: frame.height(),
            data,
        })
    }
}

/// `floor(raw * 255 / 65535)`.
#[inline]
pub fn quantize_sample(raw: u16) -> u8 {
    (u32::from(raw) * 255 / u32::from(u16::MAX)) as u8
}

/// Linear-quantize a `width × height` depth frame.
pub fn quantize(depth: &[u16], width: u32, height: u32) -> Result<Vec<u8>> {
    Quantization::Linear.quantize(depth, width, height)
}
