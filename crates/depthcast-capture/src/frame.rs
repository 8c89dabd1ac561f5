//! Borrowed frame views.
//!
//! A [`FrameBuffer`] never owns pixel memory. It is handed out by
//! [`CaptureSession::latest`](crate::CaptureSession::latest) and borrows the
//! session, so it cannot outlive the frame set it came from: the next
//! `advance()` needs the session mutably and the compiler rejects any view
//! still in scope.
//!
//! The raw bytes are exposed as bytes. Reinterpreting them as wider samples
//! goes through an explicit copy ([`FrameBuffer::depth_samples`]), never a
//! pointer cast.

use crate::error::{CaptureError, Result};
use crate::stream::{StreamDescriptor, StreamKind};

/// Typed, non-owning view over one stream's current frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameBuffer<'a> {
    kind: StreamKind,
    width: u32,
    height: u32,
    sample_size: usize,
    data: &'a [u8],
}

impl<'a> FrameBuffer<'a> {
    /// Wrap device memory for `descriptor`, checking it matches the geometry.
    pub fn new(descriptor: &StreamDescriptor, data: &'a [u8]) -> Result<Self> {
        let expected = descriptor.frame_len();
        if data.len() != expected {
            return Err(CaptureError::FrameSize {
                kind: descriptor.kind,
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            kind: descriptor.kind,
            width: descriptor.width,
            height: descriptor.height,
            sample_size: descriptor.kind.sample_size(),
            data,
        })
    }

    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Size in bytes of one sample element.
    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Number of sample elements in the frame.
    pub fn sample_count(&self) -> usize {
        self.data.len() / self.sample_size
    }

    /// Raw frame bytes, exactly as the device delivered them.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Copy the depth samples out of device memory.
    ///
    /// Samples are in native byte order, as the device writes them.
    pub fn depth_samples(&self) -> Result<Vec<u16>> {
        if self.kind != StreamKind::Depth {
            return Err(CaptureError::UnexpectedKind {
                expected: StreamKind::Depth,
                actual: self.kind,
            });
        }

        Ok(self
            .data
            .chunks_exact(2)
            .map(|pair| u16::from_ne_bytes([pair[0], pair[1]]))
            .collect())
    }
}
