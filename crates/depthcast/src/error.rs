use depthcast_capture::{CaptureError, DeviceError, StreamKind};
use depthcast_frame::FrameError;
use depthcast_transport::TransportError;

use crate::pipeline::LoopState;

/// Any failure that is not reported by the device driver.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// A channel could not be established.
    #[error("{kind} channel: {source}")]
    Connect {
        kind: StreamKind,
        source: TransportError,
    },

    /// A frame could not be put on the wire in full.
    #[error("{kind} channel: send failed: {source}")]
    Send {
        kind: StreamKind,
        source: FrameError,
    },

    /// A channel could not be shut down cleanly.
    #[error("{kind} channel: close failed: {source}")]
    Close {
        kind: StreamKind,
        source: TransportError,
    },

    /// A payload of one stream kind was offered to another kind's channel.
    #[error("{channel} channel cannot carry {payload} frames")]
    ChannelMismatch {
        channel: StreamKind,
        payload: StreamKind,
    },

    /// A capture loop operation was called out of order.
    #[error("cannot {operation} a capture loop that is {state}")]
    LoopState {
        operation: &'static str,
        state: LoopState,
    },

    /// Session misuse or a frame that disagrees with its stream geometry.
    #[error(transparent)]
    Capture(CaptureError),
}

/// Top-level pipeline failure. There are exactly two kinds.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Raised by the device collaborator.
    #[error(transparent)]
    Device(#[from] DeviceError),

    /// Everything else, transport failures included.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl PipelineError {
    pub fn is_device(&self) -> bool {
        matches!(self, PipelineError::Device(_))
    }
}

impl From<CaptureError> for PipelineError {
    fn from(err: CaptureError) -> Self {
        match err {
            CaptureError::Device(err) => PipelineError::Device(err),
            other => PipelineError::Runtime(RuntimeError::Capture(other)),
        }
    }
}
