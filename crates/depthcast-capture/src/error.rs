use std::path::PathBuf;

use crate::stream::StreamKind;

/// A failure reported by the device driver.
///
/// Carries the identity of the failing call so the diagnostic reads like the
/// call site: `wait_for_frames(timeout=none): device disconnected`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("device error calling {operation}({args}): {message}")]
pub struct DeviceError {
    /// Name of the failing device operation.
    pub operation: String,
    /// Rendered arguments of the failing call.
    pub args: String,
    /// Driver message.
    pub message: String,
}

impl DeviceError {
    pub fn new(
        operation: impl Into<String>,
        args: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation: operation.into(),
            args: args.into(),
            message: message.into(),
        }
    }
}

/// Errors that can occur in capture operations.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// The device collaborator failed.
    #[error(transparent)]
    Device(#[from] DeviceError),

    /// A frame was requested before `start()`.
    #[error("capture session not started")]
    NotStarted,

    /// `start()` was called on a session that is already streaming.
    #[error("capture session already started")]
    AlreadyStarted,

    /// `start()` was called with no enabled streams.
    #[error("no streams enabled")]
    NoStreams,

    /// The requested stream kind is not enabled on this session.
    #[error("stream {0} is not enabled")]
    StreamNotEnabled(StreamKind),

    /// The device handed back a frame whose size disagrees with its geometry.
    #[error("{kind} frame is {actual} bytes, expected {expected}")]
    FrameSize {
        kind: StreamKind,
        expected: usize,
        actual: usize,
    },

    /// A frame of one kind was used where another kind was required.
    #[error("expected a {expected} frame, got {actual}")]
    UnexpectedKind {
        expected: StreamKind,
        actual: StreamKind,
    },

    /// Depth samples do not cover exactly width × height pixels.
    #[error("depth input has {actual} samples, expected {expected}")]
    DepthLength { expected: usize, actual: usize },

    /// A debug snapshot could not be written.
    #[error("failed to write snapshot {path}: {source}")]
    Snapshot {
        path: PathBuf,
        source: image::ImageError,
    },
}

pub type Result<T> = std::result::Result<T, CaptureError>;
