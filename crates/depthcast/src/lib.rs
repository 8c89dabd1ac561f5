//! Stream synchronized color and quantized depth frames to a remote consumer.
//!
//! Each transmitted stream gets its own persistent TCP connection. Every
//! message is a fixed-size payload followed by a newline.
//!
//! # Crate Structure
//!
//! - [`channel`]: [`TransportChannel`], one connection bound to one stream kind
//! - [`pipeline`]: [`CaptureLoop`] and the [`run`] entry point
//! - [`error`]: the two-kind [`PipelineError`] boundary
//! - [`transport`], [`frame`], [`capture`]: re-exported building blocks

pub mod channel;
pub mod error;
pub mod pipeline;

pub use channel::{TransportChannel, COLOR_PORT, DEPTH_PORT};
pub use error::{PipelineError, RuntimeError};
pub use pipeline::{run, CaptureLoop, LoopState, PipelineConfig, RunSummary, SnapshotConfig};

/// Re-export transport types.
pub mod transport {
    pub use depthcast_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use depthcast_frame::*;
}

/// Re-export capture types.
pub mod capture {
    pub use depthcast_capture::*;
}
