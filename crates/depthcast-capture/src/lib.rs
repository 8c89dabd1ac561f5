//! Multi-stream sensor capture.
//!
//! This crate owns everything on the device side of the pipeline:
//! - [`stream`]: stream kinds, presets and per-stream geometry
//! - [`device`]: the seam to the device SDK ([`DeviceContext`], [`SensorDevice`])
//! - [`session`]: [`CaptureSession`]: open, enable, start, warm up, advance
//! - [`frame`]: borrowed, typed [`FrameBuffer`] views over device memory
//! - [`quantize`]: lossy 16-bit depth to 8-bit intensity
//! - [`snapshot`]: advisory PNG snapshots for visual debugging
//! - [`synthetic`]: a test-pattern device implementing the SDK seam

pub mod device;
pub mod error;
pub mod frame;
pub mod quantize;
pub mod session;
pub mod snapshot;
pub mod stream;
pub mod synthetic;

pub use device::{DeviceContext, SensorDevice};
pub use error::{CaptureError, DeviceError, Result};
pub use frame::FrameBuffer;
pub use quantize::{quantize, quantize_sample, Quantization, QuantizedDepthBuffer};
pub use session::{CaptureSession, DEFAULT_WARM_UP_FRAMES};
pub use snapshot::write_png;
pub use stream::{Intrinsics, Preset, StreamDescriptor, StreamKind};
pub use synthetic::{InjectedFailure, SyntheticConfig, SyntheticContext, SyntheticDevice};
