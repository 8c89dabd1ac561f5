use crate::error::DeviceError;
use crate::stream::{Intrinsics, Preset, StreamKind};

/// Device enumeration, the entry point of a device SDK.
pub trait DeviceContext {
    type Device: SensorDevice;

    /// Number of currently attached devices.
    fn device_count(&self) -> usize;

    /// Open the device at `index` in enumeration order.
    fn device(&mut self, index: usize) -> Result<Self::Device, DeviceError>;
}

/// A multi-stream sensor device.
///
/// Frame memory stays owned by the device. [`frame_data`](Self::frame_data)
/// lends it out for the current frame set only; the borrow ends at the next
/// [`wait_for_frames`](Self::wait_for_frames), which needs `&mut self`.
pub trait SensorDevice {
    /// Human-readable model name.
    fn name(&self) -> &str;

    fn serial(&self) -> &str;

    fn firmware_version(&self) -> &str;

    /// Whether the device can produce `kind`.
    fn supports(&self, kind: StreamKind) -> bool;

    /// Enable `kind` at `preset`. Must be called before [`start`](Self::start).
    fn enable_stream(&mut self, kind: StreamKind, preset: Preset) -> Result<(), DeviceError>;

    /// Begin streaming every enabled kind.
    fn start(&mut self) -> Result<(), DeviceError>;

    /// Calibration of an enabled stream. Valid once streaming has started.
    fn intrinsics(&self, kind: StreamKind) -> Result<Intrinsics, DeviceError>;

    /// Block until the next synchronized frame set is available.
    fn wait_for_frames(&mut self) -> Result<(), DeviceError>;

    /// Raw bytes of `kind` in the current frame set.
    fn frame_data(&self, kind: StreamKind) -> Result<&[u8], DeviceError>;
}
