use tracing::{debug, info};

use crate::device::{DeviceContext, SensorDevice};
use crate::error::{CaptureError, DeviceError, Result};
use crate::frame::FrameBuffer;
use crate::stream::{Preset, StreamDescriptor, StreamKind};

/// Frame sets discarded before transmission so auto-exposure can settle.
pub const DEFAULT_WARM_UP_FRAMES: u32 = 30;

/// An open device, its enabled streams, and the frame clock.
///
/// Lifecycle: [`open`](Self::open) → [`enable_supported_streams`](Self::enable_supported_streams)
/// → [`start`](Self::start) → [`warm_up`](Self::warm_up) → repeated
/// [`latest`](Self::latest) / [`advance`](Self::advance).
pub struct CaptureSession<D> {
    device: D,
    enabled: Vec<StreamKind>,
    descriptors: Vec<StreamDescriptor>,
    started: bool,
    frame_counter: u64,
}

impl<D: SensorDevice> CaptureSession<D> {
    /// Open the first enumerated device.
    pub fn open<C>(context: &mut C) -> Result<Self>
    where
        C: DeviceContext<Device = D>,
    {
        let count = context.device_count();
        info!(count, "enumerated devices");
        if count == 0 {
            return Err(DeviceError::new("get_device_count", "", "no devices connected").into());
        }

        let device = context.device(0)?;
        info!(
            name = device.name(),
            serial = device.serial(),
            firmware = device.firmware_version(),
            "using device 0"
        );

        Ok(Self::from_device(device))
    }

    /// Wrap an already opened device.
    pub fn from_device(device: D) -> Self {
        Self {
            device,
            enabled: Vec::new(),
            descriptors: Vec::new(),
            started: false,
            frame_counter: 0,
        }
    }

    /// Enable every stream kind the device supports at the best-quality preset.
    ///
    /// Returns the kinds that were enabled.
    pub fn enable_supported_streams(&mut self) -> Result<&[StreamKind]> {
        if self.started {
            return Err(CaptureError::AlreadyStarted);
        }

        for kind in StreamKind::ALL {
            if !self.device.supports(kind) || self.enabled.contains(&kind) {
                continue;
            }
            self.device.enable_stream(kind, Preset::BestQuality)?;
            debug!(%kind, "stream enabled");
            self.enabled.push(kind);
        }

        Ok(&self.enabled)
    }

    /// Begin streaming and record each enabled stream's geometry.
    pub fn start(&mut self) -> Result<()> {
        if self.started {
            return Err(CaptureError::AlreadyStarted);
        }
        if self.enabled.is_empty() {
            return Err(CaptureError::NoStreams);
        }

        self.device.start()?;

        let mut descriptors = Vec::with_capacity(self.enabled.len());
        for &kind in &self.enabled {
            let intrinsics = self.device.intrinsics(kind)?;
            let descriptor = StreamDescriptor::new(kind, intrinsics);
            info!(
                %kind,
                width = descriptor.width,
                height = descriptor.height,
                channels = descriptor.channels,
                "stream geometry"
            );
            descriptors.push(descriptor);
        }

        self.descriptors = descriptors;
        self.started = true;
        Ok(())
    }

    /// Advance the frame clock `frames` times without handing out any frames.
    pub fn warm_up(&mut self, frames: u32) -> Result<()> {
        for _ in 0..frames {
            self.advance()?;
        }
        info!(frames, "warm-up complete");
        Ok(())
    }

    /// Block until the next synchronized frame set is available.
    pub fn advance(&mut self) -> Result<()> {
        if !self.started {
            return Err(CaptureError::NotStarted);
        }
        self.device.wait_for_frames()?;
        self.frame_counter += 1;
        Ok(())
    }

    /// Borrow `kind`'s frame from the current frame set.
    pub fn latest(&self, kind: StreamKind) -> Result<FrameBuffer<'_>> {
        if !self.started {
            return Err(CaptureError::NotStarted);
        }
        let descriptor = self
            .descriptor(kind)
            .ok_or(CaptureError::StreamNotEnabled(kind))?;
        let data = self.device.frame_data(kind)?;
        FrameBuffer::new(descriptor, data)
    }

    /// Geometry of an enabled stream, once started.
    pub fn descriptor(&self, kind: StreamKind) -> Option<&StreamDescriptor> {
        self.descriptors.iter().find(|d| d.kind == kind)
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Number of completed `advance()` calls.
    pub fn frame_counter(&self) -> u64 {
        self.frame_counter
    }
}
