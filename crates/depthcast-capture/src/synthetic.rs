//! Test-pattern device.
//!
//! Implements the device seam without hardware. Patterns:
//! - color: byte `i` of frame `n` is `(i + n) % 255`, so a receiver can tell
//!   which frame set it was sent
//! - depth: upper half near, lower half at the far limit, column 0 invalid (0)
//! - monochrome kinds: a horizontal ramp
//!
//! Frames are paced to `fps` by sleeping until each frame's deadline.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::device::{DeviceContext, SensorDevice};
use crate::error::DeviceError;
use crate::stream::{Intrinsics, Preset, StreamKind};

/// Raw depth of the near (upper) half of the synthetic scene.
pub const NEAR_DEPTH: u16 = 20 * 257;

/// Raw depth of the far (lower) half of the synthetic scene.
pub const FAR_DEPTH: u16 = u16::MAX;

/// A device operation that can be made to fail on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectedFailure {
    EnableStream(StreamKind),
    Start,
    /// Fail the wait that would produce frame `n + 1`.
    WaitForFrames { after: u64 },
}

/// Configuration for synthetic devices.
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    /// Devices reported by the context.
    pub device_count: usize,
    pub width: u32,
    pub height: u32,
    /// Frame rate to pace `wait_for_frames` at. `0` disables pacing.
    pub fps: u32,
    /// Stream kinds the device reports as supported.
    pub supported: Vec<StreamKind>,
    pub failure: Option<InjectedFailure>,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            device_count: 1,
            width: 640,
            height: 480,
            fps: 30,
            supported: vec![StreamKind::Depth, StreamKind::Color, StreamKind::Infrared],
            failure: None,
        }
    }
}

/// Enumerates synthetic devices.
pub struct SyntheticContext {
    config: SyntheticConfig,
    waits: Arc<AtomicU64>,
}

impl SyntheticContext {
    pub fn new(config: SyntheticConfig) -> Self {
        Self {
            config,
            waits: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Shared count of `wait_for_frames` calls across every device opened here.
    pub fn wait_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.waits)
    }
}

impl Default for SyntheticContext {
    fn default() -> Self {
        Self::new(SyntheticConfig::default())
    }
}

impl DeviceContext for SyntheticContext {
    type Device = SyntheticDevice;

    fn device_count(&self) -> usize {
        self.config.device_count
    }

    fn device(&mut self, index: usize) -> Result<SyntheticDevice, DeviceError> {
        if index >= self.config.device_count {
            return Err(DeviceError::new(
                "get_device",
                index.to_string(),
                format!("only {} device(s) attached", self.config.device_count),
            ));
        }
        Ok(SyntheticDevice::new(
            index,
            self.config.clone(),
            Arc::clone(&self.waits),
        ))
    }
}

/// One synthetic multi-stream device.
pub struct SyntheticDevice {
    config: SyntheticConfig,
    serial: String,
    enabled: BTreeMap<StreamKind, Preset>,
    buffers: BTreeMap<StreamKind, Vec<u8>>,
    started_at: Option<Instant>,
    /// When the next frame set is due; `None` when unpaced.
    next_deadline: Option<Instant>,
    frame: u64,
    waits: Arc<AtomicU64>,
}

impl SyntheticDevice {
    fn new(index: usize, config: SyntheticConfig, waits: Arc<AtomicU64>) -> Self {
        Self {
            config,
            serial: format!("SYN-{index:04}"),
            enabled: BTreeMap::new(),
            buffers: BTreeMap::new(),
            started_at: None,
            next_deadline: None,
            frame: 0,
            waits,
        }
    }

    fn pixel_count(&self) -> usize {
        self.config.width as usize * self.config.height as usize
    }

    fn frame_period(&self) -> Option<Duration> {
        (self.config.fps > 0).then(|| Duration::from_secs(1) / self.config.fps)
    }

    fn render(&mut self) {
        let width = self.config.width as usize;
        let height = self.config.height as usize;
        let pixels = self.pixel_count();
        let frame = self.frame;

        for (kind, buf) in self.buffers.iter_mut() {
            match kind {
                StreamKind::Color => {
                    let offset = (frame % 255) as usize;
                    for (i, byte) in buf.iter_mut().enumerate() {
                        *byte = ((i + offset) % 255) as u8;
                    }
                }
                StreamKind::Depth => {
                    for (i, pair) in buf.chunks_exact_mut(2).enumerate() {
                        let (row, col) = (i / width, i % width);
                        let raw = if col == 0 {
                            0
                        } else if row < height / 2 {
                            NEAR_DEPTH
                        } else {
                            FAR_DEPTH
                        };
                        pair.copy_from_slice(&raw.to_ne_bytes());
                    }
                }
                StreamKind::Infrared | StreamKind::Infrared2 | StreamKind::Fisheye => {
                    for (i, byte) in buf.iter_mut().enumerate().take(pixels) {
                        *byte = ((i % width) * 255 / width.max(1)) as u8;
                    }
                }
            }
        }
    }
}

impl SensorDevice for SyntheticDevice {
    fn name(&self) -> &str {
        "Synthetic Depth Camera"
    }

    fn serial(&self) -> &str {
        &self.serial
    }

    fn firmware_version(&self) -> &str {
        "0.0.0-synthetic"
    }

    fn supports(&self, kind: StreamKind) -> bool {
        self.config.supported.contains(&kind)
    }

    fn enable_stream(&mut self, kind: StreamKind, preset: Preset) -> Result<(), DeviceError> {
        let args = format!("{kind}, {preset}");
        if self.config.failure == Some(InjectedFailure::EnableStream(kind)) {
            return Err(DeviceError::new("enable_stream", args, "injected failure"));
        }
        if self.started_at.is_some() {
            return Err(DeviceError::new(
                "enable_stream",
                args,
                "device is already streaming",
            ));
        }
        if !self.supports(kind) {
            return Err(DeviceError::new("enable_stream", args, "stream not supported"));
        }

        self.enabled.insert(kind, preset);
        Ok(())
    }

    fn start(&mut self) -> Result<(), DeviceError> {
        if self.config.failure == Some(InjectedFailure::Start) {
            return Err(DeviceError::new("start", "", "injected failure"));
        }
        if self.started_at.is_some() {
            return Err(DeviceError::new("start", "", "device is already streaming"));
        }
        if self.enabled.is_empty() {
            return Err(DeviceError::new("start", "", "no streams enabled"));
        }

        let pixels = self.pixel_count();
        self.buffers = self
            .enabled
            .keys()
            .map(|&kind| {
                let len = pixels * kind.raw_channels() * kind.sample_size();
                (kind, vec![0u8; len])
            })
            .collect();
        let now = Instant::now();
        self.started_at = Some(now);
        self.next_deadline = self.frame_period().and_then(|period| now.checked_add(period));

        info!(
            streams = self.enabled.len(),
            width = self.config.width,
            height = self.config.height,
            fps = self.config.fps,
            "synthetic device streaming"
        );
        Ok(())
    }

    fn intrinsics(&self, kind: StreamKind) -> Result<Intrinsics, DeviceError> {
        if !self.enabled.contains_key(&kind) {
            return Err(DeviceError::new(
                "get_stream_intrinsics",
                kind.to_string(),
                "stream not enabled",
            ));
        }

        let (width, height) = (self.config.width, self.config.height);
        Ok(Intrinsics {
            width,
            height,
            ppx: width as f32 / 2.0,
            ppy: height as f32 / 2.0,
            fx: width as f32 * 0.9,
            fy: width as f32 * 0.9,
        })
    }

    fn wait_for_frames(&mut self) -> Result<(), DeviceError> {
        if self.started_at.is_none() {
            return Err(DeviceError::new("wait_for_frames", "", "device not streaming"));
        }
        if let Some(InjectedFailure::WaitForFrames { after }) = self.config.failure {
            if self.frame >= after {
                return Err(DeviceError::new("wait_for_frames", "", "injected failure"));
            }
        }

        if let Some(deadline) = self.next_deadline {
            let now = Instant::now();
            if deadline > now {
                std::thread::sleep(deadline - now);
            }
            self.next_deadline = self
                .frame_period()
                .and_then(|period| deadline.checked_add(period));
        }

        self.frame += 1;
        self.waits.fetch_add(1, Ordering::SeqCst);
        self.render();
        debug!(frame = self.frame, "synthetic frame set ready");
        Ok(())
    }

    fn frame_data(&self, kind: StreamKind) -> Result<&[u8], DeviceError> {
        if self.frame == 0 {
            return Err(DeviceError::new(
                "get_frame_data",
                kind.to_string(),
                "no frame set available",
            ));
        }
        self.buffers
            .get(&kind)
            .map(Vec::as_slice)
            .ok_or_else(|| DeviceError::new("get_frame_data", kind.to_string(), "stream not enabled"))
    }
}
