//! Stream kinds and per-stream geometry.

use std::fmt;

/// Category of sensor data produced by a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StreamKind {
    Color,
    Depth,
    Infrared,
    Infrared2,
    Fisheye,
}

impl StreamKind {
    /// Every kind, in device capability order.
    pub const ALL: [StreamKind; 5] = [
        StreamKind::Depth,
        StreamKind::Color,
        StreamKind::Infrared,
        StreamKind::Infrared2,
        StreamKind::Fisheye,
    ];

    /// Channel count of the stream as presented downstream.
    ///
    /// Depth counts as three channels (rendered as RGB); the infrared and
    /// fisheye kinds are monochrome.
    pub const fn channel_count(self) -> u8 {
        match self {
            StreamKind::Color | StreamKind::Depth => 3,
            StreamKind::Infrared | StreamKind::Infrared2 | StreamKind::Fisheye => 1,
        }
    }

    /// Size in bytes of one raw sample element as the device delivers it.
    pub const fn sample_size(self) -> usize {
        match self {
            StreamKind::Depth => 2,
            _ => 1,
        }
    }

    /// Raw sample elements per pixel as the device delivers them.
    pub const fn raw_channels(self) -> usize {
        match self {
            StreamKind::Color => 3,
            _ => 1,
        }
    }

    /// Stable lowercase name.
    pub const fn name(self) -> &'static str {
        match self {
            StreamKind::Color => "color",
            StreamKind::Depth => "depth",
            StreamKind::Infrared => "infrared",
            StreamKind::Infrared2 => "infrared2",
            StreamKind::Fisheye => "fisheye",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Device stream configuration preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preset {
    #[default]
    BestQuality,
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Preset::BestQuality => "best_quality",
        })
    }
}

/// Calibration reported by the device for one stream.
///
/// Only `width` and `height` are interpreted by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intrinsics {
    pub width: u32,
    pub height: u32,
    /// Principal point, pixels from the left edge.
    pub ppx: f32,
    /// Principal point, pixels from the top edge.
    pub ppy: f32,
    /// Focal length as a multiple of pixel width.
    pub fx: f32,
    /// Focal length as a multiple of pixel height.
    pub fy: f32,
}

/// One enabled stream and its fixed geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamDescriptor {
    pub kind: StreamKind,
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub intrinsics: Intrinsics,
}

impl StreamDescriptor {
    pub fn new(kind: StreamKind, intrinsics: Intrinsics) -> Self {
        Self {
            kind,
            width: intrinsics.width,
            height: intrinsics.height,
            channels: kind.channel_count(),
            intrinsics,
        }
    }

    /// Pixels per frame.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Bytes per raw frame as the device delivers it.
    pub fn frame_len(&self) -> usize {
        self.pixel_count() * self.kind.raw_channels() * self.kind.sample_size()
    }
}
