//! Acquire → quantize → send → advance.
//!
//! [`run`] connects both channels, opens and warms up the device, then drives
//! a [`CaptureLoop`] until its iteration bound is exhausted or something fails.
//! There is no recovery: the first error ends the run.

use std::path::PathBuf;

use depthcast_capture::{
    write_png, CaptureError, CaptureSession, DeviceContext, Quantization, SensorDevice,
    StreamKind, DEFAULT_WARM_UP_FRAMES,
};
use depthcast_frame::{FrameConfig, WriterStats};
use tracing::{debug, info, warn};

use crate::channel::{TransportChannel, COLOR_PORT, DEPTH_PORT};
use crate::error::{PipelineError, RuntimeError};

/// Iteration bound used when none is configured explicitly.
pub const DEFAULT_ITERATIONS: u64 = 2000;

/// Debug snapshot settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotConfig {
    /// PNG file, overwritten on every snapshot.
    pub path: PathBuf,
    /// Write one snapshot every `every` iterations (minimum 1).
    pub every: u64,
}

/// Everything a run needs besides the device.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Target host, name or address.
    pub host: String,
    pub color_port: u16,
    pub depth_port: u16,
    /// Frame sets discarded before streaming.
    pub warm_up: u32,
    /// `Some(n)` streams n frame sets, `None` streams until failure.
    pub iterations: Option<u64>,
    pub framing: FrameConfig,
    pub quantization: Quantization,
    pub snapshot: Option<SnapshotConfig>,
}

impl PipelineConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            color_port: COLOR_PORT,
            depth_port: DEPTH_PORT,
            warm_up: DEFAULT_WARM_UP_FRAMES,
            iterations: Some(DEFAULT_ITERATIONS),
            framing: FrameConfig::default(),
            quantization: Quantization::default(),
            snapshot: None,
        }
    }
}

/// Where a [`CaptureLoop`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    WarmingUp,
    Streaming,
    Finished,
}

impl std::fmt::Display for LoopState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            LoopState::WarmingUp => "warming up",
            LoopState::Streaming => "streaming",
            LoopState::Finished => "finished",
        })
    }
}

/// What a completed run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    /// Streaming iterations completed.
    pub iterations: u64,
    /// Every `advance()` of the session, warm-up included.
    pub frames_advanced: u64,
    pub color: WriterStats,
    pub depth: WriterStats,
    pub snapshots_written: u64,
    pub snapshot_failures: u64,
}

/// The steady-state loop over a started session and two connected channels.
pub struct CaptureLoop<D> {
    session: CaptureSession<D>,
    color: TransportChannel,
    depth: TransportChannel,
    quantization: Quantization,
    snapshot: Option<SnapshotConfig>,
    state: LoopState,
    iterations: u64,
    snapshots_written: u64,
    snapshot_failures: u64,
}

impl<D: SensorDevice> CaptureLoop<D> {
    /// Assemble a loop. The session must be started with color and depth enabled.
    pub fn new(
        session: CaptureSession<D>,
        color: TransportChannel,
        depth: TransportChannel,
        quantization: Quantization,
        snapshot: Option<SnapshotConfig>,
    ) -> Result<Self, PipelineError> {
        if !session.is_started() {
            return Err(CaptureError::NotStarted.into());
        }
        for (kind, channel) in [(StreamKind::Color, &color), (StreamKind::Depth, &depth)] {
            if session.descriptor(kind).is_none() {
                return Err(CaptureError::StreamNotEnabled(kind).into());
            }
            if channel.kind() != kind {
                return Err(RuntimeError::ChannelMismatch {
                    channel: channel.kind(),
                    payload: kind,
                }
                .into());
            }
        }

        Ok(Self {
            session,
            color,
            depth,
            quantization,
            snapshot,
            state: LoopState::WarmingUp,
            iterations: 0,
            snapshots_written: 0,
            snapshot_failures: 0,
        })
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn session(&self) -> &CaptureSession<D> {
        &self.session
    }

    /// Streaming iterations completed so far.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Discard `frames` frame sets, then enter `Streaming`. Happens once.
    ///
    /// With `frames == 0` on a fresh session the clock is still advanced once,
    /// so the first iteration has a frame set to acquire.
    pub fn warm_up(&mut self, frames: u32) -> Result<(), PipelineError> {
        self.expect_state(LoopState::WarmingUp, "warm up")?;

        let result = self.session.warm_up(frames).map_err(PipelineError::from);
        self.finish_on_error(result)?;
        if self.session.frame_counter() == 0 {
            let result = self.session.advance().map_err(PipelineError::from);
            self.finish_on_error(result)?;
        }
        self.state = LoopState::Streaming;
        info!(frames, "streaming");
        Ok(())
    }

    /// One streaming iteration: acquire, quantize, send color, send depth,
    /// snapshot, advance.
    ///
    /// Only valid while `Streaming`; a finished loop stays finished.
    pub fn step(&mut self) -> Result<(), PipelineError> {
        self.expect_state(LoopState::Streaming, "step")?;

        let result = self.transmit_frame_set();
        self.finish_on_error(result)?;

        let result = self.session.advance().map_err(PipelineError::from);
        self.finish_on_error(result)?;

        self.iterations += 1;
        Ok(())
    }

    /// Step until `iterations` are done (`None`: until failure), then close
    /// both channels.
    pub fn run(mut self, iterations: Option<u64>) -> Result<RunSummary, PipelineError> {
        self.expect_state(LoopState::Streaming, "run")?;
        match iterations {
            Some(n) => info!(iterations = n, "capture loop started"),
            None => info!("capture loop started (unbounded)"),
        }

        while iterations.is_none_or(|n| self.iterations < n) {
            self.step()?;
        }

        self.state = LoopState::Finished;
        let summary_base = RunSummary {
            iterations: self.iterations,
            frames_advanced: self.session.frame_counter(),
            snapshots_written: self.snapshots_written,
            snapshot_failures: self.snapshot_failures,
            ..RunSummary::default()
        };
        let color = self.color.close()?;
        let depth = self.depth.close()?;

        info!(iterations = summary_base.iterations, "capture loop finished");
        Ok(RunSummary {
            color,
            depth,
            ..summary_base
        })
    }

    fn transmit_frame_set(&mut self) -> Result<(), PipelineError> {
        let color = self.session.latest(StreamKind::Color)?;
        let depth_frame = self.session.latest(StreamKind::Depth)?;
        let depth = self.quantization.quantize_frame(&depth_frame)?;

        self.color.send(StreamKind::Color, color.as_bytes())?;
        self.depth.send(StreamKind::Depth, depth.as_bytes())?;
        debug!(
            iteration = self.iterations + 1,
            frame = self.session.frame_counter(),
            "frame set sent"
        );

        if let Some(snapshot) = &self.snapshot {
            if self.iterations % snapshot.every.max(1) == 0 {
                let written = write_png(
                    &snapshot.path,
                    depth.width(),
                    depth.height(),
                    1,
                    depth.as_bytes(),
                );
                match written {
                    Ok(()) => self.snapshots_written += 1,
                    Err(err) => {
                        self.snapshot_failures += 1;
                        warn!(error = %err, "depth snapshot failed");
                    }
                }
            }
        }

        Ok(())
    }

    fn expect_state(
        &self,
        expected: LoopState,
        operation: &'static str,
    ) -> Result<(), PipelineError> {
        if self.state == expected {
            return Ok(());
        }
        Err(RuntimeError::LoopState {
            operation,
            state: self.state,
        }
        .into())
    }

    fn finish_on_error<T>(
        &mut self,
        result: Result<T, PipelineError>,
    ) -> Result<T, PipelineError> {
        if result.is_err() {
            self.state = LoopState::Finished;
        }
        result
    }
}

/// Connect, open the first device, warm up, and stream.
///
/// Channels are connected before the device is touched, so an unreachable
/// consumer fails the run without opening the device.
pub fn run<C>(context: &mut C, config: &PipelineConfig) -> Result<RunSummary, PipelineError>
where
    C: DeviceContext,
{
    let color = TransportChannel::connect(
        StreamKind::Color,
        &config.host,
        config.color_port,
        config.framing,
    )?;
    let depth = TransportChannel::connect(
        StreamKind::Depth,
        &config.host,
        config.depth_port,
        config.framing,
    )?;

    let mut session = CaptureSession::open(context)?;
    session.enable_supported_streams()?;
    session.start()?;

    let mut capture = CaptureLoop::new(
        session,
        color,
        depth,
        config.quantization,
        config.snapshot.clone(),
    )?;
    capture.warm_up(config.warm_up)?;
    capture.run(config.iterations)
}
