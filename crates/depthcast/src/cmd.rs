use std::path::PathBuf;

use clap::Args;
use depthcast::capture::{
    Quantization, SyntheticConfig, SyntheticContext, DEFAULT_WARM_UP_FRAMES,
};
use depthcast::frame::FrameConfig;
use depthcast::pipeline::DEFAULT_ITERATIONS;
use depthcast::{PipelineConfig, SnapshotConfig, COLOR_PORT, DEPTH_PORT};
use tracing::info;

use crate::exit::{pipeline_error, CliResult, SUCCESS};
use crate::output::{print_summary, OutputFormat};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Host receiving both streams (name or address).
    pub host: String,

    /// Frame sets to stream after warm-up.
    #[arg(long, value_name = "N", default_value_t = DEFAULT_ITERATIONS, conflicts_with = "unbounded")]
    pub iterations: u64,

    /// Stream until the first failure.
    #[arg(long)]
    pub unbounded: bool,

    /// Frame sets discarded before streaming.
    #[arg(long, value_name = "N", default_value_t = DEFAULT_WARM_UP_FRAMES)]
    pub warm_up: u32,

    /// Send bare payloads without the trailing newline.
    #[arg(long)]
    pub no_delimiter: bool,

    /// Quantize raw depth NEAR..=FAR onto 1..=255 instead of the full range.
    #[arg(long, value_name = "NEAR:FAR", value_parser = parse_depth_window)]
    pub depth_window: Option<Quantization>,

    /// Write the quantized depth frame to this PNG file.
    #[arg(long, value_name = "PATH")]
    pub snapshot: Option<PathBuf>,

    /// Write the snapshot every N iterations.
    #[arg(long, value_name = "N", default_value_t = 1, requires = "snapshot")]
    pub snapshot_every: u64,

    /// Frame rate of the capture device.
    #[arg(long, value_name = "FPS", default_value_t = 30)]
    pub fps: u32,

    /// Color channel port.
    #[arg(long, value_name = "PORT", default_value_t = COLOR_PORT, hide = true)]
    pub color_port: u16,

    /// Depth channel port.
    #[arg(long, value_name = "PORT", default_value_t = DEPTH_PORT, hide = true)]
    pub depth_port: u16,
}

impl RunArgs {
    pub fn pipeline_config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::new(&self.host);
        config.color_port = self.color_port;
        config.depth_port = self.depth_port;
        config.warm_up = self.warm_up;
        config.iterations = (!self.unbounded).then_some(self.iterations);
        if self.no_delimiter {
            config.framing = FrameConfig::undelimited();
        }
        if let Some(window) = self.depth_window {
            config.quantization = window;
        }
        config.snapshot = self.snapshot.clone().map(|path| SnapshotConfig {
            path,
            every: self.snapshot_every.max(1),
        });
        config
    }
}

pub fn run(args: RunArgs, format: OutputFormat) -> CliResult<i32> {
    let config = args.pipeline_config();
    let mut context = SyntheticContext::new(SyntheticConfig {
        fps: args.fps,
        ..SyntheticConfig::default()
    });

    info!(
        host = %config.host,
        color_port = config.color_port,
        depth_port = config.depth_port,
        iterations = ?config.iterations,
        "starting capture"
    );
    let summary = depthcast::run(&mut context, &config).map_err(pipeline_error)?;
    print_summary(&config.host, &summary, format);
    Ok(SUCCESS)
}

fn parse_depth_window(input: &str) -> Result<Quantization, String> {
    let (near, far) = input
        .split_once(':')
        .ok_or_else(|| format!("expected NEAR:FAR, got {input:?}"))?;
    let near: u16 = near
        .trim()
        .parse()
        .map_err(|err| format!("invalid near depth {near:?}: {err}"))?;
    let far: u16 = far
        .trim()
        .parse()
        .map_err(|err| format!("invalid far depth {far:?}: {err}"))?;
    if far <= near {
        return Err(format!("far ({far}) must be greater than near ({near})"));
    }
    Ok(Quantization::Window { near, far })
}
