mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;
use tracing::info;

use crate::cmd::RunArgs;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "depthcast",
    version,
    about = "Stream color and quantized depth frames to a remote host"
)]
struct Cli {
    #[command(flatten)]
    run: RunArgs,

    /// Run summary format (stdout).
    #[arg(long, value_name = "FORMAT")]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: LogLevel,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);
    info!(
        version = env!("CARGO_PKG_VERSION"),
        target = option_env!("DEPTHCAST_BUILD_TARGET").unwrap_or("unknown"),
        "depthcast"
    );

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.run, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}
