use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use depthcast::frame::WriterStats;
use depthcast::RunSummary;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ChannelOutput {
    frames_sent: u64,
    bytes_sent: u64,
}

impl From<WriterStats> for ChannelOutput {
    fn from(stats: WriterStats) -> Self {
        Self {
            frames_sent: stats.frames_sent,
            bytes_sent: stats.bytes_sent,
        }
    }
}

#[derive(Serialize)]
struct SummaryOutput<'a> {
    host: &'a str,
    iterations: u64,
    frames_advanced: u64,
    color: ChannelOutput,
    depth: ChannelOutput,
    snapshots_written: u64,
    snapshot_failures: u64,
}

impl<'a> SummaryOutput<'a> {
    fn new(host: &'a str, summary: &RunSummary) -> Self {
        Self {
            host,
            iterations: summary.iterations,
            frames_advanced: summary.frames_advanced,
            color: summary.color.into(),
            depth: summary.depth.into(),
            snapshots_written: summary.snapshots_written,
            snapshot_failures: summary.snapshot_failures,
        }
    }
}

pub fn render_summary(host: &str, summary: &RunSummary, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string(&SummaryOutput::new(host, summary))
            .unwrap_or_else(|_| "{}".to_string()),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["CHANNEL", "FRAMES", "BYTES"])
                .add_row(vec![
                    "color".to_string(),
                    summary.color.frames_sent.to_string(),
                    summary.color.bytes_sent.to_string(),
                ])
                .add_row(vec![
                    "depth".to_string(),
                    summary.depth.frames_sent.to_string(),
                    summary.depth.bytes_sent.to_string(),
                ]);
            format!(
                "{table}\nhost={host} iterations={} frames_advanced={} snapshots={}/{}",
                summary.iterations,
                summary.frames_advanced,
                summary.snapshots_written,
                summary.snapshots_written + summary.snapshot_failures,
            )
        }
        OutputFormat::Pretty => format!(
            "host={host} iterations={} frames_advanced={} color={}f/{}b depth={}f/{}b snapshots={} snapshot_failures={}",
            summary.iterations,
            summary.frames_advanced,
            summary.color.frames_sent,
            summary.color.bytes_sent,
            summary.depth.frames_sent,
            summary.depth.bytes_sent,
            summary.snapshots_written,
            summary.snapshot_failures,
        ),
    }
}

pub fn print_summary(host: &str, summary: &RunSummary, format: OutputFormat) {
    println!("{}", render_summary(host, summary, format));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> RunSummary {
        RunSummary {
            iterations: 2,
            frames_advanced: 32,
            color: WriterStats {
                frames_sent: 2,
                bytes_sent: 14,
            },
            depth: WriterStats {
                frames_sent: 2,
                bytes_sent: 6,
            },
            snapshots_written: 1,
            snapshot_failures: 1,
        }
    }

    #[test]
    fn json_summary_has_per_channel_totals() {
        let text = render_summary("10.0.0.7", &summary(), OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["host"], "10.0.0.7");
        assert_eq!(value["iterations"], 2);
        assert_eq!(value["frames_advanced"], 32);
        assert_eq!(value["color"]["bytes_sent"], 14);
        assert_eq!(value["depth"]["frames_sent"], 2);
        assert_eq!(value["snapshot_failures"], 1);
    }

    #[test]
    fn pretty_summary_is_one_line() {
        let text = render_summary("localhost", &summary(), OutputFormat::Pretty);
        assert!(!text.contains('\n'));
        assert!(text.starts_with("host=localhost iterations=2"));
        assert!(text.contains("depth=2f/6b"));
    }

    #[test]
    fn table_summary_lists_both_channels() {
        let text = render_summary("localhost", &summary(), OutputFormat::Table);
        assert!(text.contains("color"));
        assert!(text.contains("depth"));
        assert!(text.contains("snapshots=1/2"));
    }
}
