//! CLI argument definitions using clap.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Simulated photon counting session with live display, correlation and
/// recording
#[derive(Parser, Debug)]
#[command(name = "photon-corr-demo", author, version)]
pub struct Cli {
    /// Configuration file (TOML or JSON); built-in defaults when absent
    #[arg(short, long, env = "PHOTON_CORR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Run time in seconds (0 = until Ctrl+C)
    #[arg(long, default_value = "10", env = "PHOTON_CORR_SECONDS")]
    pub seconds: u64,

    /// Start a recording right away
    #[arg(long)]
    pub record: bool,

    /// Override the correlation poll interval in seconds (0 or >= 301 stops it)
    #[arg(long)]
    pub correlation_interval: Option<u64>,

    /// Measure the count rate over this many seconds after start-up
    #[arg(long)]
    pub measure: Option<u64>,

    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value = "pretty", env = "PHOTON_CORR_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "PHOTON_CORR_METRICS_PORT")]
    pub metrics_port: u16,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}
