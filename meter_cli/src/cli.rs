//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "meter", version, about = "Power metering node CLI")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/meter_config.toml")]
    pub config: PathBuf,

    /// Emit JSON lines instead of pretty output
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the metering loop: sample, compute, uplink, refresh the display
    Run {
        /// Stop after this many measurement cycles (default: run until Ctrl-C)
        #[arg(long, value_name = "N")]
        cycles: Option<u64>,

        /// Override uplink.interval_ms from the config
        #[arg(long, value_name = "MS")]
        uplink_interval_ms: Option<u64>,

        /// Simulate an inductive load: current lags voltage by this many radians
        #[arg(long, value_name = "RAD")]
        lag: Option<f64>,
    },
    /// Take a single measurement cycle and print the report
    Measure {
        /// Simulate an inductive load: current lags voltage by this many radians
        #[arg(long, value_name = "RAD")]
        lag: Option<f64>,
    },
    /// Quick health check (config loads, sim hardware assembles, one cycle runs)
    SelfCheck,
}
