use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::domain::value_objects::baseline_mode::BaselineMode;
use crate::domain::value_objects::platform::Platform;

/// trafficwatch: traffic baselines and anomaly detection
///
/// Collects per-platform traffic metrics, learns what normal looks like
/// and flags samples or level shifts that fall outside of it.
#[derive(Parser, Debug)]
#[command(name = "trafficwatch")]
#[command(version, about, long_about)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to custom config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Collect synthetic traffic for the last N days and store it
    #[command(alias = "c")]
    Collect {
        #[arg(short, long, default_value = "mock")]
        platform: Platform,

        /// Number of days to collect, ending today
        #[arg(short, long, default_value = "30")]
        days: u32,

        /// Inject random spikes and drops into the generated series
        #[arg(long)]
        anomalies: bool,

        /// Seed for reproducible data
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Import a JSON array of traffic records
    #[command(alias = "i")]
    Import {
        /// Path to the JSON export
        file: PathBuf,
    },

    /// Compute and store the baseline from recent history
    #[command(alias = "b")]
    Baseline {
        #[arg(short, long)]
        platform: Platform,

        /// daily, weekly or monthly (default: config)
        #[arg(short, long)]
        mode: Option<BaselineMode>,

        /// History window in days
        #[arg(short, long, default_value = "30")]
        days: u32,

        /// Average samples per period before computing
        #[arg(long)]
        aggregate: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check recent samples against the stored baseline
    #[command(alias = "d")]
    Detect {
        #[arg(short, long)]
        platform: Platform,

        /// daily, weekly or monthly (default: config)
        #[arg(short, long)]
        mode: Option<BaselineMode>,

        /// Samples from the last N days are checked
        #[arg(short, long, default_value = "7")]
        days: u32,

        /// Trend window size (default: config)
        #[arg(short, long)]
        window: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare the most recent sample with the stored baseline
    #[command(alias = "cmp")]
    Compare {
        #[arg(short, long)]
        platform: Platform,

        /// daily, weekly or monthly (default: config)
        #[arg(short, long)]
        mode: Option<BaselineMode>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Summarize non-anomalous traffic of the last N days
    #[command(alias = "s")]
    Summary {
        #[arg(short, long)]
        platform: Platform,

        #[arg(short, long, default_value = "7")]
        days: u32,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Cross-platform report with trends, anomalies and recommendations
    #[command(alias = "r")]
    Report {
        /// daily, weekly or monthly (default: config)
        #[arg(short, long)]
        mode: Option<BaselineMode>,

        /// Report period in days, ending now
        #[arg(short, long, default_value = "30")]
        days: u32,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Also write the JSON report to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show what the database holds
    #[command(alias = "st")]
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete samples older than N days
    Cleanup {
        #[arg(short, long)]
        days: u32,
    },
}
