use clap::{Parser, ValueEnum};
use crossing_pipes_lib::config::DEFAULT_JUNCTION_TOLERANCE;
use crossing_pipes_lib::{CheckConfig, DistanceMetric, ExecutionMode};
use std::path::PathBuf;

/// Environment variable consulted when `--tolerance` is not given
pub const TOLERANCE_ENV: &str = "CROSSING_PIPES_TOLERANCE";

/// Generic function to get environment variable, parsing it to the desired type.
pub fn get_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

/// How the reports are written to stdout
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed JSON array of reports
    #[default]
    Json,
    /// One line per crossing
    Text,
}

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Crossing Pipes - report pipes that cross without a junction in a water network snapshot
pub struct Settings {
    /// Network snapshot to check (`{ "assets": [...] }` JSON, `-` for stdin)
    #[clap(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Junction tolerance (native units, or meters with --geographic).
    /// Falls back to $CROSSING_PIPES_TOLERANCE, then 0.5
    #[clap(short, long)]
    pub tolerance: Option<f64>,

    /// Coordinates are longitude/latitude degrees; measure distances in meters
    #[clap(long, default_value = "false")]
    pub geographic: bool,

    /// Run detection on the main thread instead of a background worker
    #[clap(long, default_value = "false")]
    pub inline: bool,

    /// Output format
    #[clap(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

impl Settings {
    /// Parse the process arguments, exiting with usage on error
    pub fn from_cli() -> Self {
        match Settings::try_parse() {
            Ok(args) => args,
            Err(e) => e.exit(),
        }
    }

    /// Library configuration for this invocation
    pub fn check_config(&self) -> CheckConfig {
        let junction_tolerance = self
            .tolerance
            .or_else(|| get_env(TOLERANCE_ENV))
            .unwrap_or(DEFAULT_JUNCTION_TOLERANCE);

        CheckConfig {
            junction_tolerance,
            distance_metric: if self.geographic {
                DistanceMetric::Haversine
            } else {
                DistanceMetric::Euclidean
            },
            execution: if self.inline {
                ExecutionMode::Inline
            } else {
                ExecutionMode::Worker
            },
        }
    }
}
