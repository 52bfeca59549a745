use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use solar_storage_sim::sim::FirstInterval;

#[derive(Parser, Debug)]
#[command(
    name = "solar-storage-sim",
    version,
    about = "Battery state-of-charge simulation and storage sizing for solar sites"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse a raw export and write the cleaned intermediate CSV
    Clean {
        /// Raw CSV (`DD/MM/YYYY HH:MM` timestamps, negated production)
        #[arg(long)]
        input: PathBuf,

        /// Destination of the cleaned CSV
        #[arg(long)]
        output: PathBuf,
    },

    /// Run every analysis and write reports and CSV exports
    Analyze(AnalyzeArgs),

    /// Simulate a single battery and print its statistics
    Simulate(SimulateArgs),
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Input CSV (cleaned unless --raw is given)
    #[arg(long)]
    pub input: PathBuf,

    /// Treat the input as a raw export
    #[arg(long)]
    pub raw: bool,

    /// TOML configuration file
    #[arg(long, conflicts_with = "preset")]
    pub config: Option<PathBuf>,

    /// Built-in preset (baseline, daily, seasonal)
    #[arg(long)]
    pub preset: Option<String>,

    #[arg(long, default_value = "output", help = "Directory for reports and exports")]
    pub output_dir: PathBuf,
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Input CSV (cleaned unless --raw is given)
    #[arg(long)]
    pub input: PathBuf,

    /// Treat the input as a raw export
    #[arg(long)]
    pub raw: bool,

    #[arg(long, default_value_t = 240_000.0, help = "Battery capacity (Wh)")]
    pub capacity_wh: f64,

    #[arg(long, default_value_t = 0.0, help = "Starting charge (% of capacity)")]
    pub initial_percent: f64,

    #[arg(long, value_enum, default_value_t = FirstIntervalArg::Apply)]
    pub first_interval: FirstIntervalArg,

    /// Reset to the starting charge at every midnight
    #[arg(long)]
    pub daily_reset: bool,

    /// Sample spacing in minutes; detected from the data when absent
    #[arg(long)]
    pub interval_minutes: Option<u32>,

    /// Write the trajectory to this CSV
    #[arg(long)]
    pub telemetry_out: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FirstIntervalArg {
    /// First net energy value moves the seed
    Apply,
    /// First state equals the seed
    Hold,
}

impl From<FirstIntervalArg> for FirstInterval {
    fn from(arg: FirstIntervalArg) -> Self {
        match arg {
            FirstIntervalArg::Apply => FirstInterval::Apply,
            FirstIntervalArg::Hold => FirstInterval::Hold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("solar-storage-sim").chain(args.iter().copied()))
    }

    #[test]
    fn supports_config_cli() {
        let cli = parse(&["analyze", "--input", "data.csv", "--config", "site.toml"])
            .expect("parse");
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.config, Some(PathBuf::from("site.toml")));
        assert!(args.preset.is_none());
        assert_eq!(args.output_dir, PathBuf::from("output"));
        assert!(!args.raw);
    }

    #[test]
    fn supports_preset_cli() {
        let cli = parse(&["analyze", "--input", "raw.csv", "--raw", "--preset", "seasonal"])
            .expect("parse");
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.preset.as_deref(), Some("seasonal"));
        assert!(args.raw);
    }

    #[test]
    fn rejects_config_and_preset_together() {
        let err = parse(&[
            "analyze", "--input", "a.csv", "--config", "x.toml", "--preset", "daily",
        ])
        .expect_err("must conflict");
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn simulate_defaults() {
        let cli = parse(&["simulate", "--input", "clean.csv"]).expect("parse");
        let Commands::Simulate(args) = cli.command else {
            panic!("expected simulate");
        };
        assert_eq!(args.capacity_wh, 240_000.0);
        assert_eq!(args.initial_percent, 0.0);
        assert_eq!(args.first_interval, FirstIntervalArg::Apply);
        assert!(args.telemetry_out.is_none());
    }

    #[test]
    fn simulate_accepts_hold_policy() {
        let cli = parse(&[
            "simulate",
            "--input",
            "clean.csv",
            "--capacity-wh",
            "1000",
            "--initial-percent",
            "50",
            "--first-interval",
            "hold",
            "--telemetry-out",
            "soc.csv",
        ])
        .expect("parse");
        let Commands::Simulate(args) = cli.command else {
            panic!("expected simulate");
        };
        assert_eq!(FirstInterval::from(args.first_interval), FirstInterval::Hold);
        assert_eq!(args.telemetry_out, Some(PathBuf::from("soc.csv")));
    }

    #[test]
    fn clean_requires_output() {
        assert!(parse(&["clean", "--input", "raw.csv"]).is_err());
    }
}
