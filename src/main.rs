//! Command-line entry point: clean, analyze and simulate.

mod cli;

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use solar_storage_sim::config::AnalysisConfig;
use solar_storage_sim::io::{export, loader};
use solar_storage_sim::pipeline::{Pipeline, PreparedSeries};
use solar_storage_sim::sim::BatteryConfig;
use solar_storage_sim::sim::scenario::ScenarioSpec;
use solar_storage_sim::sim::stats::TrajectoryStats;

use cli::{AnalyzeArgs, Cli, Commands, SimulateArgs};

fn main() -> anyhow::Result<ExitCode> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("solar_storage_sim=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Clean { input, output } => clean(&input, &output),
        Commands::Analyze(args) => analyze(&args),
        Commands::Simulate(args) => simulate(&args),
    }
}

fn load(input: &Path, raw: bool) -> anyhow::Result<loader::LoadedSeries> {
    let loaded = if raw {
        loader::load_raw_csv(input)
    } else {
        loader::load_cleaned_csv(input)
    };
    let loaded = loaded.with_context(|| format!("failed to load {}", input.display()))?;
    let r = loaded.report;
    info!(
        kept = r.kept(),
        summary_rows = r.summary_rows,
        unparsable_rows = r.unparsable_rows,
        duplicate_rows = r.duplicate_rows,
        "input loaded"
    );
    Ok(loaded)
}

fn clean(input: &Path, output: &Path) -> anyhow::Result<ExitCode> {
    let loaded = load(input, true)?;
    loader::write_cleaned_csv(&loaded.samples, output)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!(
        "Wrote {} samples to {}",
        loaded.samples.len(),
        output.display()
    );
    Ok(ExitCode::SUCCESS)
}

fn resolve_config(args: &AnalyzeArgs) -> anyhow::Result<AnalysisConfig> {
    let config = match (&args.config, &args.preset) {
        (Some(path), _) => AnalysisConfig::from_toml_file(path)?,
        (None, Some(name)) => AnalysisConfig::from_preset(name)?,
        (None, None) => AnalysisConfig::baseline(),
    };

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            warn!(%e, "invalid configuration");
        }
        let joined: Vec<String> = errors.iter().map(ToString::to_string).collect();
        bail!("configuration rejected:\n  {}", joined.join("\n  "));
    }
    Ok(config)
}

fn analyze(args: &AnalyzeArgs) -> anyhow::Result<ExitCode> {
    let config = resolve_config(args)?;
    let loaded = load(&args.input, args.raw)?;
    let prepared =
        PreparedSeries::new(loaded.samples, &config).context("failed to prepare series")?;

    let summary = Pipeline::new(&config, &args.output_dir)
        .run(&prepared)
        .with_context(|| format!("cannot write to {}", args.output_dir.display()))?;

    println!("{summary}");
    if summary.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn simulate(args: &SimulateArgs) -> anyhow::Result<ExitCode> {
    let mut config = AnalysisConfig::baseline();
    config.series.interval_minutes = args.interval_minutes;

    let battery = BatteryConfig::new(args.capacity_wh, args.initial_percent)?
        .with_first_interval(args.first_interval.into());
    let loaded = load(&args.input, args.raw)?;
    let prepared =
        PreparedSeries::new(loaded.samples, &config).context("failed to prepare series")?;

    let spec = if args.daily_reset {
        ScenarioSpec::daily_reset("daily reset", battery)
    } else {
        ScenarioSpec::continuous("continuous", battery)
    };
    let trajectory = spec.run(&prepared.series)?;
    let stats = TrajectoryStats::compute(
        prepared.series.intervals(),
        &trajectory,
        config.charge_thresholds(),
        &config.season_map()?,
        prepared.expected_per_day,
    )?;
    println!("{stats}");

    if let Some(path) = &args.telemetry_out {
        export::export_trajectory(prepared.series.intervals(), &trajectory, path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Trajectory written to {}", path.display());
    }
    Ok(ExitCode::SUCCESS)
}
