//! Full analysis run over one loaded series.
//!
//! Each analysis runs independently. A failing analysis is logged and
//! recorded in the [`RunSummary`]; the remaining analyses still run.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::analysis::c_rate::CRateStats;
use crate::analysis::day_night::{self, DayBoundaries};
use crate::analysis::sizing::{self, DailyDemandStats};
use crate::analysis::solar_window::{self, WindowSummary};
use crate::config::{AnalysisConfig, BoundaryMode};
use crate::error::{Result, SimError};
use crate::io::export;
use crate::report::{
    CRateReport, EnergyReport, LoadDurationReport, SeasonalReport, SimulationReport,
    SizingReport, SolarWindowReport,
};
use crate::series::{Cadence, DailyEnergy, EnergySeries, TimeSeriesSample};
use crate::sim::battery::simulate_daily_reset;
use crate::sim::grid::{self, GridKpis};
use crate::sim::scenario::{ScenarioSpec, run_scenarios};
use crate::sim::stats::TrajectoryStats;
use crate::sim::{BatteryConfig, simulate_with};

/// Hours of the fixed boundaries every sizing run is compared against.
const REFERENCE_BOUNDARIES: (u32, u32) = (6, 18);

/// Loaded samples together with their energy view.
#[derive(Debug, Clone)]
pub struct PreparedSeries {
    pub samples: Vec<TimeSeriesSample>,
    pub series: EnergySeries,
    pub expected_per_day: usize,
}

impl PreparedSeries {
    /// Resolves the cadence and converts samples to energy.
    ///
    /// A configured interval wins over detection.
    pub fn new(samples: Vec<TimeSeriesSample>, config: &AnalysisConfig) -> Result<Self> {
        let cadence = match config.series.interval_minutes {
            Some(minutes) => Cadence::from_minutes(minutes)?,
            None => Cadence::detect(&samples)?.cadence,
        };
        let expected_per_day = config
            .series
            .expected_intervals_per_day
            .unwrap_or_else(|| cadence.intervals_per_day());
        let series = EnergySeries::from_samples(&samples, cadence);
        info!(
            samples = samples.len(),
            cadence_min = cadence.minutes(),
            expected_per_day,
            "series prepared"
        );
        Ok(Self {
            samples,
            series,
            expected_per_day,
        })
    }
}

/// An analysis that did not complete.
#[derive(Debug)]
pub struct AnalysisFailure {
    pub analysis: &'static str,
    pub error: SimError,
}

/// What a run produced.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub written: Vec<PathBuf>,
    pub completed: Vec<&'static str>,
    pub failures: Vec<AnalysisFailure>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} analyses completed, {} failed, {} files written",
            self.completed.len(),
            self.failures.len(),
            self.written.len()
        )?;
        for failure in &self.failures {
            write!(f, "\n  {}: {}", failure.analysis, failure.error)?;
        }
        Ok(())
    }
}

fn complete_energy_days(daily: &[DailyEnergy]) -> Vec<DailyEnergy> {
    daily.iter().filter(|d| d.complete).copied().collect()
}

/// Runs every analysis against one series and writes the results.
pub struct Pipeline<'a> {
    config: &'a AnalysisConfig,
    output_dir: &'a Path,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a AnalysisConfig, output_dir: &'a Path) -> Self {
        Self { config, output_dir }
    }

    /// Runs all analyses in order, collecting failures.
    ///
    /// # Errors
    ///
    /// Fails only if the output directory cannot be created.
    pub fn run(&self, prepared: &PreparedSeries) -> Result<RunSummary> {
        fs::create_dir_all(self.output_dir)?;

        let analyses: [(&'static str, fn(&Self, &PreparedSeries) -> Result<Vec<PathBuf>>); 7] = [
            ("energy", Self::energy),
            ("seasonal storage", Self::seasonal_storage),
            ("solar windows", Self::solar_windows),
            ("battery sizing", Self::battery_sizing),
            ("battery simulation", Self::battery_simulation),
            ("load duration", Self::load_duration),
            ("c-rates", Self::c_rates),
        ];

        let mut summary = RunSummary::default();
        for (name, analysis) in analyses {
            info!(analysis = name, "running");
            match analysis(self, prepared) {
                Ok(paths) => {
                    summary.written.extend(paths);
                    summary.completed.push(name);
                }
                Err(error) => {
                    warn!(analysis = name, %error, "analysis failed");
                    summary.failures.push(AnalysisFailure {
                        analysis: name,
                        error,
                    });
                }
            }
        }
        Ok(summary)
    }

    fn path(&self, file: &str) -> PathBuf {
        self.output_dir.join(file)
    }

    fn write_report(&self, file: &str, report: &impl fmt::Display) -> Result<PathBuf> {
        let path = self.path(file);
        fs::write(&path, report.to_string())?;
        info!(path = %path.display(), "report written");
        Ok(path)
    }

    /// Fixed boundaries, or the ones derived from production windows.
    fn boundaries(&self, prepared: &PreparedSeries) -> Result<DayBoundaries> {
        match self.config.day_night.mode {
            BoundaryMode::Fixed => self.config.fixed_boundaries(),
            BoundaryMode::Solar => {
                let windows = solar_window::production_windows(
                    &prepared.samples,
                    self.config.thresholds.onset_fraction,
                    prepared.expected_per_day,
                );
                WindowSummary::from_windows(&windows)?.recommended_boundaries()
            }
        }
    }

    fn energy(&self, prepared: &PreparedSeries) -> Result<Vec<PathBuf>> {
        let series = &prepared.series;
        let daily = series.daily(prepared.expected_per_day);
        let complete = complete_energy_days(&daily);
        let incomplete_days = daily.len() - complete.len();

        let mut top = complete.clone();
        top.sort_by(|a, b| b.totals.demand_wh.total_cmp(&a.totals.demand_wh));
        top.truncate(self.config.sizing.top_days);

        let monthly = series.monthly();
        let report = EnergyReport {
            totals: series.totals(),
            monthly: &monthly,
            demand: DailyDemandStats::from_days(&complete),
            top_demand_days: &top,
            incomplete_days,
        };
        let text = self.write_report("energy_analysis.txt", &report)?;

        let csv = self.path("daily_energy.csv");
        export::export_daily_energy(&daily, &csv)?;
        Ok(vec![text, csv])
    }

    fn seasonal_storage(&self, prepared: &PreparedSeries) -> Result<Vec<PathBuf>> {
        let seasons = self.config.season_map()?;
        let totals = prepared.series.seasonal(&seasons);
        let recommendation =
            sizing::recommend_seasonal(&totals, self.config.sizing.seasonal_buffer)?;
        let report = SeasonalReport {
            totals: prepared.series.totals(),
            seasons: &totals,
            season_map: &seasons,
            recommendation,
        };
        Ok(vec![self.write_report("seasonal_storage.txt", &report)?])
    }

    fn solar_windows(&self, prepared: &PreparedSeries) -> Result<Vec<PathBuf>> {
        let fraction = self.config.thresholds.onset_fraction;
        let windows = solar_window::production_windows(
            &prepared.samples,
            fraction,
            prepared.expected_per_day,
        );
        let summary = WindowSummary::from_windows(&windows)?;
        let recommended = match summary.recommended_boundaries() {
            Ok(b) => Some(b),
            Err(error) => {
                warn!(%error, "production windows do not yield valid boundaries");
                None
            }
        };
        let report = SolarWindowReport {
            summary: &summary,
            fraction,
            recommended,
        };
        Ok(vec![self.write_report("solar_windows.txt", &report)?])
    }

    fn battery_sizing(&self, prepared: &PreparedSeries) -> Result<Vec<PathBuf>> {
        let intervals = prepared.series.intervals();
        let sizing_cfg = &self.config.sizing;
        let boundaries = self.boundaries(prepared)?;

        let all =
            day_night::required_capacity_per_day(intervals, boundaries, prepared.expected_per_day);
        let complete = day_night::complete_days(&all);
        let required: Vec<f64> = complete.iter().map(|r| r.required_wh).collect();
        let stats = sizing::recommend_daily(&required, sizing_cfg.percentile)?;

        let reference = DayBoundaries::new(REFERENCE_BOUNDARIES.0, REFERENCE_BOUNDARIES.1)?;
        let mut candidates = vec![("06:00-18:00", reference)];
        if boundaries != reference {
            candidates.push(("configured", boundaries));
        }
        let comparison = sizing::compare_boundaries(
            intervals,
            &candidates,
            prepared.expected_per_day,
            sizing_cfg.percentile,
        )?;

        let top = sizing::top_days(&complete, sizing_cfg.top_days);
        let daily = prepared.series.daily(prepared.expected_per_day);
        let complete_energy = complete_energy_days(&daily);
        let dates = &self.config.dates;
        let summer = sizing::nearest_day(&complete, dates.summer_reference);
        let winter = sizing::nearest_day(&complete, dates.winter_reference);

        let mut checks = Vec::new();
        if stats.percentile_wh > 0.0 {
            let battery = &self.config.battery;
            let near_empty = self.config.thresholds.near_empty_percent;
            for (label, day) in [("Summer", summer), ("Winter", winter)] {
                let Some(day) = day else { continue };
                let intervals = prepared.series.day(day.date);
                for &pct in &battery.scenario_initial_percents {
                    let config = BatteryConfig::new(stats.percentile_wh, pct)?
                        .with_first_interval(battery.first_interval);
                    checks.extend(sizing::check_reference_day(
                        label,
                        intervals,
                        &config,
                        boundaries.morning_start(),
                        near_empty,
                    )?);
                }
            }
        } else {
            info!("recommended capacity is zero; reference days not simulated");
        }

        let report = SizingReport {
            boundaries,
            stats,
            incomplete_days: all.len() - complete.len(),
            summer,
            winter,
            top_days: &top,
            comparison: &comparison,
            demand: DailyDemandStats::from_days(&complete_energy),
            checks: &checks,
        };
        let text = self.write_report("battery_sizing.txt", &report)?;

        let csv = self.path("daily_requirements.csv");
        export::export_requirements(&all, &csv)?;
        Ok(vec![text, csv])
    }

    fn battery_simulation(&self, prepared: &PreparedSeries) -> Result<Vec<PathBuf>> {
        let specs: Vec<ScenarioSpec> = self
            .config
            .scenario_batteries()?
            .into_iter()
            .map(|b| ScenarioSpec::continuous(format!("start_{:.0}", b.initial_percent()), b))
            .collect();

        let series = &prepared.series;
        let seasons = self.config.season_map()?;
        let thresholds = self.config.charge_thresholds();

        let mut written = Vec::new();
        let mut runs = Vec::new();
        let mut failed = Vec::new();
        let mut first_error = None;
        for outcome in run_scenarios(series, &specs) {
            let path = self.path(&format!("trajectory_{}.csv", outcome.label));
            let result = outcome.result.and_then(|trajectory| {
                let stats = TrajectoryStats::compute(
                    series.intervals(),
                    &trajectory,
                    thresholds,
                    &seasons,
                    prepared.expected_per_day,
                )?;
                export::export_trajectory(series.intervals(), &trajectory, &path)?;
                Ok(stats)
            });
            match result {
                Ok(stats) => {
                    written.push(path);
                    runs.push((outcome.label, stats));
                }
                Err(error) => {
                    failed.push((outcome.label, error.to_string()));
                    first_error.get_or_insert(error);
                }
            }
        }

        let report = SimulationReport {
            runs: &runs,
            failures: &failed,
        };
        written.push(self.write_report("battery_simulation.txt", &report)?);
        match first_error {
            Some(error) if runs.is_empty() => Err(error),
            _ => Ok(written),
        }
    }

    fn load_duration(&self, prepared: &PreparedSeries) -> Result<Vec<PathBuf>> {
        let series = &prepared.series;
        let cadence = series.cadence();
        let totals = series.totals();
        let net = series.net_energy_wh();

        let daily_battery = BatteryConfig::new(self.config.battery.capacity_wh, 0.0)?
            .with_first_interval(self.config.battery.first_interval);
        let daily = simulate_daily_reset(series.intervals(), &daily_battery)?;
        let seasonal = simulate_with(&net, &self.config.seasonal_battery()?)?;

        let residuals = [
            ("No Battery", grid::residual_without_battery(&net, cadence)),
            ("Daily Battery", grid::residual_with_battery(&daily, cadence)),
            ("Seasonal Battery", grid::residual_with_battery(&seasonal, cadence)),
        ];
        let kpis: Vec<GridKpis> = residuals
            .iter()
            .map(|(label, residual)| GridKpis::from_residual(*label, residual, cadence, &totals))
            .collect();
        let report = LoadDurationReport {
            totals,
            kpis: &kpis,
        };
        let text = self.write_report("load_duration.txt", &report)?;

        let curves: Vec<(&str, Vec<f64>)> = [
            ("no_battery", &residuals[0].1),
            ("daily_battery", &residuals[1].1),
            ("seasonal_battery", &residuals[2].1),
        ]
        .into_iter()
        .map(|(label, residual)| (label, grid::duration_curve(residual)))
        .collect();
        let csv = self.path("load_duration.csv");
        export::export_duration_curves(&curves, cadence, &csv)?;
        Ok(vec![text, csv])
    }

    fn c_rates(&self, prepared: &PreparedSeries) -> Result<Vec<PathBuf>> {
        let power = prepared.series.net_power_w();
        let battery = &self.config.battery;
        let stats = vec![
            CRateStats::compute("Daily battery", &power, battery.capacity_wh)?,
            CRateStats::compute("Seasonal battery", &power, battery.seasonal_capacity_wh)?,
        ];
        Ok(vec![self.write_report("c_rates.txt", &CRateReport { stats: &stats })?])
    }
}
