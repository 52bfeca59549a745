mod common;

use solar_storage_sim::analysis::day_night;
use solar_storage_sim::analysis::sizing;
use solar_storage_sim::analysis::solar_window::{self, WindowSummary};
use solar_storage_sim::config::AnalysisConfig;
use solar_storage_sim::io::loader;
use solar_storage_sim::pipeline::{Pipeline, PreparedSeries};

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

fn prepared_year(config: &AnalysisConfig) -> PreparedSeries {
    let loaded = loader::read_raw(common::raw_year().as_bytes()).expect("raw year should load");
    assert_eq!(loaded.report.summary_rows, 2);
    assert_eq!(loaded.samples.len(), 365 * 24);
    PreparedSeries::new(loaded.samples, config).expect("series should prepare")
}

#[test]
fn seasonal_recommendation_from_raw_year() {
    let cfg = AnalysisConfig::baseline();
    let prepared = prepared_year(&cfg);
    let seasons = cfg.season_map().expect("season map");
    let totals = prepared.series.seasonal(&seasons);
    let rec = sizing::recommend_seasonal(&totals, cfg.sizing.seasonal_buffer)
        .expect("recommendation");

    // Winter: 90 days at 8 kWh produced vs 19.2 kWh demanded.
    assert!(approx(rec.winter_deficit_wh, 90.0 * 11_200.0));
    // Summer: 92 days at 32 kWh produced.
    assert!(approx(rec.summer_excess_wh, 92.0 * 12_800.0));
    assert!(approx(rec.required_wh, 92.0 * 12_800.0));
    assert!(approx(rec.recommended_wh, 92.0 * 12_800.0 * 1.10));
}

#[test]
fn daily_sizing_uses_night_deficit_when_day_is_in_surplus() {
    let cfg = AnalysisConfig::baseline();
    let prepared = prepared_year(&cfg);
    let boundaries = cfg.fixed_boundaries().expect("boundaries");
    let requirements = day_night::required_capacity_per_day(
        prepared.series.intervals(),
        boundaries,
        prepared.expected_per_day,
    );
    assert_eq!(requirements.len(), 365);
    assert!(requirements.iter().all(|r| r.complete));

    let required: Vec<f64> = requirements.iter().map(|r| r.required_wh).collect();
    let stats = sizing::recommend_daily(&required, 90.0).expect("stats");
    // 14 night hours at 800 W; winter days have no day excess.
    assert!(approx(stats.max_wh, 11_200.0));
    assert!(approx(stats.percentile_wh, 11_200.0));
    assert!(approx(stats.median_wh, 11_200.0));
    assert_eq!(required.iter().filter(|&&r| r == 0.0).count(), 90);
}

#[test]
fn production_windows_recommend_eight_to_fifteen() {
    let cfg = AnalysisConfig::baseline();
    let prepared = prepared_year(&cfg);
    let windows = solar_window::production_windows(
        &prepared.samples,
        cfg.thresholds.onset_fraction,
        prepared.expected_per_day,
    );
    assert_eq!(windows.len(), 365);
    let summary = WindowSummary::from_windows(&windows).expect("summary");
    assert_eq!(summary.monthly.len(), 12);
    let b = summary.recommended_boundaries().expect("boundaries");
    assert_eq!((b.morning_start(), b.evening_start()), (8, 15));
}

#[test]
fn full_run_writes_every_report() {
    let cfg = AnalysisConfig::baseline();
    let prepared = prepared_year(&cfg);
    let dir = tempfile::tempdir().expect("tempdir");
    let summary = Pipeline::new(&cfg, dir.path())
        .run(&prepared)
        .expect("run");

    assert!(summary.is_success(), "{summary}");
    assert_eq!(summary.completed.len(), 7);
    for file in [
        "energy_analysis.txt",
        "seasonal_storage.txt",
        "solar_windows.txt",
        "battery_sizing.txt",
        "battery_simulation.txt",
        "load_duration.txt",
        "c_rates.txt",
        "daily_energy.csv",
        "daily_requirements.csv",
        "trajectory_start_0.csv",
        "trajectory_start_50.csv",
        "trajectory_start_100.csv",
        "load_duration.csv",
    ] {
        assert!(dir.path().join(file).exists(), "{file} missing");
    }

    let trajectory = std::fs::read_to_string(dir.path().join("trajectory_start_50.csv"))
        .expect("trajectory");
    assert_eq!(trajectory.lines().count(), 365 * 24 + 1);

    let sizing = std::fs::read_to_string(dir.path().join("battery_sizing.txt"))
        .expect("sizing report");
    assert!(sizing.contains("Day period: 08:00-18:00"));
    assert!(sizing.contains("06:00-18:00"));

    // Nearest reference days simulated from 0%, 50% and 100% at the P90 capacity.
    assert!(sizing.contains("Empty by Morning"));
    for date in ["2023-06-21", "2023-12-21"] {
        let runs = sizing
            .lines()
            .filter(|l| l.contains(&format!("{date} from")))
            .count();
        assert_eq!(runs, 3, "{date}");
    }
    // Eight night hours at 800 W leave an empty-started winter battery at 200 Wh.
    let winter_from_empty = sizing
        .lines()
        .find(|l| l.starts_with("Winter 2023-12-21 from   0%"))
        .unwrap_or_default();
    assert!(winter_from_empty.ends_with(", empty by morning"), "{winter_from_empty}");
}

#[test]
fn seasonal_preset_runs_larger_battery() {
    let cfg = AnalysisConfig::seasonal();
    let prepared = prepared_year(&cfg);
    let dir = tempfile::tempdir().expect("tempdir");
    let summary = Pipeline::new(&cfg, dir.path()).run(&prepared).expect("run");
    assert!(summary.is_success(), "{summary}");
    for pct in [25, 50, 75] {
        let file = format!("trajectory_start_{pct}.csv");
        assert!(dir.path().join(&file).exists(), "{file} missing");
    }
}
