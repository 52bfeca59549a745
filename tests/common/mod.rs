//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Duration, NaiveDate, Timelike};

/// Flat site demand (W).
pub const DEMAND_W: f64 = 800.0;

/// Peak production (W) for a month: 1 kW in winter, 4 kW in summer,
/// 2.5 kW otherwise.
pub fn peak_production_w(month: u32) -> f64 {
    match month {
        12 | 1 | 2 => 1000.0,
        6..=8 => 4000.0,
        _ => 2500.0,
    }
}

/// Production (W) at a given hour: the monthly peak from 08:00 to 15:59.
pub fn production_w(month: u32, hour: u32) -> f64 {
    if (8..16).contains(&hour) {
        peak_production_w(month)
    } else {
        0.0
    }
}

/// Raw export text for `days` hourly days starting at `start`.
///
/// Production is written negated and two summary rows are appended, as
/// the meter export does.
pub fn raw_csv(start: NaiveDate, days: i64) -> String {
    let mut out = String::from("Time,Production,Demand,Imbalance\n");
    let Some(midnight) = start.and_hms_opt(0, 0, 0) else {
        return out;
    };
    for h in 0..days * 24 {
        let t = midnight + Duration::hours(h);
        let production = production_w(t.month(), t.hour());
        let _ = writeln!(
            out,
            "{},{},{},{}",
            t.format("%d/%m/%Y %H:%M"),
            -production,
            DEMAND_W,
            DEMAND_W - production
        );
    }
    out.push_str("Time Interval,60 min,,\n");
    out.push_str("Total Energy Imbalance,0,,\n");
    out
}

/// One full calendar year (2023) of hourly raw data.
pub fn raw_year() -> String {
    raw_csv(jan_first(), 365)
}

pub fn jan_first() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default()
}

/// Writes `contents` to `name` inside `dir`.
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("fixture should be writable");
    path
}
