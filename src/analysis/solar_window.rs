//! Daily solar production windows and the day boundaries they imply.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use tracing::{info, warn};

use super::day_night::DayBoundaries;
use crate::error::{Result, SimError};
use crate::series::TimeSeriesSample;

/// First and last producing sample of one day, as decimal hours.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProductionWindow {
    pub date: NaiveDate,
    pub start_hour: f64,
    pub end_hour: f64,
}

impl ProductionWindow {
    pub fn duration_hours(&self) -> f64 {
        self.end_hour - self.start_hour
    }
}

/// Finds the producing window of one day's samples.
///
/// A sample is producing when its production strictly exceeds
/// `fraction * daily maximum`. Returns `None` when no sample qualifies,
/// which includes days with no production at all.
pub fn detect_producing_window(
    day_samples: &[TimeSeriesSample],
    fraction: f64,
) -> Option<ProductionWindow> {
    let first = day_samples.first()?;
    let daily_max = day_samples
        .iter()
        .map(|s| s.production_w)
        .fold(0.0_f64, f64::max);
    let threshold = daily_max * fraction;

    let mut producing = day_samples
        .iter()
        .filter(|s| s.production_w > threshold)
        .map(TimeSeriesSample::decimal_hour);
    let start = producing.next()?;
    let (start_hour, end_hour) = producing.fold((start, start), |(lo, hi), h| (lo.min(h), hi.max(h)));

    Some(ProductionWindow {
        date: first.date(),
        start_hour,
        end_hour,
    })
}

/// Producing windows for every complete day of a chronologically sorted series.
///
/// Days with a sample count other than `expected_per_day` are skipped, so a
/// series starting mid-day does not pull the mean window toward its first
/// sample.
pub fn production_windows(
    samples: &[TimeSeriesSample],
    fraction: f64,
    expected_per_day: usize,
) -> Vec<ProductionWindow> {
    samples
        .chunk_by(|a, b| a.date() == b.date())
        .filter(|day| {
            let complete = day.len() == expected_per_day;
            if !complete {
                warn!(
                    date = %day[0].date(),
                    samples = day.len(),
                    expected_per_day,
                    "incomplete day skipped for production windows"
                );
            }
            complete
        })
        .filter_map(|day| detect_producing_window(day, fraction))
        .collect()
}

/// Mean window over a set of days.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowMeans {
    pub start_hour: f64,
    pub end_hour: f64,
    pub duration_hours: f64,
    pub days: usize,
}

impl WindowMeans {
    fn of<'a>(windows: impl Iterator<Item = &'a ProductionWindow>) -> Option<Self> {
        let (mut start, mut end, mut days) = (0.0, 0.0, 0_usize);
        for w in windows {
            start += w.start_hour;
            end += w.end_hour;
            days += 1;
        }
        (days > 0).then(|| {
            let n = days as f64;
            Self {
                start_hour: start / n,
                end_hour: end / n,
                duration_hours: (end - start) / n,
                days,
            }
        })
    }
}

/// Overall and per-month window means.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSummary {
    pub overall: WindowMeans,
    /// Keyed by calendar month (1-12), months without windows omitted.
    pub monthly: BTreeMap<u32, WindowMeans>,
}

impl WindowSummary {
    /// Summarises per-day windows.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InsufficientData`] when no day had production.
    pub fn from_windows(windows: &[ProductionWindow]) -> Result<Self> {
        let overall = WindowMeans::of(windows.iter()).ok_or_else(|| {
            SimError::InsufficientData("no day with production above threshold".to_owned())
        })?;
        let monthly = (1..=12)
            .filter_map(|m| {
                WindowMeans::of(windows.iter().filter(|w| w.date.month() == m)).map(|s| (m, s))
            })
            .collect();
        Ok(Self { overall, monthly })
    }

    /// Mean start and end rounded to whole hours (ties to even).
    pub fn recommended_boundaries(&self) -> Result<DayBoundaries> {
        let morning = self.overall.start_hour.round_ties_even();
        let evening = self.overall.end_hour.round_ties_even();
        info!(morning, evening, "boundaries derived from production windows");
        DayBoundaries::new(morning as u32, evening as u32)
    }
}

/// Formats decimal hours as `HH:MM`, truncating minutes.
pub fn clock_time(decimal_hour: f64) -> String {
    let hours = decimal_hour.trunc();
    let minutes = ((decimal_hour - hours) * 60.0).trunc();
    format!("{:02}:{:02}", hours as u32, minutes as u32)
}

impl fmt::Display for WindowSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Days with production: {}", self.overall.days)?;
        writeln!(
            f,
            "Average start:    {} ({:.2} h)",
            clock_time(self.overall.start_hour),
            self.overall.start_hour
        )?;
        writeln!(
            f,
            "Average end:      {} ({:.2} h)",
            clock_time(self.overall.end_hour),
            self.overall.end_hour
        )?;
        write!(f, "Average duration: {:.2} h", self.overall.duration_hours)?;
        for (month, m) in &self.monthly {
            let name = NaiveDate::from_ymd_opt(2000, *month, 1)
                .map(|d| d.format("%B").to_string())
                .unwrap_or_default();
            write!(
                f,
                "\n{name:<10} start {} end {} duration {:.2} h",
                clock_time(m.start_hour),
                clock_time(m.end_hour),
                m.duration_hours
            )?;
        }
        Ok(())
    }
}
