//! Power-to-energy conversion and calendar groupings.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use tracing::warn;

use super::cadence::Cadence;
use super::season::{Season, SeasonMap};
use super::types::{EnergyInterval, EnergyTotals, TimeSeriesSample};

/// Converts every sample to energy over the cadence's interval duration.
pub fn to_energy_intervals(samples: &[TimeSeriesSample], cadence: Cadence) -> Vec<EnergyInterval> {
    let dt_hours = cadence.hours();
    samples
        .iter()
        .map(|s| EnergyInterval::from_sample(s, dt_hours))
        .collect()
}

/// Energy totals for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyEnergy {
    pub date: NaiveDate,
    pub totals: EnergyTotals,
    /// Number of intervals observed on this date.
    pub intervals: usize,
    /// Whether `intervals` equals the expected count per day.
    pub complete: bool,
}

/// Groups intervals by calendar date, sorted ascending.
///
/// Days with an interval count other than `expected_per_day` are flagged
/// incomplete and logged.
pub fn group_by_day(intervals: &[EnergyInterval], expected_per_day: usize) -> Vec<DailyEnergy> {
    let mut days: BTreeMap<NaiveDate, (EnergyTotals, usize)> = BTreeMap::new();
    for interval in intervals {
        let entry = days.entry(interval.date()).or_default();
        entry.0.add_interval(interval);
        entry.1 += 1;
    }

    days.into_iter()
        .map(|(date, (totals, count))| {
            let complete = count == expected_per_day;
            if !complete {
                warn!(%date, intervals = count, expected = expected_per_day, "incomplete day");
            }
            DailyEnergy {
                date,
                totals,
                intervals: count,
                complete,
            }
        })
        .collect()
}

/// Energy totals for one calendar month.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyEnergy {
    pub year: i32,
    pub month: u32,
    pub totals: EnergyTotals,
}

pub fn group_by_month(intervals: &[EnergyInterval]) -> Vec<MonthlyEnergy> {
    let mut months: BTreeMap<(i32, u32), EnergyTotals> = BTreeMap::new();
    for interval in intervals {
        let key = (interval.timestamp.year(), interval.month());
        months.entry(key).or_default().add_interval(interval);
    }
    months
        .into_iter()
        .map(|((year, month), totals)| MonthlyEnergy {
            year,
            month,
            totals,
        })
        .collect()
}

/// A maximal run of consecutive months in one calendar year sharing a season.
///
/// With the default map a calendar year yields two winter segments
/// (January-February and December).
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonSegment {
    pub season: Season,
    pub year: i32,
    pub first_month: u32,
    pub last_month: u32,
    pub totals: EnergyTotals,
}

/// Splits the series into contiguous per-year season segments.
pub fn season_segments(intervals: &[EnergyInterval], seasons: &SeasonMap) -> Vec<SeasonSegment> {
    let mut segments: Vec<SeasonSegment> = Vec::new();
    for month in group_by_month(intervals) {
        let season = seasons.season_of(month.month);
        match segments.last_mut() {
            Some(seg)
                if seg.season == season
                    && seg.year == month.year
                    && seg.last_month + 1 == month.month =>
            {
                seg.last_month = month.month;
                seg.totals.merge(&month.totals);
            }
            _ => segments.push(SeasonSegment {
                season,
                year: month.year,
                first_month: month.month,
                last_month: month.month,
                totals: month.totals,
            }),
        }
    }
    segments
}

/// Totals for one season across the whole series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonTotals {
    pub season: Season,
    pub totals: EnergyTotals,
}

/// Sums each season over the series, merging wrap-around segments.
///
/// Output follows [`Season::ALL`] order and omits seasons with no data.
pub fn group_by_season(intervals: &[EnergyInterval], seasons: &SeasonMap) -> Vec<SeasonTotals> {
    merge_segments(&season_segments(intervals, seasons))
}

/// Merges segments of the same season into one total per season.
pub fn merge_segments(segments: &[SeasonSegment]) -> Vec<SeasonTotals> {
    Season::ALL
        .iter()
        .filter_map(|&season| {
            let mut parts = segments.iter().filter(|s| s.season == season).peekable();
            parts.peek()?;
            let mut totals = EnergyTotals::default();
            for part in parts {
                totals.merge(&part.totals);
            }
            Some(SeasonTotals { season, totals })
        })
        .collect()
}
