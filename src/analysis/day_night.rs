//! Day/night partition and per-day shiftable energy.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use tracing::{debug, warn};

use crate::error::{Result, SimError};
use crate::series::EnergyInterval;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPeriod {
    Day,
    Night,
}

/// Hour-of-day window treated as daytime: `[morning_start, evening_start)`.
///
/// # Examples
///
/// ```
/// use solar_storage_sim::analysis::day_night::{DayBoundaries, DayPeriod};
///
/// let b = DayBoundaries::new(8, 18).unwrap();
/// assert_eq!(b.classify_hour(8), DayPeriod::Day);
/// assert_eq!(b.classify_hour(18), DayPeriod::Night);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayBoundaries {
    morning_start: u32,
    evening_start: u32,
}

impl DayBoundaries {
    /// Creates boundaries; requires `morning_start < evening_start <= 24`.
    pub fn new(morning_start: u32, evening_start: u32) -> Result<Self> {
        if morning_start > 23 {
            return Err(SimError::invalid(
                "day_night.morning_start_hour",
                format!("must be within 0-23, got {morning_start}"),
            ));
        }
        if evening_start > 24 {
            return Err(SimError::invalid(
                "day_night.evening_start_hour",
                format!("must be within 0-24, got {evening_start}"),
            ));
        }
        if morning_start >= evening_start {
            return Err(SimError::invalid(
                "day_night",
                format!("morning start {morning_start} must precede evening start {evening_start}"),
            ));
        }
        Ok(Self {
            morning_start,
            evening_start,
        })
    }

    pub fn morning_start(&self) -> u32 {
        self.morning_start
    }

    pub fn evening_start(&self) -> u32 {
        self.evening_start
    }

    pub fn classify_hour(&self, hour: u32) -> DayPeriod {
        if (self.morning_start..self.evening_start).contains(&hour) {
            DayPeriod::Day
        } else {
            DayPeriod::Night
        }
    }

    pub fn classify(&self, timestamp: NaiveDateTime) -> DayPeriod {
        self.classify_hour(timestamp.hour())
    }
}

impl fmt::Display for DayBoundaries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00-{:02}:00", self.morning_start, self.evening_start)
    }
}

/// Energy a battery could shift from day surplus to night deficit on one date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyRequirement {
    pub date: NaiveDate,
    /// `max(0, sum of daytime net energy)` (Wh).
    pub day_excess_wh: f64,
    /// `max(0, -sum of night-time net energy)` (Wh).
    pub night_deficit_wh: f64,
    /// `min(day_excess_wh, night_deficit_wh)` (Wh).
    pub required_wh: f64,
    pub intervals: usize,
    pub complete: bool,
}

/// Computes the shiftable energy for every date, sorted ascending.
///
/// Days whose interval count differs from `expected_per_day` are returned
/// with `complete = false`; callers decide whether to keep them.
pub fn required_capacity_per_day(
    intervals: &[EnergyInterval],
    boundaries: DayBoundaries,
    expected_per_day: usize,
) -> Vec<DailyRequirement> {
    let mut days: BTreeMap<NaiveDate, (f64, f64, usize)> = BTreeMap::new();
    for interval in intervals {
        let entry = days.entry(interval.date()).or_default();
        match boundaries.classify(interval.timestamp) {
            DayPeriod::Day => entry.0 += interval.net_wh,
            DayPeriod::Night => entry.1 += interval.net_wh,
        }
        entry.2 += 1;
    }

    let requirements: Vec<DailyRequirement> = days
        .into_iter()
        .map(|(date, (day_net, night_net, count))| {
            let day_excess_wh = day_net.max(0.0);
            let night_deficit_wh = (-night_net).max(0.0);
            let complete = count == expected_per_day;
            if !complete {
                warn!(%date, intervals = count, "partial day in sizing input");
            }
            DailyRequirement {
                date,
                day_excess_wh,
                night_deficit_wh,
                required_wh: day_excess_wh.min(night_deficit_wh),
                intervals: count,
                complete,
            }
        })
        .collect();

    debug!(days = requirements.len(), %boundaries, "daily requirements computed");
    requirements
}

/// Keeps only complete days.
pub fn complete_days(requirements: &[DailyRequirement]) -> Vec<DailyRequirement> {
    requirements.iter().filter(|r| r.complete).copied().collect()
}
