//! Capacity recommendation from per-day requirements and seasonal totals.

use std::fmt;

use chrono::NaiveDate;
use tracing::info;

use super::day_night::{self, DailyRequirement, DayBoundaries};
use crate::error::{Result, SimError};
use crate::series::{DailyEnergy, EnergyInterval, Season, SeasonTotals};
use crate::sim::{BatteryConfig, simulate_with};

/// Linear-interpolation percentile of an unsorted sample.
///
/// For rank `r = p/100 * (n-1)` the result interpolates between the
/// neighbouring order statistics. Returns `None` for an empty sample or a
/// `p` outside 0-100.
///
/// # Examples
///
/// ```
/// use solar_storage_sim::analysis::sizing::percentile;
///
/// let p90 = percentile(&[10.0, 20.0, 30.0, 40.0, 100.0], 90.0).unwrap();
/// assert!((p90 - 76.0).abs() < 1e-9);
/// ```
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=100.0).contains(&p) {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64))
}

/// Order statistics over per-day required capacity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapacityStats {
    pub mean_wh: f64,
    pub median_wh: f64,
    /// Percentile level used for `percentile_wh`.
    pub percentile: f64,
    pub percentile_wh: f64,
    pub max_wh: f64,
    pub days: usize,
}

/// Summarises per-day required capacities.
///
/// # Errors
///
/// Returns [`SimError::InsufficientData`] for an empty input and
/// [`SimError::InvalidConfig`] for a percentile outside 0-100.
pub fn recommend_daily(required_wh: &[f64], percentile_level: f64) -> Result<CapacityStats> {
    if required_wh.is_empty() {
        return Err(SimError::InsufficientData(
            "no complete days to size from".to_owned(),
        ));
    }
    let percentile_wh = percentile(required_wh, percentile_level).ok_or_else(|| {
        SimError::invalid(
            "sizing.percentile",
            format!("must be within 0-100, got {percentile_level}"),
        )
    })?;
    let median_wh = percentile(required_wh, 50.0).unwrap_or_default();
    let max_wh = required_wh.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean_wh = required_wh.iter().sum::<f64>() / required_wh.len() as f64;

    Ok(CapacityStats {
        mean_wh,
        median_wh,
        percentile: percentile_level,
        percentile_wh,
        max_wh,
        days: required_wh.len(),
    })
}

impl fmt::Display for CapacityStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Days considered:          {}", self.days)?;
        writeln!(f, "Mean required capacity:   {:.2} kWh", self.mean_wh / 1000.0)?;
        writeln!(f, "Median required capacity: {:.2} kWh", self.median_wh / 1000.0)?;
        writeln!(
            f,
            "P{} capacity:              {:.2} kWh",
            self.percentile,
            self.percentile_wh / 1000.0
        )?;
        write!(f, "Maximum required capacity: {:.2} kWh", self.max_wh / 1000.0)
    }
}

/// Seasonal storage sized to carry summer surplus into winter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonalRecommendation {
    /// `|winter production - winter demand|` (Wh).
    pub winter_deficit_wh: f64,
    /// `summer production - summer demand` (Wh, may be negative).
    pub summer_excess_wh: f64,
    /// `max(winter_deficit_wh, summer_excess_wh)`.
    pub required_wh: f64,
    pub buffer: f64,
    /// `required_wh * buffer`.
    pub recommended_wh: f64,
}

/// Recommends seasonal storage from per-season totals.
///
/// # Errors
///
/// Returns [`SimError::InsufficientData`] if winter or summer is missing and
/// [`SimError::InvalidConfig`] for a buffer below 1.
pub fn recommend_seasonal(totals: &[SeasonTotals], buffer: f64) -> Result<SeasonalRecommendation> {
    if !buffer.is_finite() || buffer < 1.0 {
        return Err(SimError::invalid(
            "sizing.seasonal_buffer",
            format!("must be a finite multiplier >= 1, got {buffer}"),
        ));
    }
    let difference = |season: Season| {
        totals
            .iter()
            .find(|t| t.season == season)
            .map(|t| t.totals.difference_wh())
            .ok_or_else(|| SimError::InsufficientData(format!("no {season} data in series")))
    };

    let winter_deficit_wh = difference(Season::Winter)?.abs();
    let summer_excess_wh = difference(Season::Summer)?;
    let required_wh = winter_deficit_wh.max(summer_excess_wh);
    let recommended_wh = required_wh * buffer;
    info!(
        required_kwh = required_wh / 1000.0,
        recommended_kwh = recommended_wh / 1000.0,
        "seasonal storage sized"
    );

    Ok(SeasonalRecommendation {
        winter_deficit_wh,
        summer_excess_wh,
        required_wh,
        buffer,
        recommended_wh,
    })
}

impl fmt::Display for SeasonalRecommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Winter deficit:   {:.2} kWh", self.winter_deficit_wh / 1000.0)?;
        writeln!(f, "Summer excess:    {:.2} kWh", self.summer_excess_wh / 1000.0)?;
        writeln!(f, "Required storage: {:.2} kWh", self.required_wh / 1000.0)?;
        write!(
            f,
            "Recommended:      {:.2} kWh (x{:.2} buffer)",
            self.recommended_wh / 1000.0,
            self.buffer
        )
    }
}

/// The `n` days with the largest requirement, largest first.
pub fn top_days(requirements: &[DailyRequirement], n: usize) -> Vec<DailyRequirement> {
    let mut sorted = requirements.to_vec();
    sorted.sort_by(|a, b| b.required_wh.total_cmp(&a.required_wh));
    sorted.truncate(n);
    sorted
}

/// Requirement of the day closest to `target`; earlier day wins a tie.
pub fn nearest_day(requirements: &[DailyRequirement], target: NaiveDate) -> Option<&DailyRequirement> {
    requirements
        .iter()
        .min_by_key(|r| (r.date - target).num_days().abs())
}

/// One reference day simulated at a candidate capacity.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceDayCheck {
    pub label: &'static str,
    pub date: NaiveDate,
    pub capacity_wh: f64,
    pub initial_percent: f64,
    /// Charge at the first interval of the morning hour, or at the end of
    /// the day when that hour is missing (%).
    pub morning_percent: f64,
    pub min_percent: f64,
    pub max_percent: f64,
    /// Morning charge is strictly below the near-empty level.
    pub empty_by_morning: bool,
}

/// Simulates one day's intervals and checks the battery is drained by morning.
///
/// Returns `Ok(None)` for a day without intervals.
///
/// # Arguments
///
/// * `label` - Name of the reference day (e.g. "Summer")
/// * `day` - The day's intervals, sorted by time
/// * `battery` - Capacity, starting charge and first-interval policy
/// * `morning_hour` - Hour whose first interval is read as the morning state
/// * `near_empty_percent` - Level the morning state must stay below
pub fn check_reference_day(
    label: &'static str,
    day: &[EnergyInterval],
    battery: &BatteryConfig,
    morning_hour: u32,
    near_empty_percent: f64,
) -> Result<Option<ReferenceDayCheck>> {
    let Some(first) = day.first() else {
        return Ok(None);
    };
    let net: Vec<f64> = day.iter().map(|i| i.net_wh).collect();
    let trajectory = simulate_with(&net, battery)?;
    let percents = trajectory.percents();
    let morning_percent = day
        .iter()
        .position(|i| i.hour() == morning_hour)
        .and_then(|idx| percents.get(idx))
        .or(percents.last())
        .copied()
        .unwrap_or(battery.initial_percent());

    let check = ReferenceDayCheck {
        label,
        date: first.date(),
        capacity_wh: battery.capacity_wh(),
        initial_percent: battery.initial_percent(),
        morning_percent,
        min_percent: trajectory.min_percent().unwrap_or(morning_percent),
        max_percent: trajectory.max_percent().unwrap_or(morning_percent),
        empty_by_morning: morning_percent < near_empty_percent,
    };
    info!(
        label,
        date = %check.date,
        initial_percent = check.initial_percent,
        morning_percent,
        empty_by_morning = check.empty_by_morning,
        "reference day simulated"
    );
    Ok(Some(check))
}

impl fmt::Display for ReferenceDayCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} from {:>3.0}%: morning {:>6.2}% (range {:.2}-{:.2}%), {}",
            self.label,
            self.date,
            self.initial_percent,
            self.morning_percent,
            self.min_percent,
            self.max_percent,
            if self.empty_by_morning {
                "empty by morning"
            } else {
                "not empty by morning"
            }
        )
    }
}

/// Daily-total extremes used alongside the capacity statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyDemandStats {
    pub max_demand_wh: f64,
    pub mean_demand_wh: f64,
    pub max_production_wh: f64,
    pub max_difference_wh: f64,
    pub min_difference_wh: f64,
}

impl DailyDemandStats {
    pub fn from_days(days: &[DailyEnergy]) -> Option<Self> {
        if days.is_empty() {
            return None;
        }
        let mut stats = Self {
            max_demand_wh: f64::NEG_INFINITY,
            mean_demand_wh: 0.0,
            max_production_wh: f64::NEG_INFINITY,
            max_difference_wh: f64::NEG_INFINITY,
            min_difference_wh: f64::INFINITY,
        };
        for day in days {
            let t = &day.totals;
            stats.max_demand_wh = stats.max_demand_wh.max(t.demand_wh);
            stats.mean_demand_wh += t.demand_wh;
            stats.max_production_wh = stats.max_production_wh.max(t.production_wh);
            stats.max_difference_wh = stats.max_difference_wh.max(t.difference_wh());
            stats.min_difference_wh = stats.min_difference_wh.min(t.difference_wh());
        }
        stats.mean_demand_wh /= days.len() as f64;
        Some(stats)
    }
}

impl fmt::Display for DailyDemandStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Maximum daily demand:     {:.2} kWh", self.max_demand_wh / 1000.0)?;
        writeln!(f, "Average daily demand:     {:.2} kWh", self.mean_demand_wh / 1000.0)?;
        writeln!(
            f,
            "Maximum daily production: {:.2} kWh",
            self.max_production_wh / 1000.0
        )?;
        writeln!(
            f,
            "Maximum daily difference: {:.2} kWh",
            self.max_difference_wh / 1000.0
        )?;
        write!(
            f,
            "Minimum daily difference: {:.2} kWh",
            self.min_difference_wh / 1000.0
        )
    }
}

/// Sizing outcome for one set of day boundaries.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundarySizing {
    pub label: String,
    pub boundaries: DayBoundaries,
    pub stats: CapacityStats,
}

/// Sizes the same series under several day/night boundaries.
///
/// Only complete days contribute.
pub fn compare_boundaries(
    intervals: &[EnergyInterval],
    candidates: &[(&str, DayBoundaries)],
    expected_per_day: usize,
    percentile_level: f64,
) -> Result<Vec<BoundarySizing>> {
    candidates
        .iter()
        .map(|&(label, boundaries)| {
            let days = day_night::complete_days(&day_night::required_capacity_per_day(
                intervals,
                boundaries,
                expected_per_day,
            ));
            let required: Vec<f64> = days.iter().map(|d| d.required_wh).collect();
            Ok(BoundarySizing {
                label: label.to_owned(),
                boundaries,
                stats: recommend_daily(&required, percentile_level)?,
            })
        })
        .collect()
}
