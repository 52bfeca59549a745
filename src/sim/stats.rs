//! Post-hoc statistics computed from a state-of-charge trajectory.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;

use super::types::Trajectory;
use crate::error::{Result, SimError};
use crate::series::{EnergyInterval, Season, SeasonMap};

/// Daily-average charge levels used to classify days.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChargeThresholds {
    /// Days averaging strictly below this are near empty (%).
    pub near_empty_percent: f64,
    /// Days averaging strictly above this are near full (%).
    pub near_full_percent: f64,
    /// Inclusive band counted as "mid" (%).
    pub mid_band_percent: (f64, f64),
}

impl Default for ChargeThresholds {
    fn default() -> Self {
        Self {
            near_empty_percent: 5.0,
            near_full_percent: 95.0,
            mid_band_percent: (45.0, 55.0),
        }
    }
}

/// Mean state of charge over one calendar day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyCharge {
    pub date: NaiveDate,
    pub mean_percent: f64,
    pub mean_state_wh: f64,
    /// Net energy offered to the battery that day (Wh).
    pub net_wh: f64,
    /// Whether the day has the expected number of intervals.
    pub complete: bool,
}

/// Charge behaviour within one season.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonCharge {
    pub season: Season,
    pub mean_percent: f64,
    /// Mean net energy per interval scaled to a full day (Wh/day).
    pub mean_daily_net_wh: f64,
}

/// Aggregate statistics of one simulated trajectory.
#[derive(Debug, Clone)]
pub struct TrajectoryStats {
    pub capacity_wh: f64,
    pub initial_state_wh: f64,
    pub initial_percent: f64,
    pub final_state_wh: f64,
    pub final_percent: f64,
    pub min_state_wh: f64,
    pub max_state_wh: f64,
    /// Intervals with net energy > 0.
    pub charging_intervals: usize,
    /// Intervals with net energy < 0.
    pub discharging_intervals: usize,
    pub idle_intervals: usize,
    pub near_empty_days: usize,
    pub near_full_days: usize,
    pub mid_band_days: usize,
    pub thresholds: ChargeThresholds,
    /// Surplus discarded while full (Wh).
    pub overflow_wh: f64,
    /// Deficit left uncovered while empty (Wh).
    pub underflow_wh: f64,
    pub daily: Vec<DailyCharge>,
    pub seasons: Vec<SeasonCharge>,
}

impl TrajectoryStats {
    /// Computes statistics for `trajectory`, which must be aligned 1:1 with `intervals`.
    ///
    /// # Arguments
    ///
    /// * `intervals` - The energy intervals the trajectory was simulated from
    /// * `trajectory` - Simulated states
    /// * `thresholds` - Day classification levels
    /// * `seasons` - Month-to-season mapping for the seasonal breakdown
    /// * `intervals_per_day` - Scales per-interval means to per-day figures;
    ///   days with a different count are flagged and left out of the day counts
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InsufficientData`] for an empty trajectory or a
    /// length mismatch.
    pub fn compute(
        intervals: &[EnergyInterval],
        trajectory: &Trajectory,
        thresholds: ChargeThresholds,
        seasons: &SeasonMap,
        intervals_per_day: usize,
    ) -> Result<Self> {
        if trajectory.is_empty() {
            return Err(SimError::InsufficientData(
                "cannot summarise an empty trajectory".to_owned(),
            ));
        }
        if intervals.len() != trajectory.len() {
            return Err(SimError::InsufficientData(format!(
                "trajectory has {} points for {} intervals",
                trajectory.len(),
                intervals.len()
            )));
        }

        let config = trajectory.config;
        let mut min_state = f64::INFINITY;
        let mut max_state = f64::NEG_INFINITY;
        let mut charging = 0;
        let mut discharging = 0;
        let mut by_day: BTreeMap<NaiveDate, (f64, f64, f64, usize)> = BTreeMap::new();
        let mut by_season: BTreeMap<Season, (f64, f64, usize)> = BTreeMap::new();

        for (interval, point) in intervals.iter().zip(&trajectory.points) {
            min_state = min_state.min(point.state_wh);
            max_state = max_state.max(point.state_wh);
            if point.net_wh > 0.0 {
                charging += 1;
            } else if point.net_wh < 0.0 {
                discharging += 1;
            }

            let day = by_day.entry(interval.date()).or_default();
            day.0 += point.state_percent;
            day.1 += point.state_wh;
            day.2 += point.net_wh;
            day.3 += 1;

            let season = by_season
                .entry(seasons.season_of(interval.month()))
                .or_default();
            season.0 += point.state_percent;
            season.1 += point.net_wh;
            season.2 += 1;
        }

        let daily: Vec<DailyCharge> = by_day
            .into_iter()
            .map(|(date, (pct, wh, net, n))| DailyCharge {
                date,
                mean_percent: pct / n as f64,
                mean_state_wh: wh / n as f64,
                net_wh: net,
                complete: n == intervals_per_day,
            })
            .collect();

        let (lo, hi) = thresholds.mid_band_percent;
        let count_days = |pred: &dyn Fn(f64) -> bool| {
            daily
                .iter()
                .filter(|d| d.complete && pred(d.mean_percent))
                .count()
        };
        let near_empty_days = count_days(&|p| p < thresholds.near_empty_percent);
        let near_full_days = count_days(&|p| p > thresholds.near_full_percent);
        let mid_band_days = count_days(&|p| (lo..=hi).contains(&p));

        let seasons = by_season
            .into_iter()
            .map(|(season, (pct, net, n))| SeasonCharge {
                season,
                mean_percent: pct / n as f64,
                mean_daily_net_wh: net / n as f64 * intervals_per_day as f64,
            })
            .collect();

        let final_state_wh = trajectory.final_state_wh();
        Ok(Self {
            capacity_wh: config.capacity_wh(),
            initial_state_wh: config.initial_state_wh(),
            initial_percent: config.initial_percent(),
            final_state_wh,
            final_percent: config.percent_of(final_state_wh),
            min_state_wh: min_state,
            max_state_wh: max_state,
            charging_intervals: charging,
            discharging_intervals: discharging,
            idle_intervals: trajectory.len() - charging - discharging,
            near_empty_days,
            near_full_days,
            mid_band_days,
            thresholds,
            overflow_wh: trajectory.total_export_wh(),
            underflow_wh: trajectory.total_import_wh(),
            daily,
            seasons,
        })
    }

    pub fn min_percent(&self) -> f64 {
        self.min_state_wh / self.capacity_wh * 100.0
    }

    pub fn max_percent(&self) -> f64 {
        self.max_state_wh / self.capacity_wh * 100.0
    }
}

impl fmt::Display for TrajectoryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kwh = |wh: f64| wh / 1000.0;
        writeln!(f, "Battery capacity:      {:.2} kWh", kwh(self.capacity_wh))?;
        writeln!(
            f,
            "Initial charge:        {:.2} kWh ({:.2}%)",
            kwh(self.initial_state_wh),
            self.initial_percent
        )?;
        writeln!(
            f,
            "Final charge:          {:.2} kWh ({:.2}%)",
            kwh(self.final_state_wh),
            self.final_percent
        )?;
        writeln!(
            f,
            "Minimum charge:        {:.2} kWh ({:.2}%)",
            kwh(self.min_state_wh),
            self.min_percent()
        )?;
        writeln!(
            f,
            "Maximum charge:        {:.2} kWh ({:.2}%)",
            kwh(self.max_state_wh),
            self.max_percent()
        )?;
        writeln!(
            f,
            "Intervals:             {} charging, {} discharging, {} idle",
            self.charging_intervals, self.discharging_intervals, self.idle_intervals
        )?;
        writeln!(
            f,
            "Days near empty (<{}%): {}",
            self.thresholds.near_empty_percent, self.near_empty_days
        )?;
        writeln!(
            f,
            "Days near full (>{}%): {}",
            self.thresholds.near_full_percent, self.near_full_days
        )?;
        let (lo, hi) = self.thresholds.mid_band_percent;
        writeln!(f, "Days at {lo}-{hi}%:        {}", self.mid_band_days)?;
        writeln!(f, "Overflow (curtailed):  {:.2} kWh", kwh(self.overflow_wh))?;
        write!(f, "Underflow (unserved):  {:.2} kWh", kwh(self.underflow_wh))?;
        for s in &self.seasons {
            let direction = if s.mean_daily_net_wh > 0.0 {
                "net charging"
            } else {
                "net discharging"
            };
            write!(
                f,
                "\n{:<8} avg charge {:>6.2}%, avg flow {:>10.2} kWh/day ({direction})",
                s.season,
                s.mean_percent,
                kwh(s.mean_daily_net_wh)
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::battery::simulate_with;
    use crate::sim::types::BatteryConfig;

    fn interval(month: u32, day: u32, hour: u32, net_wh: f64) -> EnergyInterval {
        EnergyInterval {
            timestamp: NaiveDate::from_ymd_opt(2023, month, day)
                .and_then(|d| d.and_hms_opt(hour, 0, 0))
                .expect("timestamp"),
            production_wh: net_wh.max(0.0),
            demand_wh: (-net_wh).max(0.0),
            net_wh,
        }
    }

    fn run(intervals: &[EnergyInterval], capacity: f64, percent: f64) -> TrajectoryStats {
        let net: Vec<f64> = intervals.iter().map(|i| i.net_wh).collect();
        let config = BatteryConfig::new(capacity, percent).expect("config");
        let trajectory = simulate_with(&net, &config).expect("simulate");
        TrajectoryStats::compute(
            intervals,
            &trajectory,
            ChargeThresholds::default(),
            &SeasonMap::default(),
            2,
        )
        .expect("stats")
    }

    #[test]
    fn counts_charge_direction_and_extremes() {
        let intervals = vec![
            interval(6, 1, 10, 100.0),
            interval(6, 1, 20, 0.0),
            interval(6, 2, 10, -50.0),
            interval(6, 2, 20, -250.0),
        ];
        let stats = run(&intervals, 300.0, 0.0);
        assert_eq!(stats.charging_intervals, 1);
        assert_eq!(stats.discharging_intervals, 2);
        assert_eq!(stats.idle_intervals, 1);
        assert_eq!(stats.max_state_wh, 100.0);
        assert_eq!(stats.min_state_wh, 0.0);
        assert_eq!(stats.underflow_wh, 200.0);
    }

    #[test]
    fn classifies_days_by_mean_charge() {
        let intervals = vec![
            // Day 1 ends full: mean (100 + 100) / 2 = 100%.
            interval(7, 1, 10, 200.0),
            interval(7, 1, 20, 0.0),
            // Day 2 mean (50 + 50) / 2 = 50%.
            interval(7, 2, 10, -50.0),
            interval(7, 2, 20, 0.0),
            // Day 3 drains to empty.
            interval(7, 3, 10, -100.0),
            interval(7, 3, 20, 0.0),
        ];
        let stats = run(&intervals, 100.0, 0.0);
        assert_eq!(stats.near_full_days, 1);
        assert_eq!(stats.mid_band_days, 1);
        assert_eq!(stats.near_empty_days, 1);
        assert_eq!(stats.daily.len(), 3);
    }

    #[test]
    fn partial_days_are_flagged_and_not_classified() {
        // 24 full hours draining to empty, then one hour into the next day.
        let intervals: Vec<EnergyInterval> = (0..24)
            .map(|h| interval(6, 1, h, -10.0))
            .chain(std::iter::once(interval(6, 2, 0, -10.0)))
            .collect();
        let net: Vec<f64> = intervals.iter().map(|i| i.net_wh).collect();
        let config = BatteryConfig::new(1000.0, 0.0).expect("config");
        let trajectory = simulate_with(&net, &config).expect("simulate");
        let stats = TrajectoryStats::compute(
            &intervals,
            &trajectory,
            ChargeThresholds::default(),
            &SeasonMap::default(),
            24,
        )
        .expect("stats");

        assert_eq!(stats.daily.len(), 2);
        assert!(stats.daily[0].complete);
        assert!(!stats.daily[1].complete);
        assert_eq!(stats.near_empty_days, 1);
    }

    #[test]
    fn seasonal_flow_is_scaled_to_a_day() {
        let intervals = vec![interval(1, 1, 0, -10.0), interval(1, 1, 12, -30.0)];
        let stats = run(&intervals, 1000.0, 50.0);
        assert_eq!(stats.seasons.len(), 1);
        assert_eq!(stats.seasons[0].season, Season::Winter);
        // Mean -20 Wh per interval, 2 intervals per day.
        assert_eq!(stats.seasons[0].mean_daily_net_wh, -40.0);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let intervals = vec![interval(1, 1, 0, 1.0)];
        let config = BatteryConfig::new(10.0, 0.0).expect("config");
        let trajectory = simulate_with(&[1.0, 2.0], &config).expect("simulate");
        let result = TrajectoryStats::compute(
            &intervals,
            &trajectory,
            ChargeThresholds::default(),
            &SeasonMap::default(),
            96,
        );
        assert!(result.is_err());
    }

    #[test]
    fn display_lists_every_season_present() {
        let intervals = vec![interval(1, 1, 0, 5.0), interval(7, 1, 0, 5.0)];
        let text = run(&intervals, 100.0, 0.0).to_string();
        assert!(text.contains("Winter"));
        assert!(text.contains("Summer"));
        assert!(text.contains("net charging"));
    }
}
