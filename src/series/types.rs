//! Sample and interval records shared by every analysis.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

/// One validated reading from the source file.
///
/// # Sign Convention
/// Both power fields are non-negative after loading. The source encodes
/// production as negative power; the loader normalizes it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSeriesSample {
    /// Start of the interval (local site time, no zone).
    pub timestamp: NaiveDateTime,
    /// Solar production power (W, >= 0).
    pub production_w: f64,
    /// Site demand power (W, >= 0).
    pub demand_w: f64,
    /// Imbalance column from the source; carried through but unused by the core.
    pub imbalance_w: f64,
}

impl TimeSeriesSample {
    pub fn new(timestamp: NaiveDateTime, production_w: f64, demand_w: f64) -> Self {
        Self {
            timestamp,
            production_w: production_w.abs(),
            demand_w,
            imbalance_w: 0.0,
        }
    }

    /// Net power in battery convention (W; positive = surplus).
    pub fn net_w(&self) -> f64 {
        self.production_w - self.demand_w
    }

    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    /// Time of day as decimal hours (e.g. 07:45 -> 7.75).
    pub fn decimal_hour(&self) -> f64 {
        f64::from(self.timestamp.hour()) + f64::from(self.timestamp.minute()) / 60.0
    }
}

/// Per-interval energy derived from a [`TimeSeriesSample`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyInterval {
    pub timestamp: NaiveDateTime,
    /// Production energy over the interval (Wh).
    pub production_wh: f64,
    /// Demand energy over the interval (Wh).
    pub demand_wh: f64,
    /// `production_wh - demand_wh` (Wh; positive charges the battery).
    pub net_wh: f64,
}

impl EnergyInterval {
    /// Converts a power sample to energy over an interval of `dt_hours`.
    pub fn from_sample(sample: &TimeSeriesSample, dt_hours: f64) -> Self {
        let production_wh = sample.production_w * dt_hours;
        let demand_wh = sample.demand_w * dt_hours;
        Self {
            timestamp: sample.timestamp,
            production_wh,
            demand_wh,
            net_wh: production_wh - demand_wh,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    pub fn hour(&self) -> u32 {
        self.timestamp.hour()
    }

    pub fn month(&self) -> u32 {
        self.timestamp.month()
    }
}

/// Production and demand energy summed over some grouping.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnergyTotals {
    pub production_wh: f64,
    pub demand_wh: f64,
}

impl EnergyTotals {
    pub fn add_interval(&mut self, interval: &EnergyInterval) {
        self.production_wh += interval.production_wh;
        self.demand_wh += interval.demand_wh;
    }

    pub fn merge(&mut self, other: &EnergyTotals) {
        self.production_wh += other.production_wh;
        self.demand_wh += other.demand_wh;
    }

    /// Production minus demand (Wh).
    pub fn difference_wh(&self) -> f64 {
        self.production_wh - self.demand_wh
    }
}

impl<'a> FromIterator<&'a EnergyInterval> for EnergyTotals {
    fn from_iter<T: IntoIterator<Item = &'a EnergyInterval>>(iter: T) -> Self {
        let mut totals = Self::default();
        for interval in iter {
            totals.add_interval(interval);
        }
        totals
    }
}
