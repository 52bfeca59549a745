//! Time-series model: samples, cadence, energy conversion and groupings.

/// Calendar groupings (daily, monthly, seasonal).
pub mod aggregate;
/// Sample spacing detection.
pub mod cadence;
pub mod season;
pub mod types;

pub use aggregate::{DailyEnergy, MonthlyEnergy, SeasonSegment, SeasonTotals};
pub use cadence::{Cadence, CadenceReport};
pub use season::{Season, SeasonMap};
pub use types::{EnergyInterval, EnergyTotals, TimeSeriesSample};

/// Immutable energy view of a loaded series.
///
/// Built once per run; every scenario borrows it and derives its own
/// output vectors, so no analysis can observe another's intermediate state.
#[derive(Debug, Clone)]
pub struct EnergySeries {
    cadence: Cadence,
    intervals: Vec<EnergyInterval>,
}

impl EnergySeries {
    pub fn from_samples(samples: &[TimeSeriesSample], cadence: Cadence) -> Self {
        Self {
            cadence,
            intervals: aggregate::to_energy_intervals(samples, cadence),
        }
    }

    pub fn cadence(&self) -> Cadence {
        self.cadence
    }

    pub fn intervals(&self) -> &[EnergyInterval] {
        &self.intervals
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Signed net energy per interval (Wh).
    pub fn net_energy_wh(&self) -> Vec<f64> {
        self.intervals.iter().map(|i| i.net_wh).collect()
    }

    /// Signed net power per interval (W), recovered from energy.
    pub fn net_power_w(&self) -> Vec<f64> {
        let dt = self.cadence.hours();
        self.intervals.iter().map(|i| i.net_wh / dt).collect()
    }

    pub fn totals(&self) -> EnergyTotals {
        self.intervals.iter().collect()
    }

    pub fn daily(&self, expected_per_day: usize) -> Vec<DailyEnergy> {
        aggregate::group_by_day(&self.intervals, expected_per_day)
    }

    pub fn monthly(&self) -> Vec<MonthlyEnergy> {
        aggregate::group_by_month(&self.intervals)
    }

    pub fn seasonal(&self, seasons: &SeasonMap) -> Vec<SeasonTotals> {
        aggregate::group_by_season(&self.intervals, seasons)
    }

    /// Intervals falling on one calendar date.
    pub fn day(&self, date: chrono::NaiveDate) -> &[EnergyInterval] {
        let start = self.intervals.partition_point(|i| i.date() < date);
        let end = self.intervals.partition_point(|i| i.date() <= date);
        &self.intervals[start..end]
    }
}
