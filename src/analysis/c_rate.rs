//! Charge/discharge rate a battery would need to follow the net power.

use std::fmt;

use super::sizing::percentile;
use crate::error::{Result, SimError};

/// Percentile levels reported for C-rates.
pub const C_RATE_PERCENTILES: [f64; 5] = [50.0, 75.0, 90.0, 95.0, 99.0];

/// Hours to fully charge or discharge at rate `c`; `None` at zero.
pub fn hours_to_full(c_rate: f64) -> Option<f64> {
    (c_rate > 0.0 && c_rate.is_finite()).then(|| 1.0 / c_rate)
}

/// C-rate distribution for one battery capacity.
#[derive(Debug, Clone, PartialEq)]
pub struct CRateStats {
    pub label: String,
    pub capacity_wh: f64,
    pub max: f64,
    pub mean: f64,
    /// `(level, value)` pairs for [`C_RATE_PERCENTILES`].
    pub percentiles: Vec<(f64, f64)>,
}

impl CRateStats {
    /// Computes `|net power| / capacity` per interval and summarises it.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidConfig`] for a non-positive capacity and
    /// [`SimError::InsufficientData`] for an empty series.
    pub fn compute(label: impl Into<String>, net_power_w: &[f64], capacity_wh: f64) -> Result<Self> {
        if !capacity_wh.is_finite() || capacity_wh <= 0.0 {
            return Err(SimError::invalid(
                "battery.capacity_wh",
                format!("must be a positive finite number, got {capacity_wh}"),
            ));
        }
        if net_power_w.is_empty() {
            return Err(SimError::InsufficientData(
                "no intervals for C-rate analysis".to_owned(),
            ));
        }

        let rates: Vec<f64> = net_power_w.iter().map(|p| p.abs() / capacity_wh).collect();
        let max = rates.iter().copied().fold(0.0, f64::max);
        let mean = rates.iter().sum::<f64>() / rates.len() as f64;
        let percentiles = C_RATE_PERCENTILES
            .iter()
            .filter_map(|&p| percentile(&rates, p).map(|v| (p, v)))
            .collect();

        Ok(Self {
            label: label.into(),
            capacity_wh,
            max,
            mean,
            percentiles,
        })
    }
}

fn fmt_hours(c_rate: f64) -> String {
    hours_to_full(c_rate).map_or_else(|| "undefined".to_owned(), |h| format!("{h:.2} h"))
}

impl fmt::Display for CRateStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({:.2} kWh):", self.label, self.capacity_wh / 1000.0)?;
        writeln!(
            f,
            "  Maximum C-rate: {:.4}C (full charge/discharge in {})",
            self.max,
            fmt_hours(self.max)
        )?;
        write!(
            f,
            "  Average C-rate: {:.4}C (full charge/discharge in {})",
            self.mean,
            fmt_hours(self.mean)
        )?;
        for (p, v) in &self.percentiles {
            write!(f, "\n  P{p:<3} {v:.4}C ({})", fmt_hours(*v))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hours_to_full_is_undefined_at_zero() {
        assert_eq!(hours_to_full(0.0), None);
        assert_eq!(hours_to_full(0.5), Some(2.0));
    }

    #[test]
    fn rates_use_absolute_power() {
        let stats = CRateStats::compute("daily", &[-500.0, 250.0, 0.0, 1000.0], 1000.0)
            .expect("stats");
        assert_eq!(stats.max, 1.0);
        assert_eq!(stats.mean, 0.4375);
        assert_eq!(stats.percentiles.len(), 5);
        assert_eq!(stats.percentiles[0], (50.0, 0.375));
    }

    #[test]
    fn all_zero_power_reports_undefined_hours() {
        let stats = CRateStats::compute("idle", &[0.0, 0.0], 100.0).expect("stats");
        assert_eq!(stats.max, 0.0);
        assert!(stats.to_string().contains("undefined"));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(CRateStats::compute("x", &[1.0], 0.0).is_err());
        assert!(CRateStats::compute("x", &[], 10.0).is_err());
    }
}
