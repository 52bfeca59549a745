//! Grid exchange derived from battery overflow and underflow.
//!
//! Residual load follows the load convention: positive is import from the
//! grid, negative is export.

use std::fmt;

use super::types::Trajectory;
use crate::series::{Cadence, EnergyTotals};

/// Residual grid load per interval with no storage (W).
pub fn residual_without_battery(net_wh: &[f64], cadence: Cadence) -> Vec<f64> {
    let dt = cadence.hours();
    net_wh.iter().map(|net| -net / dt).collect()
}

/// Residual grid load per interval left over by a battery (W).
pub fn residual_with_battery(trajectory: &Trajectory, cadence: Cadence) -> Vec<f64> {
    let dt = cadence.hours();
    trajectory
        .points
        .iter()
        .map(|p| (p.import_wh - p.export_wh) / dt)
        .collect()
}

/// Residual load sorted descending (load-duration curve).
pub fn duration_curve(residual_w: &[f64]) -> Vec<f64> {
    let mut sorted = residual_w.to_vec();
    sorted.sort_by(|a, b| b.total_cmp(a));
    sorted
}

/// Grid KPIs for one storage scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct GridKpis {
    pub label: String,
    /// Largest import (W, >= 0).
    pub peak_import_w: f64,
    /// Largest export magnitude (W, >= 0).
    pub peak_export_w: f64,
    pub import_wh: f64,
    pub export_wh: f64,
    /// Hours with a positive residual load.
    pub grid_dependency_hours: f64,
    /// Share of demand met locally; `None` without demand.
    pub self_sufficiency_percent: Option<f64>,
    /// Share of production used locally; `None` without production.
    pub self_consumption_percent: Option<f64>,
}

impl GridKpis {
    /// Computes KPIs from residual load.
    ///
    /// # Arguments
    ///
    /// * `label` - Scenario name used in reports
    /// * `residual_w` - Residual load per interval (W, positive = import)
    /// * `cadence` - Interval spacing
    /// * `totals` - Production and demand over the same intervals
    pub fn from_residual(
        label: impl Into<String>,
        residual_w: &[f64],
        cadence: Cadence,
        totals: &EnergyTotals,
    ) -> Self {
        let dt = cadence.hours();
        let mut peak_import = 0.0_f64;
        let mut peak_export = 0.0_f64;
        let mut import_wh = 0.0;
        let mut export_wh = 0.0;
        let mut import_intervals = 0_usize;

        for &load in residual_w {
            peak_import = peak_import.max(load);
            peak_export = peak_export.max(-load);
            if load > 0.0 {
                import_wh += load * dt;
                import_intervals += 1;
            } else if load < 0.0 {
                export_wh -= load * dt;
            }
        }

        let ratio = |part: f64, whole: f64| (whole > 0.0).then(|| (1.0 - part / whole) * 100.0);

        Self {
            label: label.into(),
            peak_import_w: peak_import,
            peak_export_w: peak_export,
            import_wh,
            export_wh,
            grid_dependency_hours: import_intervals as f64 * dt,
            self_sufficiency_percent: ratio(import_wh, totals.demand_wh),
            self_consumption_percent: ratio(export_wh, totals.production_wh),
        }
    }
}

/// Formats an optional percentage, printing `undefined` for `None`.
pub(crate) fn fmt_percent(value: Option<f64>) -> String {
    value.map_or_else(|| "undefined".to_owned(), |v| format!("{v:.1}"))
}

impl fmt::Display for GridKpis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- {} ---", self.label)?;
        writeln!(f, "Peak import:        {:.1} kW", self.peak_import_w / 1000.0)?;
        writeln!(f, "Peak export:        {:.1} kW", self.peak_export_w / 1000.0)?;
        writeln!(f, "Annual import:      {:.2} MWh", self.import_wh / 1e6)?;
        writeln!(f, "Annual export:      {:.2} MWh", self.export_wh / 1e6)?;
        writeln!(f, "Grid dependency:    {:.1} h", self.grid_dependency_hours)?;
        writeln!(
            f,
            "Self-sufficiency:   {}%",
            fmt_percent(self.self_sufficiency_percent)
        )?;
        write!(
            f,
            "Self-consumption:   {}%",
            fmt_percent(self.self_consumption_percent)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::battery::simulate;

    fn hourly() -> Cadence {
        Cadence::from_minutes(60).expect("cadence")
    }

    #[test]
    fn no_battery_residual_is_negated_net_power() {
        let quarter = Cadence::from_minutes(15).expect("cadence");
        let residual = residual_without_battery(&[25.0, -50.0], quarter);
        assert_eq!(residual, vec![-100.0, 200.0]);
    }

    #[test]
    fn battery_residual_only_carries_clipped_energy() {
        let t = simulate(&[100.0, 100.0, -50.0, -250.0], 300.0, 0.0).expect("simulate");
        let residual = residual_with_battery(&t, hourly());
        assert_eq!(residual, vec![0.0, 0.0, 0.0, 100.0]);
    }

    #[test]
    fn duration_curve_sorts_descending() {
        assert_eq!(duration_curve(&[1.0, -3.0, 5.0]), vec![5.0, 1.0, -3.0]);
    }

    #[test]
    fn kpis_from_residual() {
        let totals = EnergyTotals {
            production_wh: 400.0,
            demand_wh: 500.0,
        };
        let kpis = GridKpis::from_residual("none", &[300.0, -100.0, 0.0, 200.0], hourly(), &totals);
        assert_eq!(kpis.peak_import_w, 300.0);
        assert_eq!(kpis.peak_export_w, 100.0);
        assert_eq!(kpis.import_wh, 500.0);
        assert_eq!(kpis.export_wh, 100.0);
        assert_eq!(kpis.grid_dependency_hours, 2.0);
        assert_eq!(kpis.self_sufficiency_percent, Some(0.0));
        assert_eq!(kpis.self_consumption_percent, Some(75.0));
    }

    #[test]
    fn ratios_are_undefined_without_production() {
        let totals = EnergyTotals {
            production_wh: 0.0,
            demand_wh: 100.0,
        };
        let kpis = GridKpis::from_residual("night", &[100.0], hourly(), &totals);
        assert_eq!(kpis.self_consumption_percent, None);
        assert!(kpis.to_string().contains("undefined"));
    }
}
