//! Battery parameters and trajectory records.

use serde::Deserialize;

use crate::error::{Result, SimError};

/// How the seed state relates to the first net-energy value.
///
/// `Apply` charges or discharges with the first interval like every other
/// one. `Hold` reports the seed unchanged at index 0 and starts applying
/// net energy from index 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FirstInterval {
    #[default]
    Apply,
    Hold,
}

/// Validated battery parameters for one run.
///
/// # Examples
///
/// ```
/// use solar_storage_sim::sim::types::BatteryConfig;
///
/// let cfg = BatteryConfig::new(300.0, 50.0).unwrap();
/// assert_eq!(cfg.initial_state_wh(), 150.0);
/// assert!(BatteryConfig::new(0.0, 50.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryConfig {
    capacity_wh: f64,
    initial_percent: f64,
    first_interval: FirstInterval,
}

impl BatteryConfig {
    /// Creates a battery configuration.
    ///
    /// # Arguments
    ///
    /// * `capacity_wh` - Usable capacity in Wh (must be finite and > 0)
    /// * `initial_percent` - Starting charge as a percentage of capacity (0-100)
    pub fn new(capacity_wh: f64, initial_percent: f64) -> Result<Self> {
        if !capacity_wh.is_finite() || capacity_wh <= 0.0 {
            return Err(SimError::invalid(
                "battery.capacity_wh",
                format!("must be a positive finite number, got {capacity_wh}"),
            ));
        }
        if !(0.0..=100.0).contains(&initial_percent) {
            return Err(SimError::invalid(
                "battery.initial_percent",
                format!("must be within 0-100, got {initial_percent}"),
            ));
        }
        Ok(Self {
            capacity_wh,
            initial_percent,
            first_interval: FirstInterval::default(),
        })
    }

    pub fn with_first_interval(mut self, policy: FirstInterval) -> Self {
        self.first_interval = policy;
        self
    }

    pub fn capacity_wh(&self) -> f64 {
        self.capacity_wh
    }

    pub fn initial_percent(&self) -> f64 {
        self.initial_percent
    }

    /// Seed energy: `capacity * percent / 100`.
    pub fn initial_state_wh(&self) -> f64 {
        self.capacity_wh * self.initial_percent / 100.0
    }

    pub fn first_interval(&self) -> FirstInterval {
        self.first_interval
    }

    pub fn percent_of(&self, state_wh: f64) -> f64 {
        state_wh / self.capacity_wh * 100.0
    }
}

/// Battery state after one interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SocPoint {
    /// Net energy offered to the battery this interval (Wh).
    pub net_wh: f64,
    /// Stored energy after clipping to `[0, capacity]` (Wh).
    pub state_wh: f64,
    pub state_percent: f64,
    /// Surplus the full battery could not absorb (Wh, >= 0).
    pub export_wh: f64,
    /// Deficit the empty battery could not cover (Wh, >= 0).
    pub import_wh: f64,
}

/// Full state-of-charge trajectory of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub config: BatteryConfig,
    pub points: Vec<SocPoint>,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn states_wh(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.state_wh).collect()
    }

    pub fn percents(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.state_percent).collect()
    }

    /// Last state, or the seed for an empty trajectory.
    pub fn final_state_wh(&self) -> f64 {
        self.points
            .last()
            .map_or(self.config.initial_state_wh(), |p| p.state_wh)
    }

    pub fn min_percent(&self) -> Option<f64> {
        self.points.iter().map(|p| p.state_percent).reduce(f64::min)
    }

    pub fn max_percent(&self) -> Option<f64> {
        self.points.iter().map(|p| p.state_percent).reduce(f64::max)
    }

    pub fn total_export_wh(&self) -> f64 {
        self.points.iter().map(|p| p.export_wh).sum()
    }

    pub fn total_import_wh(&self) -> f64 {
        self.points.iter().map(|p| p.import_wh).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_capacity() {
        assert!(BatteryConfig::new(0.0, 0.0).is_err());
        assert!(BatteryConfig::new(-5.0, 0.0).is_err());
        assert!(BatteryConfig::new(f64::NAN, 0.0).is_err());
        assert!(BatteryConfig::new(f64::INFINITY, 0.0).is_err());
    }

    #[test]
    fn rejects_percent_outside_range() {
        assert!(BatteryConfig::new(100.0, -1.0).is_err());
        assert!(BatteryConfig::new(100.0, 100.5).is_err());
        assert!(BatteryConfig::new(100.0, f64::NAN).is_err());
        assert!(BatteryConfig::new(100.0, 100.0).is_ok());
    }

    #[test]
    fn seed_state_scales_with_capacity() {
        let cfg = BatteryConfig::new(240_000.0, 25.0).expect("valid");
        assert_eq!(cfg.initial_state_wh(), 60_000.0);
        assert_eq!(cfg.percent_of(120_000.0), 50.0);
        assert_eq!(cfg.first_interval(), FirstInterval::Apply);
    }
}
