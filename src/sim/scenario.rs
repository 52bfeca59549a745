//! Named battery scenarios over a shared, read-only series.

use tracing::{info, warn};

use super::battery::{simulate_daily_reset, simulate_with};
use super::types::{BatteryConfig, Trajectory};
use crate::error::Result;
use crate::series::EnergySeries;

/// Whether the battery carries charge across midnight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResetPolicy {
    #[default]
    Continuous,
    /// Reseed to the initial charge at the start of every date.
    Daily,
}

/// One parameter set for the simulator.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioSpec {
    pub label: String,
    pub battery: BatteryConfig,
    pub reset: ResetPolicy,
}

impl ScenarioSpec {
    pub fn continuous(label: impl Into<String>, battery: BatteryConfig) -> Self {
        Self {
            label: label.into(),
            battery,
            reset: ResetPolicy::Continuous,
        }
    }

    pub fn daily_reset(label: impl Into<String>, battery: BatteryConfig) -> Self {
        Self {
            label: label.into(),
            battery,
            reset: ResetPolicy::Daily,
        }
    }

    /// Runs this scenario; the series is only borrowed.
    pub fn run(&self, series: &EnergySeries) -> Result<Trajectory> {
        match self.reset {
            ResetPolicy::Continuous => simulate_with(&series.net_energy_wh(), &self.battery),
            ResetPolicy::Daily => simulate_daily_reset(series.intervals(), &self.battery),
        }
    }
}

/// Result of one scenario, successful or not.
#[derive(Debug)]
pub struct ScenarioOutcome {
    pub label: String,
    pub result: Result<Trajectory>,
}

/// Runs every scenario independently; one failure does not stop the rest.
pub fn run_scenarios(series: &EnergySeries, specs: &[ScenarioSpec]) -> Vec<ScenarioOutcome> {
    specs
        .iter()
        .map(|spec| {
            let result = spec.run(series);
            match &result {
                Ok(t) => info!(
                    scenario = %spec.label,
                    final_wh = t.final_state_wh(),
                    "scenario complete"
                ),
                Err(e) => warn!(scenario = %spec.label, error = %e, "scenario failed"),
            }
            ScenarioOutcome {
                label: spec.label.clone(),
                result,
            }
        })
        .collect()
}
