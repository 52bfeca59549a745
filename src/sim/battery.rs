//! Lossless battery with hard capacity limits.
//!
//! The state after each interval is `clip(previous + net, 0, capacity)`.
//! Energy that would push the battery past either limit is reported as
//! export (overflow) or import (underflow) on the point, never stored.

use tracing::debug;

use super::types::{BatteryConfig, FirstInterval, SocPoint, Trajectory};
use crate::error::{Result, SimError};
use crate::series::EnergyInterval;

/// Lazily folds net energy into state-of-charge points.
///
/// Runs in constant memory, so callers that only need the final state or
/// a running statistic can stream arbitrarily long series. Inputs are not
/// validated; use [`simulate_with`] for checked runs.
pub fn soc_scan<I>(net_wh: I, config: BatteryConfig) -> impl Iterator<Item = SocPoint>
where
    I: IntoIterator<Item = f64>,
{
    let capacity = config.capacity_wh();
    let hold_first = config.first_interval() == FirstInterval::Hold;

    net_wh
        .into_iter()
        .enumerate()
        .scan(config.initial_state_wh(), move |state, (i, net)| {
            if hold_first && i == 0 {
                return Some(SocPoint {
                    net_wh: net,
                    state_wh: *state,
                    state_percent: config.percent_of(*state),
                    export_wh: net.max(0.0),
                    import_wh: (-net).max(0.0),
                });
            }

            let unclipped = *state + net;
            *state = unclipped.clamp(0.0, capacity);
            Some(SocPoint {
                net_wh: net,
                state_wh: *state,
                state_percent: config.percent_of(*state),
                export_wh: (unclipped - capacity).max(0.0),
                import_wh: (-unclipped).max(0.0),
            })
        })
}

/// Simulates one battery over a net-energy sequence.
///
/// Under the default [`FirstInterval::Apply`] policy the first point already
/// includes `net_wh[0]`, so `simulate(&[x], c, p)` returns `clip(seed + x)`
/// rather than the seed. Use [`FirstInterval::Hold`] with [`simulate_with`]
/// to report the seed at index 0.
///
/// # Arguments
///
/// * `net_wh` - Signed net energy per interval (Wh; positive charges)
/// * `capacity_wh` - Usable capacity (must be > 0)
/// * `initial_percent` - Starting charge (0-100)
///
/// # Errors
///
/// Returns [`SimError::InvalidConfig`] for a non-positive capacity or an
/// out-of-range percentage, and [`SimError::NonFiniteInput`] if any net
/// value is NaN or infinite.
///
/// # Examples
///
/// ```
/// use solar_storage_sim::sim::battery::simulate;
///
/// let t = simulate(&[100.0, 100.0, -50.0, -250.0], 300.0, 0.0).unwrap();
/// assert_eq!(t.states_wh(), vec![100.0, 200.0, 150.0, 0.0]);
///
/// // A single interval is applied, not held at the seed.
/// let one = simulate(&[50.0], 300.0, 0.0).unwrap();
/// assert_eq!(one.states_wh(), vec![50.0]);
/// ```
pub fn simulate(net_wh: &[f64], capacity_wh: f64, initial_percent: f64) -> Result<Trajectory> {
    let config = BatteryConfig::new(capacity_wh, initial_percent)?;
    simulate_with(net_wh, &config)
}

/// Simulates with a prebuilt configuration.
pub fn simulate_with(net_wh: &[f64], config: &BatteryConfig) -> Result<Trajectory> {
    check_finite(net_wh.iter().copied())?;
    let points: Vec<SocPoint> = soc_scan(net_wh.iter().copied(), *config).collect();
    debug!(
        capacity_wh = config.capacity_wh(),
        initial_percent = config.initial_percent(),
        intervals = points.len(),
        "battery simulated"
    );
    Ok(Trajectory {
        config: *config,
        points,
    })
}

/// Final stored energy without materializing the trajectory.
pub fn final_state_wh(net_wh: &[f64], config: &BatteryConfig) -> Result<f64> {
    check_finite(net_wh.iter().copied())?;
    Ok(soc_scan(net_wh.iter().copied(), *config)
        .last()
        .map_or(config.initial_state_wh(), |p| p.state_wh))
}

/// Simulates with the battery reseeded at the first interval of every date.
///
/// Models a battery that is reset to `initial_percent` each morning at
/// midnight, so no energy carries over between days. `intervals` must be
/// sorted by timestamp.
pub fn simulate_daily_reset(
    intervals: &[EnergyInterval],
    config: &BatteryConfig,
) -> Result<Trajectory> {
    check_finite(intervals.iter().map(|i| i.net_wh))?;
    let points: Vec<SocPoint> = intervals
        .chunk_by(|a, b| a.date() == b.date())
        .flat_map(|day| soc_scan(day.iter().map(|i| i.net_wh), *config))
        .collect();
    Ok(Trajectory {
        config: *config,
        points,
    })
}

fn check_finite(values: impl Iterator<Item = f64>) -> Result<()> {
    match values.enumerate().find(|(_, v)| !v.is_finite()) {
        Some((index, _)) => Err(SimError::NonFiniteInput { index }),
        None => Ok(()),
    }
}
