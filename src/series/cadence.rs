//! Sample spacing: configured or detected from the data.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::types::TimeSeriesSample;
use crate::error::{Result, SimError};

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Fixed spacing between consecutive samples.
///
/// # Examples
///
/// ```
/// use solar_storage_sim::series::Cadence;
///
/// let cadence = Cadence::from_minutes(15).unwrap();
/// assert_eq!(cadence.hours(), 0.25);
/// assert_eq!(cadence.intervals_per_day(), 96);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    minutes: u32,
}

impl Cadence {
    /// Creates a cadence; the interval must divide a day evenly.
    pub fn from_minutes(minutes: u32) -> Result<Self> {
        if minutes == 0 || minutes > MINUTES_PER_DAY || MINUTES_PER_DAY % minutes != 0 {
            return Err(SimError::invalid(
                "series.interval_minutes",
                format!("{minutes} does not divide a 24h day into whole intervals"),
            ));
        }
        Ok(Self { minutes })
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    /// Interval duration in hours (0.25 for 15-minute data).
    pub fn hours(&self) -> f64 {
        f64::from(self.minutes) / 60.0
    }

    pub fn intervals_per_day(&self) -> usize {
        (MINUTES_PER_DAY / self.minutes) as usize
    }

    /// Detects the dominant spacing of a chronologically sorted series.
    ///
    /// The most frequent positive gap wins (ties go to the shorter gap).
    /// Steps that differ from it are counted in the report and logged.
    pub fn detect(samples: &[TimeSeriesSample]) -> Result<CadenceReport> {
        if samples.len() < 2 {
            return Err(SimError::InsufficientData(format!(
                "cadence detection needs at least 2 samples, got {}",
                samples.len()
            )));
        }

        let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
        for pair in samples.windows(2) {
            let step = (pair[1].timestamp - pair[0].timestamp).num_minutes();
            *counts.entry(step).or_default() += 1;
        }

        let (dominant, _) = counts
            .iter()
            .filter(|(step, _)| **step > 0)
            .fold(None::<(i64, usize)>, |best, (&step, &n)| match best {
                Some((_, best_n)) if best_n >= n => best,
                _ => Some((step, n)),
            })
            .ok_or_else(|| {
                SimError::InsufficientData("no positive spacing between samples".to_owned())
            })?;

        let minutes = u32::try_from(dominant).map_err(|_| {
            SimError::InsufficientData(format!("sample spacing of {dominant} min is out of range"))
        })?;
        let cadence = Self::from_minutes(minutes)?;

        let mut gaps = 0;
        let mut irregular = 0;
        for (&step, &n) in &counts {
            if step == dominant {
                continue;
            }
            if step > dominant && step % dominant == 0 {
                gaps += n;
            } else {
                irregular += n;
            }
        }

        if gaps > 0 || irregular > 0 {
            warn!(
                cadence_min = minutes,
                gaps, irregular, "series spacing is not uniform"
            );
        } else {
            debug!(cadence_min = minutes, "uniform series spacing");
        }

        Ok(CadenceReport {
            cadence,
            gaps,
            irregular_steps: irregular,
        })
    }
}

/// Outcome of [`Cadence::detect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CadenceReport {
    pub cadence: Cadence,
    /// Steps spanning a whole multiple of the cadence (missing samples).
    pub gaps: usize,
    /// Steps that are not a multiple of the cadence.
    pub irregular_steps: usize,
}
