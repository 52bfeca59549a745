//! TOML-based analysis configuration and preset definitions.

use std::fmt;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::analysis::DayBoundaries;
use crate::error::SimError;
use crate::series::{Cadence, SeasonMap};
use crate::sim::stats::ChargeThresholds;
use crate::sim::{BatteryConfig, FirstInterval};

/// Top-level analysis configuration parsed from TOML.
///
/// All fields have defaults matching the baseline preset. Load from
/// TOML with [`AnalysisConfig::from_toml_file`] or use
/// [`AnalysisConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Sample spacing.
    #[serde(default)]
    pub series: SeriesConfig,
    /// Battery capacities and starting charge.
    #[serde(default)]
    pub battery: StorageConfig,
    /// Day/night split for sizing.
    #[serde(default)]
    pub day_night: DayNightConfig,
    #[serde(default)]
    pub sizing: SizingConfig,
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    /// Month-to-season mapping.
    #[serde(default)]
    pub seasons: SeasonConfig,
    /// Reference days for the sizing report.
    #[serde(default)]
    pub dates: ReferenceDates,
}

/// Sample spacing. `None` values are derived from the data.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeriesConfig {
    /// Minutes between samples; detected from timestamps when absent.
    pub interval_minutes: Option<u32>,
    /// Intervals in a complete day; derived from the cadence when absent.
    pub expected_intervals_per_day: Option<usize>,
}

/// Battery parameters for the daily and seasonal scenarios.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Daily-cycling battery capacity (Wh).
    pub capacity_wh: f64,
    /// Starting charge of the single-run simulation (%).
    pub initial_percent: f64,
    /// Starting charges compared in the scenario sweep (%).
    pub scenario_initial_percents: Vec<f64>,
    /// Seasonal battery capacity (Wh).
    pub seasonal_capacity_wh: f64,
    pub seasonal_initial_percent: f64,
    /// `"apply"` or `"hold"`.
    pub first_interval: FirstInterval,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            capacity_wh: 240_000.0,
            initial_percent: 0.0,
            scenario_initial_percents: vec![0.0, 50.0, 100.0],
            seasonal_capacity_wh: 40_000_000.0,
            seasonal_initial_percent: 50.0,
            first_interval: FirstInterval::Apply,
        }
    }
}

/// Where the day/night boundaries come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryMode {
    /// Use `morning_start_hour` / `evening_start_hour` as given.
    #[default]
    Fixed,
    /// Derive from mean solar production windows.
    Solar,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DayNightConfig {
    pub mode: BoundaryMode,
    /// First daytime hour (inclusive).
    pub morning_start_hour: u32,
    /// First night-time hour (inclusive).
    pub evening_start_hour: u32,
}

impl Default for DayNightConfig {
    fn default() -> Self {
        Self {
            mode: BoundaryMode::Fixed,
            morning_start_hour: 8,
            evening_start_hour: 18,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SizingConfig {
    /// Percentile of daily requirements used as the recommendation (0-100).
    pub percentile: f64,
    /// Multiplier applied to the seasonal requirement (>= 1).
    pub seasonal_buffer: f64,
    /// Days listed in the "highest requirement" table.
    pub top_days: usize,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            percentile: 90.0,
            seasonal_buffer: 1.10,
            top_days: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThresholdConfig {
    pub near_empty_percent: f64,
    pub near_full_percent: f64,
    /// Inclusive `[low, high]` band (%).
    pub mid_band_percent: [f64; 2],
    /// Fraction of the daily peak a sample must exceed to count as producing.
    pub onset_fraction: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            near_empty_percent: 5.0,
            near_full_percent: 95.0,
            mid_band_percent: [45.0, 55.0],
            onset_fraction: 0.05,
        }
    }
}

/// Calendar months (1-12) per season.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeasonConfig {
    pub winter: Vec<u32>,
    pub spring: Vec<u32>,
    pub summer: Vec<u32>,
    pub autumn: Vec<u32>,
}

impl Default for SeasonConfig {
    fn default() -> Self {
        Self {
            winter: vec![12, 1, 2],
            spring: vec![3, 4, 5],
            summer: vec![6, 7, 8],
            autumn: vec![9, 10, 11],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReferenceDates {
    pub summer_reference: NaiveDate,
    pub winter_reference: NaiveDate,
}

impl Default for ReferenceDates {
    fn default() -> Self {
        Self {
            summer_reference: NaiveDate::from_ymd_opt(2023, 6, 21).unwrap_or_default(),
            winter_reference: NaiveDate::from_ymd_opt(2023, 12, 21).unwrap_or_default(),
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"battery.capacity_wh"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl From<SimError> for ConfigError {
    fn from(err: SimError) -> Self {
        match err {
            SimError::InvalidConfig { field, message } => Self { field, message },
            other => Self {
                field: "config".to_owned(),
                message: other.to_string(),
            },
        }
    }
}

impl From<ConfigError> for SimError {
    fn from(err: ConfigError) -> Self {
        SimError::InvalidConfig {
            field: err.field,
            message: err.message,
        }
    }
}

impl AnalysisConfig {
    /// Returns the baseline configuration: 240 kWh daily battery, fixed 8-18 day.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Daily-cycling preset: boundaries derived from production, empty start.
    pub fn daily() -> Self {
        Self {
            battery: StorageConfig {
                scenario_initial_percents: vec![0.0],
                ..StorageConfig::default()
            },
            day_night: DayNightConfig {
                mode: BoundaryMode::Solar,
                ..DayNightConfig::default()
            },
            ..Self::default()
        }
    }

    /// Seasonal preset: the single-run battery is the 40 MWh store at 50%.
    pub fn seasonal() -> Self {
        Self {
            battery: StorageConfig {
                capacity_wh: 40_000_000.0,
                initial_percent: 50.0,
                scenario_initial_percents: vec![25.0, 50.0, 75.0],
                ..StorageConfig::default()
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "daily", "seasonal"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "daily" => Ok(Self::daily()),
            "seasonal" => Ok(Self::seasonal()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut check = |result: Result<(), SimError>| {
            if let Err(e) = result {
                errors.push(ConfigError::from(e));
            }
        };

        if let Some(minutes) = self.series.interval_minutes {
            check(Cadence::from_minutes(minutes).map(drop));
        }
        if self.series.expected_intervals_per_day == Some(0) {
            check(Err(SimError::invalid(
                "series.expected_intervals_per_day",
                "must be > 0",
            )));
        }

        let bat = &self.battery;
        check(BatteryConfig::new(bat.capacity_wh, bat.initial_percent).map(drop));
        for &p in &bat.scenario_initial_percents {
            if !(0.0..=100.0).contains(&p) {
                check(Err(SimError::invalid(
                    "battery.scenario_initial_percents",
                    format!("{p} is outside 0-100"),
                )));
            }
        }
        check(
            BatteryConfig::new(bat.seasonal_capacity_wh, bat.seasonal_initial_percent)
                .map(drop)
                .map_err(|e| match e {
                    SimError::InvalidConfig { field, message } => SimError::InvalidConfig {
                        field: field.replace("battery.", "battery.seasonal_"),
                        message,
                    },
                    other => other,
                }),
        );

        check(self.fixed_boundaries().map(drop));

        let sz = &self.sizing;
        if !(0.0..=100.0).contains(&sz.percentile) {
            check(Err(SimError::invalid(
                "sizing.percentile",
                "must be in [0, 100]",
            )));
        }
        if !sz.seasonal_buffer.is_finite() || sz.seasonal_buffer < 1.0 {
            check(Err(SimError::invalid(
                "sizing.seasonal_buffer",
                "must be a finite multiplier >= 1",
            )));
        }

        let th = &self.thresholds;
        let in_range = |v: f64| (0.0..=100.0).contains(&v);
        if !in_range(th.near_empty_percent) || !in_range(th.near_full_percent) {
            check(Err(SimError::invalid(
                "thresholds.near_empty_percent",
                "near-empty and near-full levels must be in [0, 100]",
            )));
        } else if th.near_empty_percent >= th.near_full_percent {
            check(Err(SimError::invalid(
                "thresholds.near_empty_percent",
                "must be < thresholds.near_full_percent",
            )));
        }
        let [lo, hi] = th.mid_band_percent;
        if !(in_range(lo) && in_range(hi) && lo <= hi) {
            check(Err(SimError::invalid(
                "thresholds.mid_band_percent",
                "must be an ordered pair within [0, 100]",
            )));
        }
        if !(0.0..1.0).contains(&th.onset_fraction) {
            check(Err(SimError::invalid(
                "thresholds.onset_fraction",
                "must be in [0, 1)",
            )));
        }

        check(self.season_map().map(drop));

        errors
    }

    /// Single-run battery.
    pub fn battery(&self) -> Result<BatteryConfig, SimError> {
        let b = &self.battery;
        Ok(BatteryConfig::new(b.capacity_wh, b.initial_percent)?
            .with_first_interval(b.first_interval))
    }

    /// Seasonal store used by the load-duration comparison.
    pub fn seasonal_battery(&self) -> Result<BatteryConfig, SimError> {
        let b = &self.battery;
        Ok(
            BatteryConfig::new(b.seasonal_capacity_wh, b.seasonal_initial_percent)?
                .with_first_interval(b.first_interval),
        )
    }

    /// One battery per configured starting charge, in order.
    pub fn scenario_batteries(&self) -> Result<Vec<BatteryConfig>, SimError> {
        let b = &self.battery;
        b.scenario_initial_percents
            .iter()
            .map(|&p| {
                Ok(BatteryConfig::new(b.capacity_wh, p)?.with_first_interval(b.first_interval))
            })
            .collect()
    }

    pub fn fixed_boundaries(&self) -> Result<DayBoundaries, SimError> {
        DayBoundaries::new(
            self.day_night.morning_start_hour,
            self.day_night.evening_start_hour,
        )
    }

    pub fn season_map(&self) -> Result<SeasonMap, SimError> {
        let s = &self.seasons;
        SeasonMap::from_lists(&s.winter, &s.spring, &s.summer, &s.autumn)
    }

    pub fn charge_thresholds(&self) -> ChargeThresholds {
        let th = &self.thresholds;
        ChargeThresholds {
            near_empty_percent: th.near_empty_percent,
            near_full_percent: th.near_full_percent,
            mid_band_percent: (th.mid_band_percent[0], th.mid_band_percent[1]),
        }
    }
}
