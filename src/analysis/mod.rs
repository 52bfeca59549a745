//! Analyses layered on the energy series: day/night partition, solar
//! windows, capacity recommendation and C-rates.

pub mod c_rate;
pub mod day_night;
pub mod sizing;
/// Solar onset/offset detection.
pub mod solar_window;

pub use day_night::{DailyRequirement, DayBoundaries, DayPeriod};
pub use sizing::{CapacityStats, SeasonalRecommendation};
