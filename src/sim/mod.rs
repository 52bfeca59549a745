/// State-of-charge recurrence with capacity clipping.
pub mod battery;
/// Grid exchange and load-duration KPIs.
pub mod grid;
pub mod scenario;
pub mod stats;
pub mod types;

pub use battery::{simulate, simulate_with};
pub use types::{BatteryConfig, FirstInterval, SocPoint, Trajectory};
