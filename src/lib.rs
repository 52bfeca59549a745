//! Battery state-of-charge simulation and storage sizing for solar sites.

pub mod analysis;
pub mod config;
pub mod error;
pub mod io;
/// Analysis run orchestration.
pub mod pipeline;
pub mod report;
pub mod series;
/// Battery simulator, trajectory statistics and grid exchange.
pub mod sim;

pub use error::{Result, SimError};
