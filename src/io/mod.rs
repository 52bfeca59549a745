//! File boundaries: raw/cleaned CSV input and CSV exports.

pub mod export;
pub mod loader;
