//! Error types shared by the loader, aggregator and analyses.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("source file not found: {}", .0.display())]
    MissingSource(PathBuf),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid configuration: {field}: {message}")]
    InvalidConfig { field: String, message: String },

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("non-finite net energy at interval {index}")]
    NonFiniteInput { index: usize },
}

impl SimError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.to_owned(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
