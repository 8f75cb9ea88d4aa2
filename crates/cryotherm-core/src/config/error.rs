//! Configuration errors

use thiserror::Error;

use crate::conversion::CalibrationError;
use crate::monitor::MonitorError;

/// Errors while loading or applying configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Malformed line {line} in IP table: '{content}'")]
    MalformedLine { line: usize, content: String },

    #[error("No address for '{0}' in IP table")]
    MissingAddress(String),

    #[error("Calibration error: {0}")]
    Calibration(#[from] CalibrationError),

    #[error("{0}")]
    Monitor(#[from] MonitorError),
}
