//! Monitor errors

use thiserror::Error;

use super::{ProbeId, MAX_BUFFER_LEN};
use crate::conversion::ConversionError;

/// Errors from the measurement loop and its runtime settings
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MonitorError {
    #[error("Unknown probe: {0}")]
    UnknownProbe(ProbeId),

    #[error("No reading and no previous value for probe {0}")]
    NoPriorValue(ProbeId),

    #[error("Invalid buffer length {0}: must be between 1 and {max}", max = MAX_BUFFER_LEN)]
    InvalidBufferLength(usize),

    #[error("Invalid sample rate: {0} Hz")]
    InvalidSampleRate(f64),

    #[error("Measurement of probe {0} interrupted")]
    Interrupted(ProbeId),

    #[error("Measurement task failed: {0}")]
    TaskFailed(String),

    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),
}
