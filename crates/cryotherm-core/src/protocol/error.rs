//! Resistance polling errors

use thiserror::Error;

/// Why a resistance could not be read
#[derive(Error, Debug)]
pub enum PollError {
    /// The bridge did not answer in time, or the source has nothing to report
    #[error("No reading available")]
    NoReading,

    #[error("Invalid bridge address: '{0}'")]
    InvalidAddress(String),

    #[error("Invalid channel number: {0}")]
    InvalidChannel(u8),

    #[error("Malformed reply: '{0}'")]
    MalformedReply(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl PollError {
    /// Whether this is the ordinary "nothing this time" outcome
    pub fn is_no_reading(&self) -> bool {
        matches!(self, PollError::NoReading)
    }
}
