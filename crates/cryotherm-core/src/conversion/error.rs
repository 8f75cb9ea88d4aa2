//! Conversion errors

use thiserror::Error;

/// Errors that abort the conversion of a sample
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    #[error("Unknown probe type: '{0}'")]
    UnknownProbeType(String),
}

/// Why the secant iteration gave up
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum SolverFailure {
    #[error("no convergence after {iterations} iterations")]
    NotConverged { iterations: u32 },

    #[error("secant slope vanished at T={at}")]
    FlatSlope { at: f64 },

    #[error("iterate left the domain of the curve")]
    NonFinite,

    #[error("converged to non-physical temperature {root} K")]
    NonPhysical { root: f64 },
}

/// Root finding did not produce a temperature for a resistance
#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[error("Root finding failed for R={target} Ω from T0={guess} K: {reason}")]
pub struct RootFindingFailure {
    pub target: f64,
    pub guess: f64,
    pub reason: SolverFailure,
}

/// A calibration table that cannot be used
///
/// Raised when the table is built, never while converting samples.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    #[error("Calibration table '{0}' has no segment for the {1} regime")]
    EmptyRegime(String, &'static str),

    #[error("Segment {index} of '{table}' has invalid bounds [{lower}, {upper}]")]
    InvalidBounds {
        table: String,
        index: usize,
        lower: f64,
        upper: f64,
    },

    #[error("Gap of {width} Ω before segment {index} of '{table}'")]
    Gap {
        table: String,
        index: usize,
        width: f64,
    },

    #[error("Overlap of {width} Ω before segment {index} of '{table}'")]
    Overlap {
        table: String,
        index: usize,
        width: f64,
    },

    #[error("Non-finite coefficient in segment {index} of '{table}'")]
    NonFiniteCoefficient { table: String, index: usize },

    #[error("Invalid boundary tolerance: {0}")]
    InvalidTolerance(f64),
}
