//! Resistance Sources
//!
//! Reads raw resistances for configured probes, either from MACRT bridges
//! over UDP or from a simulator.

mod error;
pub mod macrt;
pub mod simulated;

pub use error::PollError;
pub use macrt::{MacrtClient, MacrtConfig};
pub use simulated::SimulatedSource;

use crate::monitor::ProbeConfig;

/// Local port the MACRT queries are sent from
pub const DEFAULT_QUERY_PORT: u16 = 8001;

/// Port the bridges answer on, and base of their listening ports
pub const MACRT_BASE_PORT: u16 = 12000;

/// Time to wait for a bridge reply, in milliseconds
pub const DEFAULT_REPLY_TIMEOUT_MS: u64 = 100;

/// Anything that can produce a resistance for a probe
pub trait ResistanceSource {
    /// Current resistance of `probe`, in ohms
    ///
    /// [`PollError::NoReading`] means no measurement this time; the caller
    /// decides whether to reuse an older value.
    fn read_resistance(&mut self, probe: &ProbeConfig) -> Result<f64, PollError>;
}

impl<S: ResistanceSource + ?Sized> ResistanceSource for &mut S {
    fn read_resistance(&mut self, probe: &ProbeConfig) -> Result<f64, PollError> {
        (**self).read_resistance(probe)
    }
}

impl<S: ResistanceSource + ?Sized> ResistanceSource for Box<S> {
    fn read_resistance(&mut self, probe: &ProbeConfig) -> Result<f64, PollError> {
        (**self).read_resistance(probe)
    }
}
