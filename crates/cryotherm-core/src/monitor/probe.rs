//! Probe identity and configuration

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::conversion::ProbeType;

/// Identifier handed out when a probe is registered
///
/// Unique for the lifetime of the process and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProbeId(Uuid);

impl ProbeId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ProbeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Settings of one thermometer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Name shown to the user and written in save files
    pub name: String,
    /// IPv4 address of the MACRT bridge
    pub address: String,
    /// Channel on the bridge, starting at 1
    pub channel: u8,
    /// Calibration to apply
    pub probe_type: ProbeType,
    /// Probe is above the 70 K transition (Mobile BT / Mobile HT only)
    #[serde(default)]
    pub above_transition: bool,
}

impl ProbeConfig {
    /// New probe on the cold branch
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        channel: u8,
        probe_type: ProbeType,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            channel,
            probe_type,
            above_transition: false,
        }
    }

    /// Set the regime flag
    pub fn above_transition(mut self, above: bool) -> Self {
        self.above_transition = above;
        self
    }

    /// Name with spaces replaced, as used in save file headers
    pub fn column_name(&self) -> String {
        self.name.replace(' ', "_")
    }
}
