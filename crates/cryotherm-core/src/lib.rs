//! # Cryotherm Core Library
//!
//! Core functionality for monitoring the thermometers of a dilution
//! cryostat.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - Resistance to temperature conversion for the supported probe types
//! - Fixed-length rolling sample histories
//! - A measurement loop polling MACRT bridges (or a simulator)
//! - Tab-separated save files
//! - JSON configuration and bridge address tables
//!
//! ## Supported probes
//!
//! - Mobile BT (RuO2 + C100 + PT100)
//! - Mobile HT (C100 + PT100)
//! - PT100
//! - Mobile BM, NICO BT CAL, NICO BT
//!
//! ## Example
//!
//! ```rust,ignore
//! use cryotherm_core::prelude::*;
//!
//! let registry = ProbeRegistry::standard(&ConversionSettings::default())?;
//! let t = registry.convert_one(1234.5, "Mobile BT", false)?;
//!
//! let mut monitor = Monitor::new(registry, MonitorSettings::default())?;
//! let id = monitor.add_probe(ProbeConfig::new("Boite Mel", "192.168.1.101", 1, ProbeType::MobileBt));
//! let mut bridge = MacrtClient::bind(MacrtConfig::default())?;
//! let report = monitor.tick(&mut bridge, chrono::Utc::now());
//! ```

pub mod buffer;
pub mod config;
pub mod conversion;
pub mod datalog;
pub mod monitor;
pub mod protocol;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::buffer::RollingBuffer;
    pub use crate::config::{ConfigError, IpTable, MonitorConfig};
    pub use crate::conversion::{
        CalibrationSpec, ConversionError, ConversionSettings, ProbeRegistry, ProbeType,
    };
    pub use crate::datalog::{SaveKind, SaveWriter};
    pub use crate::monitor::{
        run_periodic, time_window, Monitor, MonitorError, MonitorSettings, PeriodicRun, ProbeConfig,
        ProbeId, TickReport,
    };
    pub use crate::protocol::{MacrtClient, MacrtConfig, PollError, ResistanceSource, SimulatedSource};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
