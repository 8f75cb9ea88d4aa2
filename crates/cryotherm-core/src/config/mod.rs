//! Monitor Configuration
//!
//! JSON file holding the probe list and the runtime settings, plus the
//! bridge address table.

mod error;
mod ip_table;

pub use error::ConfigError;
pub use ip_table::IpTable;

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::conversion::{ConversionSettings, ProbeRegistry, ProbeType};
use crate::datalog::SaveFormat;
use crate::monitor::{validate_buffer_len, Monitor, MonitorSettings, ProbeConfig, ProbeId};
use crate::protocol::MacrtConfig;

/// Conventional name of the address table file
pub const IP_TABLE_FILE: &str = "IPs_connection.txt";

/// Everything needed to start a monitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Probes, in display order. Addresses may be IP table names.
    #[serde(default = "default_probes")]
    pub probes: Vec<ProbeConfig>,

    /// Buffer length and sample rate
    #[serde(default)]
    pub monitor: MonitorSettings,

    /// Spline tolerance, fallback temperature and solver settings
    #[serde(default)]
    pub conversion: ConversionSettings,

    /// Bridge client settings
    #[serde(default)]
    pub macrt: MacrtConfig,

    /// Where save files go
    #[serde(default = "default_save_directory")]
    pub save_directory: PathBuf,

    /// Save file format
    #[serde(default)]
    pub save_format: SaveFormat,

    /// Save automatically after every full buffer of ticks
    #[serde(default)]
    pub autosave: bool,
}

/// The six thermometers of the dilution fridge
fn default_probes() -> Vec<ProbeConfig> {
    vec![
        ProbeConfig::new("Boite Mel", "IP1", 1, ProbeType::MobileBt),
        ProbeConfig::new("Bouilleur", "IP1", 2, ProbeType::MobileBt),
        ProbeConfig::new("Anneau 80mK", "IP1", 3, ProbeType::MobileBt),
        ProbeConfig::new("Etage   4 K", "IP3", 1, ProbeType::MobileHt),
        ProbeConfig::new("Etage  20 K", "IP3", 2, ProbeType::MobileHt),
        ProbeConfig::new("Etage 100 K", "IP3", 3, ProbeType::Pt100),
    ]
}

fn default_save_directory() -> PathBuf {
    PathBuf::from(".")
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            probes: default_probes(),
            monitor: MonitorSettings::default(),
            conversion: ConversionSettings::default(),
            macrt: MacrtConfig::default(),
            save_directory: default_save_directory(),
            save_format: SaveFormat::default(),
            autosave: false,
        }
    }
}

impl MonitorConfig {
    /// Load from a JSON file; missing fields take their defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: MonitorConfig = serde_json::from_str(&content)?;
        config.validate()?;
        info!(path = %path.as_ref().display(), probes = config.probes.len(), "configuration loaded");
        Ok(config)
    }

    /// Write as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Check the runtime settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_buffer_len(self.monitor.buffer_len)?;
        let hz = self.monitor.sample_rate_hz;
        if !(hz.is_finite() && hz > 0.0) {
            return Err(crate::monitor::MonitorError::InvalidSampleRate(hz).into());
        }
        Ok(())
    }

    /// Probes with IP table names replaced by addresses
    ///
    /// A name-like address (no dot) missing from the table is an error.
    pub fn resolved_probes(&self, table: &IpTable) -> Result<Vec<ProbeConfig>, ConfigError> {
        self.probes
            .iter()
            .map(|probe| {
                let address = table.resolve(&probe.address);
                if !address.contains('.') {
                    return Err(ConfigError::MissingAddress(probe.address.clone()));
                }
                Ok(ProbeConfig {
                    address: address.to_string(),
                    ..probe.clone()
                })
            })
            .collect()
    }

    /// Build the registry and the monitor, and register every probe
    pub fn build_monitor(&self, table: &IpTable) -> Result<(Monitor, Vec<ProbeId>), ConfigError> {
        self.validate()?;
        let probes = self.resolved_probes(table)?;
        let registry = ProbeRegistry::standard(&self.conversion)?;
        let mut monitor = Monitor::new(registry, self.monitor)?;
        let ids = probes.into_iter().map(|p| monitor.add_probe(p)).collect();
        Ok((monitor, ids))
    }
}
