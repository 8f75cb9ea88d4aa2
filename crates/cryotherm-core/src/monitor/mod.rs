//! Measurement Loop
//!
//! A [`Monitor`] owns the probes, their sample histories and the conversion
//! registry. Each [`Monitor::tick`] reads one resistance per probe, converts
//! it and appends the result to that probe's history.

mod error;
mod probe;
mod samples;
mod scheduler;

pub use error::MonitorError;
pub use probe::{ProbeConfig, ProbeId};
pub use samples::{Sample, SampleBuffer, DEFAULT_BUFFER_LEN, MAX_BUFFER_LEN};
pub use scheduler::{run_periodic, time_window, PeriodicRun};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::conversion::{ProbeRegistry, ProbeType};
use crate::protocol::ResistanceSource;

/// Default sampling rate in Hz
pub const DEFAULT_SAMPLE_RATE_HZ: f64 = 1.0;

/// Runtime settings of the measurement loop
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonitorSettings {
    /// Samples kept per probe
    #[serde(default = "default_buffer_len")]
    pub buffer_len: usize,
    /// Ticks per second
    #[serde(default = "default_sample_rate_hz")]
    pub sample_rate_hz: f64,
}

fn default_buffer_len() -> usize {
    DEFAULT_BUFFER_LEN
}

fn default_sample_rate_hz() -> f64 {
    DEFAULT_SAMPLE_RATE_HZ
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            buffer_len: DEFAULT_BUFFER_LEN,
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
        }
    }
}

/// Check a requested buffer length
pub fn validate_buffer_len(len: usize) -> Result<usize, MonitorError> {
    if (1..=MAX_BUFFER_LEN).contains(&len) {
        Ok(len)
    } else {
        Err(MonitorError::InvalidBufferLength(len))
    }
}

/// What happened to one probe during a tick
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    /// Fresh reading, converted and stored
    Measured(Sample),
    /// No reading; the previous resistance was converted and stored again
    Reused(Sample),
    /// Nothing stored
    Skipped(MonitorError),
}

impl ProbeOutcome {
    /// Stored sample, if any
    pub fn sample(&self) -> Option<&Sample> {
        match self {
            ProbeOutcome::Measured(s) | ProbeOutcome::Reused(s) => Some(s),
            ProbeOutcome::Skipped(_) => None,
        }
    }
}

/// Result of one pass over every probe
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// Time stamped on the samples
    pub time: DateTime<Utc>,
    /// One entry per probe, in registration order
    pub outcomes: Vec<(ProbeId, ProbeOutcome)>,
    /// A full buffer length of ticks has elapsed since the last auto-save
    pub autosave_due: bool,
}

impl TickReport {
    /// Outcome for one probe
    pub fn outcome(&self, id: ProbeId) -> Option<&ProbeOutcome> {
        self.outcomes
            .iter()
            .find(|(probe, _)| *probe == id)
            .map(|(_, outcome)| outcome)
    }

    /// Probes for which nothing was stored
    pub fn failures(&self) -> impl Iterator<Item = (ProbeId, &MonitorError)> + '_ {
        self.outcomes.iter().filter_map(|(id, outcome)| match outcome {
            ProbeOutcome::Skipped(err) => Some((*id, err)),
            _ => None,
        })
    }
}

/// State of one registered probe
#[derive(Debug, Clone)]
pub struct ProbeState {
    id: ProbeId,
    config: ProbeConfig,
    samples: SampleBuffer,
    last: Option<Sample>,
}

impl ProbeState {
    pub fn id(&self) -> ProbeId {
        self.id
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    pub fn samples(&self) -> &SampleBuffer {
        &self.samples
    }

    /// Most recent stored sample
    pub fn last(&self) -> Option<&Sample> {
        self.last.as_ref()
    }
}

/// Probes, their histories and the conversion registry
#[derive(Debug)]
pub struct Monitor {
    registry: ProbeRegistry,
    settings: MonitorSettings,
    probes: Vec<ProbeState>,
    ticks_since_save: usize,
    started_at: Option<DateTime<Utc>>,
}

impl Monitor {
    /// Monitor with no probe
    ///
    /// The buffer length is checked here so that every probe history is
    /// valid from the start.
    pub fn new(registry: ProbeRegistry, settings: MonitorSettings) -> Result<Self, MonitorError> {
        validate_buffer_len(settings.buffer_len)?;
        Ok(Self {
            registry,
            settings,
            probes: Vec::new(),
            ticks_since_save: 0,
            started_at: None,
        })
    }

    /// Register a probe; its history starts empty
    pub fn add_probe(&mut self, config: ProbeConfig) -> ProbeId {
        let id = ProbeId::new();
        info!(probe = %id, name = %config.name, probe_type = %config.probe_type, "probe added");
        self.probes.push(ProbeState {
            id,
            config,
            samples: SampleBuffer::new(self.settings.buffer_len),
            last: None,
        });
        id
    }

    /// Forget a probe and its history
    pub fn remove_probe(&mut self, id: ProbeId) -> Result<ProbeConfig, MonitorError> {
        let idx = self
            .probes
            .iter()
            .position(|p| p.id == id)
            .ok_or(MonitorError::UnknownProbe(id))?;
        Ok(self.probes.remove(idx).config)
    }

    pub fn registry(&self) -> &ProbeRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    /// Registered probes, in registration order
    pub fn probes(&self) -> &[ProbeState] {
        &self.probes
    }

    /// One probe by id
    pub fn probe(&self, id: ProbeId) -> Result<&ProbeState, MonitorError> {
        self.probes
            .iter()
            .find(|p| p.id == id)
            .ok_or(MonitorError::UnknownProbe(id))
    }

    fn probe_mut(&mut self, id: ProbeId) -> Result<&mut ProbeState, MonitorError> {
        self.probes
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(MonitorError::UnknownProbe(id))
    }

    /// Time of the first tick
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Read, convert and store one sample per probe
    pub fn tick<S>(&mut self, source: &mut S, now: DateTime<Utc>) -> TickReport
    where
        S: ResistanceSource + ?Sized,
    {
        self.tick_until(source, now, || false)
    }

    /// [`Monitor::tick`], skipping the remaining probes once `stop` returns true
    pub fn tick_until<S, C>(&mut self, source: &mut S, now: DateTime<Utc>, stop: C) -> TickReport
    where
        S: ResistanceSource + ?Sized,
        C: Fn() -> bool,
    {
        let started_at = *self.started_at.get_or_insert(now);
        let time = epoch_seconds(now);
        let registry = &self.registry;
        let mut outcomes = Vec::with_capacity(self.probes.len());

        for probe in &mut self.probes {
            let outcome = if stop() {
                ProbeOutcome::Skipped(MonitorError::Interrupted(probe.id))
            } else {
                measure(registry, source, probe, time)
            };
            outcomes.push((probe.id, outcome));
        }

        self.ticks_since_save += 1;
        let autosave_due = self.ticks_since_save >= self.settings.buffer_len;
        if autosave_due {
            self.ticks_since_save = 0;
            debug!(since = %started_at, "auto-save due");
        }

        TickReport {
            time: now,
            outcomes,
            autosave_due,
        }
    }

    /// Change the calibration of a probe and convert its history again
    pub fn set_probe_type(&mut self, id: ProbeId, probe_type: ProbeType) -> Result<(), MonitorError> {
        let above = self.probe(id)?.config.above_transition;
        let inverter = self.registry.inverter(probe_type, above)?;
        let probe = self
            .probes
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(MonitorError::UnknownProbe(id))?;
        probe.config.probe_type = probe_type;
        probe.samples.reconvert(&inverter);
        probe.last = probe.samples.samples().last();
        info!(probe = %id, %probe_type, "probe type changed");
        Ok(())
    }

    /// Move a probe to the other branch of its curve and convert its history again
    pub fn set_regime_flag(&mut self, id: ProbeId, above_transition: bool) -> Result<(), MonitorError> {
        let probe_type = self.probe(id)?.config.probe_type;
        let inverter = self.registry.inverter(probe_type, above_transition)?;
        let probe = self
            .probes
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(MonitorError::UnknownProbe(id))?;
        probe.config.above_transition = above_transition;
        probe.samples.reconvert(&inverter);
        probe.last = probe.samples.samples().last();
        debug!(probe = %id, above_transition, "regime flag changed");
        Ok(())
    }

    /// Resize every probe history
    pub fn set_buffer_len(&mut self, len: usize) -> Result<(), MonitorError> {
        let len = validate_buffer_len(len)?;
        for probe in &mut self.probes {
            probe.samples.resize(len);
        }
        self.settings.buffer_len = len;
        Ok(())
    }

    /// Change the sampling rate used by [`run_periodic`] and [`time_window`]
    pub fn set_sample_rate(&mut self, hz: f64) -> Result<(), MonitorError> {
        if !(hz.is_finite() && hz > 0.0) {
            return Err(MonitorError::InvalidSampleRate(hz));
        }
        self.settings.sample_rate_hz = hz;
        Ok(())
    }

    /// Rename a probe
    pub fn rename_probe(&mut self, id: ProbeId, name: impl Into<String>) -> Result<(), MonitorError> {
        self.probe_mut(id)?.config.name = name.into();
        Ok(())
    }

    /// Point a probe at another bridge channel
    pub fn set_network(
        &mut self,
        id: ProbeId,
        address: impl Into<String>,
        channel: u8,
    ) -> Result<(), MonitorError> {
        let config = &mut self.probe_mut(id)?.config;
        config.address = address.into();
        config.channel = channel;
        Ok(())
    }
}

/// Read and store one sample for `probe`
fn measure<S>(registry: &ProbeRegistry, source: &mut S, probe: &mut ProbeState, time: f64) -> ProbeOutcome
where
    S: ResistanceSource + ?Sized,
{
    let id = probe.id;
    let (resistance, fresh) = match source.read_resistance(&probe.config) {
        Ok(r) => (r, true),
        Err(err) => {
            if err.is_no_reading() {
                debug!(probe = %id, "no reading");
            } else {
                warn!(probe = %id, error = %err, "resistance read failed");
            }
            match probe.last {
                Some(last) => (last.resistance, false),
                None => return ProbeOutcome::Skipped(MonitorError::NoPriorValue(id)),
            }
        }
    };

    let inverter = match registry.inverter(probe.config.probe_type, probe.config.above_transition) {
        Ok(inverter) => inverter,
        Err(err) => {
            warn!(probe = %id, error = %err, "cannot convert");
            return ProbeOutcome::Skipped(err.into());
        }
    };
    let sample = Sample {
        time,
        resistance,
        temperature: inverter.temperature_of(resistance),
    };
    probe.samples.push(sample);
    probe.last = Some(sample);

    if fresh {
        ProbeOutcome::Measured(sample)
    } else {
        ProbeOutcome::Reused(sample)
    }
}

/// Seconds since the epoch, millisecond resolution
pub fn epoch_seconds(time: DateTime<Utc>) -> f64 {
    time.timestamp_millis() as f64 / 1000.0
}
