//! Simulated resistance source
//!
//! Generates the resistances of a cryostat cooling down, for running the
//! monitor without bridges. Each probe follows an exponential approach from
//! room temperature to the base temperature of its kind, converted to a
//! resistance through its forward curve, with some noise on top.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{PollError, ResistanceSource};
use crate::conversion::curves::ForwardCurve;
use crate::conversion::ProbeType;
use crate::monitor::ProbeConfig;

/// Starting temperature of every profile, in kelvin
const ROOM_TEMPERATURE: f64 = 300.0;

/// Cooling profile of one probe kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoolingProfile {
    /// Temperature reached at the end of the run
    pub base_temperature: f64,
    /// Reads needed to cover about 63% of the way down
    pub time_constant: f64,
}

impl CoolingProfile {
    /// Default profile for a probe type
    pub fn for_probe_type(probe_type: ProbeType) -> Self {
        let base_temperature = match probe_type {
            ProbeType::MobileBt | ProbeType::NicoBtCal | ProbeType::NicoBt => 0.05,
            ProbeType::MobileHt | ProbeType::MobileBm => 4.0,
            ProbeType::Pt100 => 80.0,
        };
        Self {
            base_temperature,
            time_constant: 200.0,
        }
    }

    /// Temperature after `step` reads
    pub fn temperature_at(&self, step: u64) -> f64 {
        let decay = (-(step as f64) / self.time_constant).exp();
        self.base_temperature + (ROOM_TEMPERATURE - self.base_temperature) * decay
    }
}

/// Resistance of a probe type at a temperature
///
/// Types without a forward curve get a plain decreasing law.
fn nominal_resistance(probe_type: ProbeType, temperature: f64) -> f64 {
    let curve = match probe_type {
        ProbeType::MobileBt => Some(ForwardCurve::mobile_bt()),
        ProbeType::MobileHt => Some(ForwardCurve::mobile_ht()),
        ProbeType::Pt100 => Some(ForwardCurve::Pt100(Default::default())),
        _ => None,
    };
    match curve {
        Some(curve) => curve.resistance_of(temperature),
        None => 1000.0 + 3000.0 / (1.0 + temperature),
    }
}

/// Seeded random resistance generator
pub struct SimulatedSource {
    rng: StdRng,
    /// Reads done so far, per bridge channel
    steps: HashMap<(String, u8), u64>,
    /// Relative amplitude of the noise
    noise: f64,
    /// Probability that a read yields no value
    dropout_rate: f64,
}

impl SimulatedSource {
    /// Source with a fixed seed, 0.1% noise and no dropouts
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            steps: HashMap::new(),
            noise: 1e-3,
            dropout_rate: 0.0,
        }
    }

    /// Source seeded from the OS
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            ..Self::new(0)
        }
    }

    /// Set the relative noise amplitude
    pub fn with_noise(mut self, noise: f64) -> Self {
        self.noise = noise.max(0.0);
        self
    }

    /// Set the probability of a missing reading
    pub fn with_dropout_rate(mut self, rate: f64) -> Self {
        self.dropout_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Reads done for a bridge channel
    pub fn steps(&self, address: &str, channel: u8) -> u64 {
        self.steps
            .get(&(address.to_string(), channel))
            .copied()
            .unwrap_or(0)
    }
}

impl ResistanceSource for SimulatedSource {
    fn read_resistance(&mut self, probe: &ProbeConfig) -> Result<f64, PollError> {
        if probe.channel == 0 {
            return Err(PollError::InvalidChannel(probe.channel));
        }
        let step = self
            .steps
            .entry((probe.address.clone(), probe.channel))
            .or_insert(0);
        let current = *step;
        *step += 1;

        if self.dropout_rate > 0.0 && self.rng.gen_bool(self.dropout_rate) {
            return Err(PollError::NoReading);
        }

        let temperature = CoolingProfile::for_probe_type(probe.probe_type).temperature_at(current);
        let resistance = nominal_resistance(probe.probe_type, temperature);
        let jitter = if self.noise > 0.0 {
            self.rng.gen_range(-self.noise..=self.noise)
        } else {
            0.0
        };
        Ok(resistance * (1.0 + jitter))
    }
}
