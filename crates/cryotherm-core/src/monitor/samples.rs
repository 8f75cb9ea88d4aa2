//! Per-probe sample history

use serde::{Deserialize, Serialize};

use crate::buffer::RollingBuffer;
use crate::conversion::Inverter;

/// Default number of samples kept per probe
pub const DEFAULT_BUFFER_LEN: usize = 50;

/// Largest accepted buffer length
pub const MAX_BUFFER_LEN: usize = 100_000;

/// One measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Epoch time in seconds
    pub time: f64,
    /// Ohms
    pub resistance: f64,
    /// Kelvin
    pub temperature: f64,
}

/// Time, resistance and temperature histories of one probe
///
/// The three sequences always have the same length. Slots not filled yet
/// hold `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    times: RollingBuffer<Option<f64>>,
    resistances: RollingBuffer<Option<f64>>,
    temperatures: RollingBuffer<Option<f64>>,
}

impl SampleBuffer {
    /// Empty history of `len` slots
    pub fn new(len: usize) -> Self {
        Self {
            times: RollingBuffer::new(len, None),
            resistances: RollingBuffer::new(len, None),
            temperatures: RollingBuffer::new(len, None),
        }
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Number of slots holding a sample
    pub fn filled(&self) -> usize {
        self.times.iter().filter(|t| t.is_some()).count()
    }

    /// Append a sample, evicting the oldest slot
    pub fn push(&mut self, sample: Sample) {
        self.times.push(Some(sample.time));
        self.resistances.push(Some(sample.resistance));
        self.temperatures.push(Some(sample.temperature));
    }

    /// Change the number of slots, keeping the newest samples
    pub fn resize(&mut self, len: usize) {
        self.times.resize(len, None);
        self.resistances.resize(len, None);
        self.temperatures.resize(len, None);
    }

    pub fn times(&self) -> &RollingBuffer<Option<f64>> {
        &self.times
    }

    pub fn resistances(&self) -> &RollingBuffer<Option<f64>> {
        &self.resistances
    }

    pub fn temperatures(&self) -> &RollingBuffer<Option<f64>> {
        &self.temperatures
    }

    /// Slots from oldest to newest as `(time, resistance, temperature)`
    pub fn rows(&self) -> impl Iterator<Item = (Option<f64>, Option<f64>, Option<f64>)> + '_ {
        self.times
            .iter()
            .zip(self.resistances.iter())
            .zip(self.temperatures.iter())
            .map(|((t, r), k)| (*t, *r, *k))
    }

    /// Filled slots only, oldest first
    pub fn samples(&self) -> impl Iterator<Item = Sample> + '_ {
        self.rows().filter_map(|row| match row {
            (Some(time), Some(resistance), Some(temperature)) => Some(Sample {
                time,
                resistance,
                temperature,
            }),
            _ => None,
        })
    }

    /// Recompute every stored temperature from its resistance
    pub fn reconvert(&mut self, inverter: &Inverter<'_>) {
        for (temperature, resistance) in self.temperatures.iter_mut().zip(self.resistances.iter()) {
            if let Some(r) = resistance {
                *temperature = Some(inverter.temperature_of(*r));
            }
        }
    }
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_LEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(i: u32) -> Sample {
        Sample {
            time: f64::from(i),
            resistance: 100.0 + f64::from(i),
            temperature: 300.0,
        }
    }

    #[test]
    fn test_new_buffer_is_unfilled() {
        let buf = SampleBuffer::new(4);
        assert_eq!(buf.len(), 4);
        assert_eq!(buf.filled(), 0);
        assert!(buf.rows().all(|row| row == (None, None, None)));
    }

    #[test]
    fn test_push_and_grow_keep_alignment() {
        let mut buf = SampleBuffer::new(2);
        buf.push(sample(1));
        buf.push(sample(2));
        buf.push(sample(3));
        buf.resize(4);
        let rows: Vec<_> = buf.rows().collect();
        assert_eq!(rows[0], (None, None, None));
        assert_eq!(rows[3], (Some(3.0), Some(103.0), Some(300.0)));
        assert_eq!(buf.samples().count(), 2);
    }
}
