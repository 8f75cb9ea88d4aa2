//! Calibration curves
//!
//! Forward curves give the resistance of a sensor material (or of a probe
//! built from several materials) at a temperature:
//! - PT100: platinum, cubic fit
//! - C100: carbon, saturates at 1 MΩ below 1 K
//! - RuO2: ruthenium oxide, stretched exponential
//! - Mobile BT: C100 ∥ RuO2, in series with a PT100
//! - Mobile HT: weighted C100 in series with a PT100
//!
//! The closed-form inverses at the bottom of this module are the probe
//! formulas that need no fitting (PT100, C100, Mobile BM, NICO).
//!
//! All temperatures are in kelvin and all resistances in ohms.

use serde::{Deserialize, Serialize};

/// Resistance reported by a carbon sensor below its valid range (1 K)
pub const C100_SATURATION_OHMS: f64 = 1e6;

/// Temperature reported by the C100 inverse at or above saturation
pub const C100_SATURATION_KELVIN: f64 = 0.7651522;

/// Weight of the carbon element in the Mobile HT probe
pub const MOBILE_HT_CARBON_WEIGHT: f64 = 1.01625;

/// Platinum resistance thermometer, `R = a·T³ + b·T² + c·T + d`
///
/// Valid over the whole temperature range, although the fit goes negative
/// below about 30 K.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pt100Curve {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl Default for Pt100Curve {
    fn default() -> Self {
        Self {
            a: 6.690566222875814e-9,
            b: -6.954505159584381e-5,
            c: 0.4291105897341029,
            d: -13.360797686195307,
        }
    }
}

impl Pt100Curve {
    /// Resistance at `temperature`
    pub fn resistance_of(&self, temperature: f64) -> f64 {
        let t = temperature;
        ((self.a * t + self.b) * t + self.c) * t + self.d
    }
}

/// Carbon resistor
///
/// Only defined above 1 K; below that the resistance diverges and is
/// clamped to [`C100_SATURATION_OHMS`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct C100Curve;

impl C100Curve {
    /// Resistance at `temperature`
    pub fn resistance_of(&self, temperature: f64) -> f64 {
        if temperature > 1.0 {
            37.4 + 42.8 * ((temperature - 0.43) / 42.8).powf(-0.476).exp()
        } else {
            C100_SATURATION_OHMS
        }
    }
}

/// Ruthenium-oxide resistor, `R = R0·exp(((T + a)/T0)^α)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuO2Curve {
    pub a: f64,
    pub r0: f64,
    pub t0: f64,
    pub alpha: f64,
}

impl Default for RuO2Curve {
    fn default() -> Self {
        Self {
            a: 0.01,
            r0: 864.3237440617243,
            t0: 0.8839588539497837,
            // -1/2.9742823228005086
            alpha: -0.33621556108985157,
        }
    }
}

impl RuO2Curve {
    /// Resistance at `temperature`
    ///
    /// NaN below `-a`, where the base of the power goes negative.
    pub fn resistance_of(&self, temperature: f64) -> f64 {
        self.r0 * ((temperature + self.a) / self.t0).powf(self.alpha).exp()
    }
}

/// Forward curve of a sensor material or of a combined probe
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ForwardCurve {
    /// Platinum alone
    Pt100(Pt100Curve),
    /// Carbon alone
    C100(C100Curve),
    /// Ruthenium oxide alone
    RuO2(RuO2Curve),
    /// Low-temperature mobile probe: `1/(1/C100 + 1/RuO2) + PT100`
    MobileBt {
        pt100: Pt100Curve,
        c100: C100Curve,
        ruo2: RuO2Curve,
    },
    /// High-temperature mobile probe: `w·C100 + PT100`
    MobileHt {
        pt100: Pt100Curve,
        c100: C100Curve,
        carbon_weight: f64,
    },
}

impl ForwardCurve {
    /// Mobile BT probe with the stock material coefficients
    pub fn mobile_bt() -> Self {
        ForwardCurve::MobileBt {
            pt100: Pt100Curve::default(),
            c100: C100Curve,
            ruo2: RuO2Curve::default(),
        }
    }

    /// Mobile HT probe with the stock material coefficients
    pub fn mobile_ht() -> Self {
        ForwardCurve::MobileHt {
            pt100: Pt100Curve::default(),
            c100: C100Curve,
            carbon_weight: MOBILE_HT_CARBON_WEIGHT,
        }
    }

    /// Resistance at a single temperature
    pub fn resistance_of(&self, temperature: f64) -> f64 {
        match self {
            ForwardCurve::Pt100(pt) => pt.resistance_of(temperature),
            ForwardCurve::C100(c) => c.resistance_of(temperature),
            ForwardCurve::RuO2(ru) => ru.resistance_of(temperature),
            ForwardCurve::MobileBt { pt100, c100, ruo2 } => {
                parallel(c100.resistance_of(temperature), ruo2.resistance_of(temperature))
                    + pt100.resistance_of(temperature)
            }
            ForwardCurve::MobileHt {
                pt100,
                c100,
                carbon_weight,
            } => carbon_weight * c100.resistance_of(temperature) + pt100.resistance_of(temperature),
        }
    }

    /// Resistance at every temperature of `temperatures`, element-wise
    pub fn resistance_of_many(&self, temperatures: &[f64]) -> Vec<f64> {
        temperatures
            .iter()
            .map(|&t| self.resistance_of(t))
            .collect()
    }
}

/// Two resistors in parallel
pub fn parallel(r_a: f64, r_b: f64) -> f64 {
    1.0 / (1.0 / r_a + 1.0 / r_b)
}

// ---------------------------------------------------------------------------
// Closed-form inverses (resistance -> temperature)
// ---------------------------------------------------------------------------

/// PT100 inverse fit, `T = c0 + c1·R + c2·R² + c3·R³`
pub const PT100_INVERSE: [f64; 4] = [33.0, 2.25686, 0.00208613, -3.81907e-6];

/// Evaluate `c0 + c1·x + c2·x² + c3·x³`
pub fn polynomial(coefficients: &[f64; 4], x: f64) -> f64 {
    let [c0, c1, c2, c3] = *coefficients;
    ((c3 * x + c2) * x + c1) * x + c0
}

/// PT100 resistance to temperature
pub fn pt100_temperature(resistance: f64) -> f64 {
    polynomial(&PT100_INVERSE, resistance)
}

/// C100 resistance to temperature
///
/// Diverges around 80.1 Ω. At or above [`C100_SATURATION_OHMS`] the
/// saturation temperature is returned.
pub fn c100_temperature(resistance: f64) -> f64 {
    if resistance < C100_SATURATION_OHMS {
        0.43 + 42.8 * ((resistance - 37.4) / 42.8).ln().powf(-1.0 / 0.476)
    } else {
        C100_SATURATION_KELVIN
    }
}

/// Mobile BM (RuO2 + C100 + PT100) quick conversion, low temperature only
pub fn mobile_bm_temperature(resistance: f64) -> f64 {
    if resistance < 1464.4 {
        13.9942 * (resistance / 116.928).ln().powf(-1.09771) - 3.54293
    } else {
        3.01749 * (resistance / 436.589).ln().powf(-3.53959) - 0.0219203
    }
}

/// Legacy NICO law; zero above 1 kΩ
pub fn nico_temperature(resistance: f64) -> f64 {
    if resistance <= 1000.0 {
        0.0215 * (20000.0 / resistance).powf(1.7)
    } else {
        0.0
    }
}

/// Temperature reported by the calibrated NICO probe at or below 1 kΩ
pub const NICO_CAL_WARM_KELVIN: f64 = 300.0;

/// Calibrated NICO branches: (lower threshold Ω, prefactor, reference Ω, exponent).
/// A branch applies for `threshold < R`, up to the next threshold above it.
const NICO_CAL_BRANCHES: [(f64, f64, f64, f64); 7] = [
    (16607.40, 0.02, 18100.0, 0.4),
    (13568.60, 0.03, 15100.0, 0.5),
    (4966.46, 0.04, 13000.0, 0.58),
    (2521.26, 0.4, 3600.0, 0.5),
    (1540.54, 1.5, 2100.0, 0.3),
    (1204.76, 10.0, 1330.0, 0.17),
    (1000.00, 30.0, 1150.0, 0.09),
];

/// Calibrated NICO resistance to temperature
pub fn nico_cal_temperature(resistance: f64) -> f64 {
    NICO_CAL_BRANCHES
        .iter()
        .find(|(threshold, ..)| resistance > *threshold)
        .map(|&(_, prefactor, reference, exponent)| {
            prefactor * (reference / resistance).powf(1.0 / exponent)
        })
        .unwrap_or(NICO_CAL_WARM_KELVIN)
}
