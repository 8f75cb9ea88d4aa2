//! Resistance to Temperature Conversion
//!
//! Maps a measured resistance to a temperature for each supported probe
//! type. A [`ProbeRegistry`] is built once at startup from immutable
//! [`CalibrationSpec`]s and then only read:
//!
//! - PT100: direct cubic polynomial
//! - Mobile BT: piecewise cubic inverse, two regimes around 70 K
//! - Mobile HT: secant root finding on the forward curve
//! - Mobile BM, NICO BT CAL, NICO BT: closed-form formulas
//!
//! Scalar and batch conversion resolve the probe type once and then run the
//! same per-element [`Inverter`].

pub mod curves;
mod error;
pub mod root_finding;
pub mod spline;

pub use error::{CalibrationError, ConversionError, RootFindingFailure, SolverFailure};
pub use root_finding::{RegimeGuesses, RootFinder};
pub use spline::{Saturation, SplineSegment, SplineTable};

use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use curves::{ForwardCurve, Pt100Curve};

/// Temperature substituted when root finding fails, in kelvin
pub const DEFAULT_FALLBACK_TEMPERATURE: f64 = 500.0;

/// Probe types known to the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProbeType {
    /// RuO2 + C100 + PT100 mobile probe, spline inverse
    #[serde(rename = "Mobile BT")]
    MobileBt,
    /// C100 + PT100 mobile probe, root finding
    #[serde(rename = "Mobile HT")]
    MobileHt,
    /// Platinum probe alone
    #[serde(rename = "PT100")]
    Pt100,
    /// Mobile probe, quick low-temperature formula
    #[serde(rename = "Mobile BM")]
    MobileBm,
    /// Calibrated NICO probe
    #[serde(rename = "NICO BT CAL")]
    NicoBtCal,
    /// Uncalibrated NICO law, kept for old configurations
    #[serde(rename = "NICO BT")]
    NicoBt,
}

impl ProbeType {
    /// Every known type
    pub const ALL: [ProbeType; 6] = [
        ProbeType::MobileBt,
        ProbeType::MobileHt,
        ProbeType::Pt100,
        ProbeType::MobileBm,
        ProbeType::NicoBtCal,
        ProbeType::NicoBt,
    ];

    /// Types offered for selection, in display order
    pub const SELECTABLE: [ProbeType; 5] = [
        ProbeType::MobileBt,
        ProbeType::MobileHt,
        ProbeType::Pt100,
        ProbeType::MobileBm,
        ProbeType::NicoBtCal,
    ];

    /// Display name, also used in configuration files
    pub fn name(&self) -> &'static str {
        match self {
            ProbeType::MobileBt => "Mobile BT",
            ProbeType::MobileHt => "Mobile HT",
            ProbeType::Pt100 => "PT100",
            ProbeType::MobileBm => "Mobile BM",
            ProbeType::NicoBtCal => "NICO BT CAL",
            ProbeType::NicoBt => "NICO BT",
        }
    }

    /// Whether the conversion depends on the "above transition" flag
    ///
    /// Only the mobile probes have a non-monotonic forward curve. The flag
    /// is accepted and ignored for every other type.
    pub fn uses_regime_flag(&self) -> bool {
        matches!(self, ProbeType::MobileBt | ProbeType::MobileHt)
    }
}

impl fmt::Display for ProbeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProbeType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProbeType::ALL
            .into_iter()
            .find(|t| t.name() == s.trim())
            .ok_or_else(|| ConversionError::UnknownProbeType(s.to_string()))
    }
}

impl TryFrom<&str> for ProbeType {
    type Error = ConversionError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Infallible> for ConversionError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

/// Closed-form probe formulas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClosedForm {
    MobileBm,
    NicoCal,
    Nico,
}

impl ClosedForm {
    /// Temperature for `resistance`
    pub fn temperature_of(&self, resistance: f64) -> f64 {
        match self {
            ClosedForm::MobileBm => curves::mobile_bm_temperature(resistance),
            ClosedForm::NicoCal => curves::nico_cal_temperature(resistance),
            ClosedForm::Nico => curves::nico_temperature(resistance),
        }
    }
}

/// How a probe type turns a resistance into a temperature
#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationSpec {
    /// Direct `T = c0 + c1·R + c2·R² + c3·R³`, with the matching forward curve
    Polynomial {
        coefficients: [f64; 4],
        forward: Pt100Curve,
    },
    /// Forward curve only, inverted numerically
    RootFinding {
        curve: ForwardCurve,
        guesses: RegimeGuesses,
    },
    /// Forward curve plus a tabulated piecewise inverse
    Spline {
        curve: ForwardCurve,
        table: SplineTable,
    },
    /// Fixed formula, no forward curve
    ClosedForm(ClosedForm),
}

impl CalibrationSpec {
    /// PT100 polynomial pair
    pub fn pt100() -> Self {
        CalibrationSpec::Polynomial {
            coefficients: curves::PT100_INVERSE,
            forward: Pt100Curve::default(),
        }
    }

    /// Mobile BT spline inverse
    pub fn mobile_bt(tolerance: f64) -> Result<Self, CalibrationError> {
        Ok(CalibrationSpec::Spline {
            curve: ForwardCurve::mobile_bt(),
            table: SplineTable::mobile_bt(tolerance)?,
        })
    }

    /// Mobile BT by root finding instead of the spline table
    pub fn mobile_bt_root() -> Self {
        CalibrationSpec::RootFinding {
            curve: ForwardCurve::mobile_bt(),
            guesses: RegimeGuesses {
                above: 200.0,
                below: 0.02,
            },
        }
    }

    /// Mobile HT root finding
    pub fn mobile_ht() -> Self {
        CalibrationSpec::RootFinding {
            curve: ForwardCurve::mobile_ht(),
            guesses: RegimeGuesses {
                above: 200.0,
                below: 2.0,
            },
        }
    }
}

/// Conversion settings read from configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConversionSettings {
    /// Spline boundary tolerance in ohms
    #[serde(default = "default_spline_tolerance")]
    pub spline_tolerance: f64,
    /// Temperature used when root finding fails
    #[serde(default = "default_fallback_temperature")]
    pub fallback_temperature: f64,
    /// Secant solver settings
    #[serde(default)]
    pub solver: RootFinder,
}

fn default_spline_tolerance() -> f64 {
    spline::DEFAULT_BOUNDARY_TOLERANCE
}

fn default_fallback_temperature() -> f64 {
    DEFAULT_FALLBACK_TEMPERATURE
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self {
            spline_tolerance: default_spline_tolerance(),
            fallback_temperature: default_fallback_temperature(),
            solver: RootFinder::default(),
        }
    }
}

/// Probe type to calibration dispatch table
#[derive(Debug, Clone)]
pub struct ProbeRegistry {
    specs: HashMap<ProbeType, CalibrationSpec>,
    solver: RootFinder,
    fallback_temperature: f64,
}

impl ProbeRegistry {
    /// Registry with no probe type
    pub fn empty(settings: &ConversionSettings) -> Self {
        Self {
            specs: HashMap::new(),
            solver: settings.solver,
            fallback_temperature: settings.fallback_temperature,
        }
    }

    /// Registry with every known probe type
    ///
    /// Fails if a calibration table does not validate.
    pub fn standard(settings: &ConversionSettings) -> Result<Self, CalibrationError> {
        Ok(Self::empty(settings)
            .with_spec(ProbeType::MobileBt, CalibrationSpec::mobile_bt(settings.spline_tolerance)?)
            .with_spec(ProbeType::MobileHt, CalibrationSpec::mobile_ht())
            .with_spec(ProbeType::Pt100, CalibrationSpec::pt100())
            .with_spec(ProbeType::MobileBm, CalibrationSpec::ClosedForm(ClosedForm::MobileBm))
            .with_spec(ProbeType::NicoBtCal, CalibrationSpec::ClosedForm(ClosedForm::NicoCal))
            .with_spec(ProbeType::NicoBt, CalibrationSpec::ClosedForm(ClosedForm::Nico)))
    }

    /// Register (or replace) the calibration of a probe type
    pub fn with_spec(mut self, probe_type: ProbeType, spec: CalibrationSpec) -> Self {
        self.specs.insert(probe_type, spec);
        self
    }

    /// Calibration registered for a probe type
    pub fn spec(&self, probe_type: ProbeType) -> Option<&CalibrationSpec> {
        self.specs.get(&probe_type)
    }

    /// Whether a probe type can be converted
    pub fn contains(&self, probe_type: ProbeType) -> bool {
        self.specs.contains_key(&probe_type)
    }

    /// Temperature used in place of failed root finding
    pub fn fallback_temperature(&self) -> f64 {
        self.fallback_temperature
    }

    /// Per-element converter for a probe type and regime
    pub fn inverter(
        &self,
        probe_type: ProbeType,
        above_transition: bool,
    ) -> Result<Inverter<'_>, ConversionError> {
        let spec = self
            .specs
            .get(&probe_type)
            .ok_or_else(|| ConversionError::UnknownProbeType(probe_type.name().to_string()))?;
        Ok(Inverter {
            probe_type,
            spec,
            solver: &self.solver,
            fallback_temperature: self.fallback_temperature,
            above_transition,
        })
    }

    /// Convert one resistance
    ///
    /// `probe_type` is a [`ProbeType`] or its display name.
    pub fn convert_one<P>(
        &self,
        resistance: f64,
        probe_type: P,
        above_transition: bool,
    ) -> Result<f64, ConversionError>
    where
        P: TryInto<ProbeType>,
        ConversionError: From<P::Error>,
    {
        let inverter = self.inverter(probe_type.try_into()?, above_transition)?;
        Ok(inverter.temperature_of(resistance))
    }

    /// Convert a sequence of resistances; the result has the same length
    pub fn convert_many<P>(
        &self,
        resistances: &[f64],
        probe_type: P,
        above_transition: bool,
    ) -> Result<Vec<f64>, ConversionError>
    where
        P: TryInto<ProbeType>,
        ConversionError: From<P::Error>,
    {
        let inverter = self.inverter(probe_type.try_into()?, above_transition)?;
        Ok(inverter.temperatures_of(resistances))
    }
}

/// Converter bound to one probe type and regime
#[derive(Debug, Clone, Copy)]
pub struct Inverter<'a> {
    probe_type: ProbeType,
    spec: &'a CalibrationSpec,
    solver: &'a RootFinder,
    fallback_temperature: f64,
    above_transition: bool,
}

impl Inverter<'_> {
    /// Probe type this inverter converts for
    pub fn probe_type(&self) -> ProbeType {
        self.probe_type
    }

    /// Temperature for `resistance`, or the root-finding failure
    ///
    /// Out-of-range resistances yield NaN, not an error.
    pub fn try_temperature_of(&self, resistance: f64) -> Result<f64, RootFindingFailure> {
        let above = self.above_transition;
        match self.spec {
            CalibrationSpec::Polynomial { coefficients, .. } => {
                Ok(curves::polynomial(coefficients, resistance))
            }
            CalibrationSpec::RootFinding { curve, guesses } => {
                self.solver.invert(curve, resistance, guesses, above)
            }
            CalibrationSpec::Spline { table, .. } => Ok(table.invert(resistance, above)),
            CalibrationSpec::ClosedForm(form) => Ok(form.temperature_of(resistance)),
        }
    }

    /// Temperature for `resistance`, substituting the fallback on failure
    pub fn temperature_of(&self, resistance: f64) -> f64 {
        self.settle(resistance, self.try_temperature_of(resistance))
    }

    /// Temperature for every resistance, element-wise
    ///
    /// Each element is solved on its own; a failure only replaces that element.
    pub fn temperatures_of(&self, resistances: &[f64]) -> Vec<f64> {
        let above = self.above_transition;
        match self.spec {
            CalibrationSpec::RootFinding { curve, guesses } => self
                .solver
                .invert_many(curve, resistances, guesses, above)
                .into_iter()
                .zip(resistances)
                .map(|(result, &r)| self.settle(r, result))
                .collect(),
            CalibrationSpec::Spline { table, .. } => table
                .invert_many(resistances, above)
                .into_iter()
                .zip(resistances)
                .map(|(t, &r)| self.settle(r, Ok(t)))
                .collect(),
            _ => resistances
                .iter()
                .map(|&r| self.temperature_of(r))
                .collect(),
        }
    }

    /// Log out-of-range results and replace failures by the fallback
    fn settle(&self, resistance: f64, result: Result<f64, RootFindingFailure>) -> f64 {
        match result {
            Ok(temperature) => {
                if temperature.is_nan() {
                    debug!(
                        probe_type = %self.probe_type,
                        resistance,
                        "resistance outside calibrated range"
                    );
                }
                temperature
            }
            Err(err) => {
                warn!(
                    probe_type = %self.probe_type,
                    resistance,
                    fallback = self.fallback_temperature,
                    "{err}; using fallback temperature"
                );
                self.fallback_temperature
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ProbeRegistry {
        ProbeRegistry::standard(&ConversionSettings::default()).unwrap()
    }

    #[test]
    fn test_probe_type_names_round_trip() {
        for t in ProbeType::ALL {
            assert_eq!(t.name().parse::<ProbeType>().unwrap(), t);
        }
        assert!("mobile bt".parse::<ProbeType>().is_err());
    }

    #[test]
    fn test_regime_flag_types() {
        assert!(ProbeType::MobileBt.uses_regime_flag());
        assert!(ProbeType::MobileHt.uses_regime_flag());
        assert!(!ProbeType::Pt100.uses_regime_flag());
        assert!(!ProbeType::NicoBtCal.uses_regime_flag());
    }

    #[test]
    fn test_unknown_name_rejected() {
        let err = registry().convert_one(100.0, "Bogus", false).unwrap_err();
        assert_eq!(err, ConversionError::UnknownProbeType("Bogus".into()));
    }

    #[test]
    fn test_unregistered_type_rejected() {
        let reg = ProbeRegistry::empty(&ConversionSettings::default())
            .with_spec(ProbeType::Pt100, CalibrationSpec::pt100());
        assert!(reg.convert_one(100.0, ProbeType::Pt100, false).is_ok());
        assert!(matches!(
            reg.convert_one(100.0, ProbeType::MobileHt, false),
            Err(ConversionError::UnknownProbeType(_))
        ));
    }

    #[test]
    fn test_fallback_on_root_failure() {
        let reg = registry();
        let t = reg.convert_one(-100.0, ProbeType::MobileHt, true).unwrap();
        assert_eq!(t, DEFAULT_FALLBACK_TEMPERATURE);
    }

    #[test]
    fn test_regime_ignored_for_monotonic_types() {
        let reg = registry();
        for t in [ProbeType::Pt100, ProbeType::MobileBm, ProbeType::NicoBtCal] {
            let hot = reg.convert_one(300.0, t, true).unwrap();
            let cold = reg.convert_one(300.0, t, false).unwrap();
            assert_eq!(hot, cold);
        }
    }
}
