//! Piecewise cubic inverse of a forward curve
//!
//! The Mobile BT curve has no analytical inverse and is not monotonic: its
//! resistance has a minimum near 70 K, so every resistance above that
//! minimum corresponds to one temperature on each side. The inverse is
//! therefore tabulated as two independent lists of cubic segments, one per
//! regime, each covering a contiguous resistance span.
//!
//! Segment selection is exclusive: intervals are half-open `[lower, upper)`,
//! the last segment of a regime is closed at its upper bound, and a value
//! inside a sub-tolerance gap between two segments belongs to the preceding
//! one.

use serde::{Deserialize, Serialize};

use super::curves::ForwardCurve;
use super::error::CalibrationError;

/// Default boundary tolerance, in ohms
pub const DEFAULT_BOUNDARY_TOLERANCE: f64 = 1e-5;

/// Temperature separating the two branches of the Mobile BT curve
pub const TRANSITION_KELVIN: f64 = 70.0;

/// One cubic piece: `T = a + b·Δ + c·Δ² + d·Δ³` with `Δ = R - lower`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplineSegment {
    /// Regime this segment belongs to
    pub above_transition: bool,
    /// Lower resistance bound (ohms)
    pub lower: f64,
    /// Upper resistance bound (ohms)
    pub upper: f64,
    /// Cubic coefficients `[a, b, c, d]`
    pub coefficients: [f64; 4],
}

impl SplineSegment {
    /// Evaluate the cubic at `resistance`
    pub fn evaluate(&self, resistance: f64) -> f64 {
        let [a, b, c, d] = self.coefficients;
        let delta = resistance - self.lower;
        a + delta * (b + delta * (c + delta * d))
    }
}

/// Temperatures returned above the highest segment of each regime
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Saturation {
    /// High branch: resistance beyond the table means "hotter than this"
    pub above: f64,
    /// Low branch: resistance beyond the table means "colder than this"
    pub below: f64,
}

impl Default for Saturation {
    fn default() -> Self {
        Self {
            above: 1e4,
            below: 1e-3,
        }
    }
}

/// Validated, immutable spline inverse
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplineTable {
    name: String,
    tolerance: f64,
    saturation: Saturation,
    above: Vec<SplineSegment>,
    below: Vec<SplineSegment>,
}

impl SplineTable {
    /// Build a table from segments in any order
    ///
    /// Fails if a regime is empty, if a segment has unusable bounds or
    /// coefficients, or if consecutive segments of a regime leave a gap or
    /// overlap wider than `tolerance`.
    pub fn new(
        name: impl Into<String>,
        segments: Vec<SplineSegment>,
        tolerance: f64,
        saturation: Saturation,
    ) -> Result<Self, CalibrationError> {
        let name = name.into();
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(CalibrationError::InvalidTolerance(tolerance));
        }

        let (mut above, mut below): (Vec<_>, Vec<_>) =
            segments.into_iter().partition(|s| s.above_transition);
        above.sort_by(|x, y| x.lower.total_cmp(&y.lower));
        below.sort_by(|x, y| x.lower.total_cmp(&y.lower));

        validate_regime(&name, &above, tolerance, "above-transition")?;
        validate_regime(&name, &below, tolerance, "below-transition")?;

        Ok(Self {
            name,
            tolerance,
            saturation,
            above,
            below,
        })
    }

    /// Mobile BT inverse with the stock coefficients
    pub fn mobile_bt(tolerance: f64) -> Result<Self, CalibrationError> {
        let curve = ForwardCurve::mobile_bt();
        let segments = MOBILE_BT_SEGMENTS
            .iter()
            .map(|row| SplineSegment {
                above_transition: row.above_transition,
                lower: row.lower.resolve(&curve),
                upper: row.upper.resolve(&curve),
                coefficients: row.coefficients,
            })
            .collect();
        Self::new("Mobile BT", segments, tolerance, Saturation::default())
    }

    /// Table name, for diagnostics
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Boundary tolerance in ohms
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Segments of one regime, sorted by lower bound
    pub fn segments(&self, above_transition: bool) -> &[SplineSegment] {
        if above_transition {
            &self.above
        } else {
            &self.below
        }
    }

    /// Validated resistance span `(lowest lower bound, highest upper bound)`
    pub fn span(&self, above_transition: bool) -> (f64, f64) {
        let segments = self.segments(above_transition);
        // Both regimes are non-empty after validation
        let low = segments.first().map_or(f64::NAN, |s| s.lower);
        let high = segments.last().map_or(f64::NAN, |s| s.upper);
        (low, high)
    }

    /// Segment that owns `resistance`, if it lies inside the span
    pub fn locate(&self, resistance: f64, above_transition: bool) -> Option<&SplineSegment> {
        let segments = self.segments(above_transition);
        let idx = segments.partition_point(|s| s.lower <= resistance);
        let seg = segments.get(idx.checked_sub(1)?)?;
        let is_last = idx == segments.len();
        let inside = resistance < seg.upper
            || (is_last && resistance <= seg.upper)
            || (!is_last && resistance <= seg.upper + self.tolerance);
        inside.then_some(seg)
    }

    /// Temperature for one resistance
    ///
    /// NaN below the span, saturation temperature above it.
    pub fn invert(&self, resistance: f64, above_transition: bool) -> f64 {
        let (low, high) = self.span(above_transition);
        if resistance < low {
            return f64::NAN;
        }
        if resistance > high {
            return if above_transition {
                self.saturation.above
            } else {
                self.saturation.below
            };
        }
        self.locate(resistance, above_transition)
            .map_or(f64::NAN, |seg| seg.evaluate(resistance))
    }

    /// Temperature for every resistance, element-wise
    pub fn invert_many(&self, resistances: &[f64], above_transition: bool) -> Vec<f64> {
        resistances
            .iter()
            .map(|&r| self.invert(r, above_transition))
            .collect()
    }
}

fn validate_regime(
    table: &str,
    segments: &[SplineSegment],
    tolerance: f64,
    regime: &'static str,
) -> Result<(), CalibrationError> {
    if segments.is_empty() {
        return Err(CalibrationError::EmptyRegime(table.to_string(), regime));
    }
    for (index, seg) in segments.iter().enumerate() {
        if !(seg.lower.is_finite() && seg.upper.is_finite() && seg.lower < seg.upper) {
            return Err(CalibrationError::InvalidBounds {
                table: table.to_string(),
                index,
                lower: seg.lower,
                upper: seg.upper,
            });
        }
        if seg.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(CalibrationError::NonFiniteCoefficient {
                table: table.to_string(),
                index,
            });
        }
    }
    for (index, pair) in segments.windows(2).enumerate() {
        let width = pair[1].lower - pair[0].upper;
        if width > tolerance {
            return Err(CalibrationError::Gap {
                table: table.to_string(),
                index: index + 1,
                width,
            });
        }
        if width < -tolerance {
            return Err(CalibrationError::Overlap {
                table: table.to_string(),
                index: index + 1,
                width: -width,
            });
        }
    }
    Ok(())
}

/// Segment bound, either literal or the curve evaluated at a temperature
#[derive(Debug, Clone, Copy)]
enum Bound {
    Ohms(f64),
    CurveAt(f64),
}

impl Bound {
    fn resolve(self, curve: &ForwardCurve) -> f64 {
        match self {
            Bound::Ohms(r) => r,
            Bound::CurveAt(t) => curve.resistance_of(t),
        }
    }
}

use Bound::{CurveAt, Ohms};

struct SegmentRow {
    above_transition: bool,
    lower: Bound,
    upper: Bound,
    coefficients: [f64; 4],
}

const fn row(above_transition: bool, lower: Bound, upper: Bound, coefficients: [f64; 4]) -> SegmentRow {
    SegmentRow {
        above_transition,
        lower,
        upper,
        coefficients,
    }
}

/// Fitted offline against the Mobile BT forward curve
#[rustfmt::skip]
const MOBILE_BT_SEGMENTS: [SegmentRow; 21] = [
    row(true,  CurveAt(70.0),                 Ohms(137.43235776204997), [70.0, 22.52365474990894, -6.9770467433559284, 0.8742043290186831]),
    row(true,  Ohms(137.43235776204997),      Ohms(200.98685724080576), [100.0, 4.766682114127137, -0.04579688972296893, 0.00031957563563563733]),
    row(true,  Ohms(200.98685724080576),      Ohms(435.85541705435446), [300.0, 2.8157229834824213, 0.00013794515044629046, 2.397764032829255e-06]),
    row(true,  Ohms(435.85541705435446),      Ohms(4090.247318593811),  [1000.0, 3.2822226189393215, -3.633959540639026e-05, -5.141557734090797e-08]),
    row(false, CurveAt(70.0),                 Ohms(134.09501041298557), [70.0, -309.14808022234035, 39455.93555381805, -1965549.9973341406]),
    row(false, Ohms(134.09501041298557),      Ohms(134.1912335225398),  [69.0, -69.79751530978243, 683.9821465446398, -2937.1689978712166]),
    row(false, Ohms(134.1912335225398),       Ohms(134.61880261470728), [66.0, -19.75248316910303, 29.32324139567444, -24.501473836976256]),
    row(false, Ohms(134.61880261470728),      Ohms(136.5008817453887),  [61.0, -8.114794733567383, 2.7162611322203483, -0.5023313955667926]),
    row(false, Ohms(136.5008817453887),       Ohms(144.34985840396163), [52.0, -3.2284656949032393, 0.28175447078524485, -0.012444975728843245]),
    row(false, Ohms(144.34985840396163),      Ohms(164.85858143908155), [38.0, -1.1055689151400592, 0.033743005718536195, -0.0005238459754895229]),
    row(false, Ohms(164.85858143908155),      Ohms(221.29467734671675), [25.0, -0.38251798281257127, 0.004999813612340653, -2.9689707617719814e-05]),
    row(false, Ohms(221.29467734671675),      Ohms(333.69256212664845), [14.0, -0.10186615027810998, 0.0006394690872973255, -1.8515066294783854e-06]),
    row(false, Ohms(333.69256212664845),      Ohms(518.3387557892462),  [8.0, -0.02828803471755293, 9.36815790651613e-05, -1.5419626481484084e-07]),
    row(false, Ohms(518.3387557892462),       Ohms(895.3730377547383),  [5.0, -0.009463743398995247, 1.6166815445787894e-05, -1.362076413593773e-08]),
    row(false, Ohms(895.3730377547383),       CurveAt(1.0),             [3.0, -0.0030816291312388147, 2.30140128889834e-06, -8.351750508849628e-10]),
    row(false, CurveAt(1.0),                  Ohms(2857.215303444065),  [1.0, -0.001403090273183254, 1.360737411081143e-06, -6.306275276488724e-10]),
    row(false, Ohms(2857.215303444065),       Ohms(4233.24990567035),   [0.5, -0.0004398413920480902, 2.503027512871836e-07, -6.091160370287172e-11]),
    row(false, Ohms(4233.24990567035),        Ohms(7393.954522712528),  [0.21, -9.654104187203177e-05, 2.7399044169510914e-08, -3.1220365644014624e-12]),
    row(false, Ohms(7393.954522712528),       Ohms(14441.30260446487),  [0.08, -1.6696735059732812e-05, 2.137936093789363e-09, -1.100352259007167e-13]),
    row(false, Ohms(14441.30260446487),       Ohms(29899.177715334856), [0.03, -2.8662308097586417e-06, 1.5707126658763552e-10, -3.5807105027714794e-15]),
    row(false, Ohms(29899.177715334856),      Ohms(63950.41097093372),  [0.01, -5.382182297889829e-07, 1.204188705294153e-11, -1.1740583816654862e-16]),
];
