//! Numerical inversion of forward curves
//!
//! Probes without a closed-form or tabulated inverse are converted by
//! solving `curve(T) - R = 0` with the secant method (Newton's method with
//! the derivative replaced by a finite difference). The iteration budget is
//! fixed, so a call never blocks for long; a failure is returned instead.

use serde::{Deserialize, Serialize};

use super::curves::ForwardCurve;
use super::error::{RootFindingFailure, SolverFailure};

/// Default convergence tolerance on the temperature step, in kelvin
pub const DEFAULT_TOLERANCE: f64 = 1.48e-8;

/// Default iteration budget
pub const DEFAULT_MAX_ITERATIONS: u32 = 50;

/// Initial guesses per regime
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeGuesses {
    /// Starting temperature when the probe is above the transition
    pub above: f64,
    /// Starting temperature when the probe is below the transition
    pub below: f64,
}

impl RegimeGuesses {
    /// Guess for the requested regime
    pub fn for_regime(&self, above_transition: bool) -> f64 {
        if above_transition {
            self.above
        } else {
            self.below
        }
    }
}

/// Secant solver settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RootFinder {
    /// Stop when successive iterates differ by less than this
    pub tolerance: f64,
    /// Maximum number of secant steps
    pub max_iterations: u32,
}

impl Default for RootFinder {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl RootFinder {
    /// Temperature at which `curve` reaches `target` ohms, starting from the
    /// guess of the requested regime
    pub fn invert(
        &self,
        curve: &ForwardCurve,
        target: f64,
        guesses: &RegimeGuesses,
        above_transition: bool,
    ) -> Result<f64, RootFindingFailure> {
        let guess = guesses.for_regime(above_transition);
        self.solve(|t| curve.resistance_of(t) - target, guess)
            .map_err(|reason| RootFindingFailure {
                target,
                guess,
                reason,
            })
    }

    /// Solve every target independently
    pub fn invert_many(
        &self,
        curve: &ForwardCurve,
        targets: &[f64],
        guesses: &RegimeGuesses,
        above_transition: bool,
    ) -> Vec<Result<f64, RootFindingFailure>> {
        targets
            .iter()
            .map(|&target| self.invert(curve, target, guesses, above_transition))
            .collect()
    }

    /// Find a positive root of `f` near `x0`
    pub fn solve<F>(&self, f: F, x0: f64) -> Result<f64, SolverFailure>
    where
        F: Fn(f64) -> f64,
    {
        const EPS: f64 = 1e-4;

        let mut p0 = x0;
        let mut p1 = x0 * (1.0 + EPS) + if x0 >= 0.0 { EPS } else { -EPS };
        let mut q0 = f(p0);
        let mut q1 = f(p1);
        if !q0.is_finite() || !q1.is_finite() {
            return Err(SolverFailure::NonFinite);
        }
        // Keep the point with the smaller residual as the latest iterate
        if q1.abs() < q0.abs() {
            std::mem::swap(&mut p0, &mut p1);
            std::mem::swap(&mut q0, &mut q1);
        }

        for _ in 0..self.max_iterations {
            if q1 == q0 {
                return Err(SolverFailure::FlatSlope { at: p1 });
            }
            let p = if q1.abs() > q0.abs() {
                (-q0 / q1 * p1 + p0) / (1.0 - q0 / q1)
            } else {
                (-q1 / q0 * p0 + p1) / (1.0 - q1 / q0)
            };
            if !p.is_finite() {
                return Err(SolverFailure::NonFinite);
            }
            if (p - p1).abs() <= self.tolerance {
                if p <= 0.0 {
                    return Err(SolverFailure::NonPhysical { root: p });
                }
                return Ok(p);
            }
            p0 = p1;
            q0 = q1;
            p1 = p;
            q1 = f(p1);
            if !q1.is_finite() {
                return Err(SolverFailure::NonFinite);
            }
        }

        Err(SolverFailure::NotConverged {
            iterations: self.max_iterations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solve_simple_polynomial() {
        let solver = RootFinder::default();
        let root = solver.solve(|x| x * x - 2.0, 1.0).unwrap();
        assert!((root - 2f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_no_real_root_fails() {
        let solver = RootFinder::default();
        let result = solver.solve(|x| x * x + 1.0, 1.0);
        assert!(result.is_err());
    }

    #[test]
    fn test_flat_function_fails() {
        let solver = RootFinder::default();
        let result = solver.solve(|_| 3.0, 10.0);
        assert!(matches!(result, Err(SolverFailure::FlatSlope { .. })));
    }

    #[test]
    fn test_negative_root_rejected() {
        let solver = RootFinder::default();
        let result = solver.solve(|x| x + 5.0, 1.0);
        assert!(matches!(result, Err(SolverFailure::NonPhysical { .. })));
    }

    #[test]
    fn test_regime_guess_selects_branch() {
        let solver = RootFinder::default();
        let ht = ForwardCurve::mobile_ht();
        let guesses = RegimeGuesses {
            above: 200.0,
            below: 2.0,
        };
        let r = ht.resistance_of(150.0);
        let hot = solver.invert(&ht, r, &guesses, true).unwrap();
        assert!((hot - 150.0).abs() < 1e-6);
        // Same resistance, other branch of the curve
        let cold = solver.invert(&ht, r, &guesses, false).unwrap();
        assert!(cold < 70.0);
    }
}
