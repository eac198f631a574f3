//! Exponential-decomposition objective.
//!
//! Given raw parameters `x = (x1..x5)`, the normalized pressure `p` of a sample
//! and the fixed asymptote `finf`:
//!
//! ```text
//! xp1 = x1/p ; xp2 = x2/p
//! F(r) = finf − ( xp1·e^(xp2·r)
//!               + (finf − xp1)·x3·e^(x4·r)
//!               + (finf − xp1)·(1 − x3)·e^(x5·r) )
//! ```
//!
//! The fast first term carries the pressure (molecular) dependence, the two
//! slower terms do not. Candidates are scored by mean absolute relative error.

use crate::fit::dataset::CumulativeData;
use crate::models::{AnnularCoefficients, RAW_PARAM_LEN};

/// Scalar cost over a parameter vector, as seen by a minimizer.
pub trait Objective: Sync {
    /// Dimension of the parameter vector.
    fn dim(&self) -> usize;

    /// Cost of `x` (lower is better). May be non-finite for unusable points.
    fn cost(&self, x: &[f64]) -> f64;
}

/// MARE of the exponential decomposition against a fit set.
#[derive(Debug, Clone, Copy)]
pub struct ExpDecomposition<'a> {
    pub data: &'a CumulativeData,
}

impl<'a> ExpDecomposition<'a> {
    pub fn new(data: &'a CumulativeData) -> Self {
        Self { data }
    }

    /// Model value at every sample (prediction mode).
    pub fn estimate(&self, x: &[f64]) -> Vec<f64> {
        let coeffs = AnnularCoefficients::from_raw(x, self.data.finf);
        self.data
            .radii
            .iter()
            .zip(self.data.pressure.iter())
            .map(|(&r, &p)| coeffs.expand(p).eval(r))
            .collect()
    }

    /// Mean absolute relative error over samples where it is defined.
    pub fn mare(&self, x: &[f64]) -> f64 {
        let estimate = self.estimate(x);
        let mut sum = 0.0;
        let mut n = 0usize;
        for (e, o) in estimate.iter().zip(self.data.observed.iter()) {
            let rel = (e - o).abs() / o;
            if rel.is_finite() {
                sum += rel;
                n += 1;
            }
        }
        if n == 0 { f64::NAN } else { sum / n as f64 }
    }

    /// Root-mean-square error over finite residuals.
    pub fn rmse(&self, x: &[f64]) -> f64 {
        let estimate = self.estimate(x);
        let sq: Vec<f64> = estimate
            .iter()
            .zip(self.data.observed.iter())
            .map(|(e, o)| (e - o) * (e - o))
            .filter(|v| v.is_finite())
            .collect();
        if sq.is_empty() {
            return f64::NAN;
        }
        (sq.iter().sum::<f64>() / sq.len() as f64).sqrt()
    }
}

impl Objective for ExpDecomposition<'_> {
    fn dim(&self) -> usize {
        RAW_PARAM_LEN
    }

    fn cost(&self, x: &[f64]) -> f64 {
        self.mare(x)
    }
}
