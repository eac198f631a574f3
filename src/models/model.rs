//! Closed-form annular surrogate.
//!
//! The cumulative APSF is written as an asymptote minus three exponential terms:
//!
//! ```text
//! F(r) = c1 − ( a1·e^(k1·r) + a2·e^(k2·r) + a3·e^(k3·r) )
//! ```
//!
//! with the amplitudes tied to the asymptote so that `a1 + a2 + a3 = c1`
//! (hence `F(0) = 0`). Only the first term scales with the normalized surface
//! pressure `p`:
//!
//! - `a1 = c2/p`, `k1 = c3/p`
//! - `a2 = (c1 − a1)·c4`, `k2 = c5`
//! - `a3 = (c1 − a1)·(1 − c4)`, `k3 = c6`

use std::collections::BTreeMap;

use crate::domain::{COEFFICIENT_NAMES, FittedModel};
use crate::error::ApsfError;

/// Number of parameters the optimizer searches over.
pub const RAW_PARAM_LEN: usize = 5;

/// The six stored coefficients of an annular model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnularCoefficients {
    pub c1: f64,
    pub c2: f64,
    pub c3: f64,
    pub c4: f64,
    pub c5: f64,
    pub c6: f64,
}

/// Amplitude/rate pairs of the three exponential terms at a given pressure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpandedTerms {
    pub asymptote: f64,
    pub amplitudes: [f64; 3],
    pub rates: [f64; 3],
}

impl ExpandedTerms {
    /// `F(r)` without NaN coercion.
    pub fn eval(&self, r: f64) -> f64 {
        let decay: f64 = self
            .amplitudes
            .iter()
            .zip(self.rates.iter())
            .map(|(a, k)| a * (k * r).exp())
            .sum();
        self.asymptote - decay
    }
}

impl AnnularCoefficients {
    /// Relabel optimizer output `x*` and the empirical asymptote `finf`.
    pub fn from_raw(x: &[f64], finf: f64) -> Self {
        Self {
            c1: finf,
            c2: x[0],
            c3: x[1],
            c4: x[2],
            c5: x[3],
            c6: x[4],
        }
    }

    /// Extract the coefficients of an annular model record.
    pub fn from_model(model: &FittedModel) -> Result<Self, ApsfError> {
        Ok(Self {
            c1: model.coefficient("c1")?,
            c2: model.coefficient("c2")?,
            c3: model.coefficient("c3")?,
            c4: model.coefficient("c4")?,
            c5: model.coefficient("c5")?,
            c6: model.coefficient("c6")?,
        })
    }

    pub fn as_array(&self) -> [f64; 6] {
        [self.c1, self.c2, self.c3, self.c4, self.c5, self.c6]
    }

    /// Named mapping stored in [`FittedModel::coefficients`].
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        COEFFICIENT_NAMES
            .iter()
            .zip(self.as_array())
            .map(|(name, value)| (name.to_string(), value))
            .collect()
    }

    /// Expand into physical terms at normalized pressure `p` (1 = reference).
    pub fn expand(&self, p: f64) -> ExpandedTerms {
        let a1 = self.c2 / p;
        let k1 = self.c3 / p;
        let rest = self.c1 - a1;
        ExpandedTerms {
            asymptote: self.c1,
            amplitudes: [a1, rest * self.c4, rest * (1.0 - self.c4)],
            rates: [k1, self.c5, self.c6],
        }
    }

    /// Cumulative field at radius `r`; NaN is treated as no contribution.
    pub fn cumulative(&self, r: f64, p: f64) -> f64 {
        let value = self.expand(p).eval(r);
        if value.is_nan() { 0.0 } else { value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AnnularCoefficients {
        AnnularCoefficients {
            c1: 0.83,
            c2: 0.31,
            c3: -1.7,
            c4: 0.42,
            c5: -0.25,
            c6: -0.03,
        }
    }

    #[test]
    fn amplitudes_sum_to_asymptote() {
        let c = sample();
        for p in [0.5, 0.8, 1.0, 1.3] {
            let t = c.expand(p);
            let sum: f64 = t.amplitudes.iter().sum();
            assert!((sum - c.c1).abs() < 1e-12, "p={p}: {sum} != {}", c.c1);
            let at_origin = c.cumulative(0.0, p);
            assert!((at_origin - (c.c1 - sum)).abs() < 1e-15);
            assert!(at_origin.abs() < 1e-12);
        }
    }

    #[test]
    fn cumulative_is_monotone_for_decaying_terms() {
        let c = sample();
        let mut prev = c.cumulative(0.0, 1.0);
        for i in 1..400 {
            let r = i as f64 * 0.25;
            let v = c.cumulative(r, 1.0);
            assert!(v >= prev - 1e-15, "decrease at r={r}");
            prev = v;
        }
        assert!((prev - c.c1).abs() < 0.02);
    }

    #[test]
    fn nan_is_coerced_to_zero() {
        let c = AnnularCoefficients {
            c6: f64::INFINITY,
            ..sample()
        };
        // inf·0 at the origin produces NaN.
        assert_eq!(c.cumulative(0.0, 1.0), 0.0);
    }

    #[test]
    fn map_round_trip_keeps_names() {
        let c = sample();
        let map = c.to_map();
        assert_eq!(map.len(), 6);
        assert_eq!(map["c1"], 0.83);
        assert_eq!(map["c6"], -0.03);
        let raw = [c.c2, c.c3, c.c4, c.c5, c.c6];
        assert_eq!(AnnularCoefficients::from_raw(&raw, c.c1), c);
    }
}
