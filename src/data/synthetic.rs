//! Synthetic histograms from known coefficients.
//!
//! Each bin receives the increment of the closed-form cumulative field across
//! it, evaluated at the histogram's own surface pressure. Optional multiplicative
//! log-normal noise mimics Monte-Carlo photon counting:
//!
//! `w_i = ΔF_i · exp(σ·z_i − σ²/2)`, `z_i ~ N(0, 1)`
//!
//! The `−σ²/2` correction keeps the expected weight equal to `ΔF_i`.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::domain::{Histogram, REFERENCE_PRESSURE, SimulationMeta};
use crate::error::ApsfError;
use crate::models::AnnularCoefficients;

/// Binning and noise of a synthetic run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticSpec {
    /// Number of uniform radial bins.
    pub bins: usize,
    /// Outer edge of the last bin.
    pub r_max: f64,
    /// Log-normal noise level σ (0 disables noise).
    pub noise: f64,
    pub seed: u64,
}

impl Default for SyntheticSpec {
    fn default() -> Self {
        Self {
            bins: 50,
            r_max: 25.0,
            noise: 0.0,
            seed: 42,
        }
    }
}

/// Coefficients used by `apsf demo`: a fast molecular term and two slower
/// aerosol-like terms.
pub fn demo_coefficients() -> AnnularCoefficients {
    AnnularCoefficients {
        c1: 0.62,
        c2: 0.21,
        c3: -1.35,
        c4: 0.55,
        c5: -0.42,
        c6: -0.08,
    }
}

/// Build a histogram whose cumulative integral follows `coeffs`.
pub fn synthesize_histogram(
    coeffs: &AnnularCoefficients,
    spec: &SyntheticSpec,
    meta: SimulationMeta,
) -> Result<Histogram, ApsfError> {
    if spec.bins == 0 {
        return Err(ApsfError::InvalidHistogram("synthetic histogram needs at least one bin".into()));
    }
    if !(spec.r_max.is_finite() && spec.r_max > 0.0) {
        return Err(ApsfError::InvalidHistogram(format!(
            "invalid synthetic radius range: r_max={}",
            spec.r_max
        )));
    }
    if !(spec.noise.is_finite() && spec.noise >= 0.0) {
        return Err(ApsfError::InvalidHistogram(format!(
            "invalid synthetic noise level: {}",
            spec.noise
        )));
    }

    let p = meta.pressure / REFERENCE_PRESSURE;
    let step = spec.r_max / spec.bins as f64;
    let edges: Vec<f64> = (0..=spec.bins).map(|i| i as f64 * step).collect();
    let mut weights: Vec<f64> = edges
        .windows(2)
        .map(|e| coeffs.cumulative(e[1], p) - coeffs.cumulative(e[0], p))
        .collect();

    if spec.noise > 0.0 {
        let mut rng = StdRng::seed_from_u64(spec.seed);
        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| ApsfError::InvalidHistogram(format!("noise distribution error: {e}")))?;
        let correction = 0.5 * spec.noise * spec.noise;
        for w in weights.iter_mut() {
            let z: f64 = normal.sample(&mut rng);
            *w *= (spec.noise * z - correction).exp();
        }
    }

    Histogram::from_edges(edges, weights, meta)
}
