//! Trapezoidal integration over annuli.
//!
//! For an areal density `ρ(r)` sampled at sorted radii, the mass inside the
//! annulus `[r_i, r_{i+1}]` is approximated by its area times the mean of the
//! two boundary densities:
//!
//! ```text
//! π·(r_{i+1}² − r_i²)·(ρ_{i+1} + ρ_i)/2
//! ```

use std::f64::consts::PI;

/// One value per consecutive pair of `radii` (length `radii.len() − 1`).
///
/// `radii` must be sorted ascending and `density` must have the same length.
pub fn annulus_trapezoid(radii: &[f64], density: &[f64]) -> Vec<f64> {
    debug_assert_eq!(radii.len(), density.len());
    radii
        .windows(2)
        .zip(density.windows(2))
        .map(|(r, d)| PI * (r[1] * r[1] - r[0] * r[0]) * (d[1] + d[0]) / 2.0)
        .collect()
}
