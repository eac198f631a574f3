//! Annular evaluator: cumulative field, areal density and PSF per annulus.

use std::f64::consts::PI;

use crate::domain::{FittedModel, OutputKind};
use crate::error::ApsfError;
use crate::math::{CentralDifference, Derivative, annulus_trapezoid, gradient};
use crate::models::AnnularCoefficients;
use crate::predict::{EvalContext, FamilyEvaluator};

/// Evaluates annular models; the derivative estimator is pluggable.
pub struct AnnularEvaluator {
    derivative: Box<dyn Derivative>,
}

impl Default for AnnularEvaluator {
    fn default() -> Self {
        Self::new(Box::new(CentralDifference::default()))
    }
}

impl AnnularEvaluator {
    pub fn new(derivative: Box<dyn Derivative>) -> Self {
        Self { derivative }
    }

    /// `F(r)` at every radius.
    pub fn cumulative(&self, coeffs: &AnnularCoefficients, radii: &[f64], p: f64) -> Vec<f64> {
        radii.iter().map(|&r| coeffs.cumulative(r, p)).collect()
    }

    /// `dF/dr / (2πr)` at every radius.
    ///
    /// At `r = 0` the division gives an infinite or NaN value; the PSF path
    /// never uses it.
    pub fn density(&self, coeffs: &AnnularCoefficients, radii: &[f64], p: f64) -> Vec<f64> {
        let f = |r: f64| coeffs.cumulative(r, p);
        gradient(self.derivative.as_ref(), &f, radii)
            .into_iter()
            .zip(radii.iter())
            .map(|(slope, &r)| slope / (2.0 * PI * r))
            .collect()
    }

    /// Integrated PSF between consecutive (sorted) radii.
    ///
    /// Radii are sorted first; a duplicated radius gives a zero-width annulus
    /// with value 0.
    pub fn psf(&self, coeffs: &AnnularCoefficients, radii: &[f64], p: f64) -> Result<Vec<f64>, ApsfError> {
        if radii.len() < 2 {
            return Err(ApsfError::InvalidRadii(format!(
                "psf needs at least 2 radii, got {}",
                radii.len()
            )));
        }
        let mut sorted = radii.to_vec();
        sorted.sort_by(f64::total_cmp);

        let density = self.density(coeffs, &sorted, p);
        let mut out = annulus_trapezoid(&sorted, &density);
        if sorted[0] == 0.0 {
            // The innermost disc is evaluated directly instead of through the
            // singular density at the origin.
            out[0] = coeffs.cumulative(sorted[1], p);
        }
        Ok(out)
    }
}

impl FamilyEvaluator for AnnularEvaluator {
    fn evaluate(
        &self,
        radii: &[f64],
        model: &FittedModel,
        kind: OutputKind,
        ctx: &EvalContext,
    ) -> Result<Vec<f64>, ApsfError> {
        let coeffs = AnnularCoefficients::from_model(model)?;
        let p = ctx.pressure_ratio;
        match kind {
            OutputKind::Cumulative => Ok(self.cumulative(&coeffs, radii, p)),
            OutputKind::Density => Ok(self.density(&coeffs, radii, p)),
            OutputKind::Psf => self.psf(&coeffs, radii, p),
        }
    }
}
