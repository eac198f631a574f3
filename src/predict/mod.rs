//! Prediction from fitted models.
//!
//! [`Predictor::predict`] is the single entry point:
//!
//! - resolves the surface pressure (reference value, required value, or
//!   extrapolation warning) from the model's pressure dependence
//! - dispatches on the model's geometry tag to the registered evaluator
//!
//! Warnings come back in [`Prediction::diagnostics`] rather than through a
//! global channel, so callers can assert on them.

use std::collections::BTreeMap;

use crate::domain::{Diagnostics, FittedModel, Geometry, OutputKind, REFERENCE_PRESSURE, Warning};
use crate::error::ApsfError;

pub mod annular;

pub use annular::AnnularEvaluator;

/// Full-circle azimuth span (degrees) handed to sectorial evaluators.
pub const FULL_CIRCLE: (f64, f64) = (0.0, 360.0);

/// Resolved inputs shared by every evaluator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalContext {
    /// Surface pressure over [`REFERENCE_PRESSURE`].
    pub pressure_ratio: f64,
    /// Azimuth span in degrees (sectorial families only).
    pub azimuth_span: Option<(f64, f64)>,
    /// Optional third predictor, forwarded untouched.
    pub third: Option<f64>,
}

/// Evaluator of one geometry family.
pub trait FamilyEvaluator: Send + Sync {
    fn evaluate(
        &self,
        radii: &[f64],
        model: &FittedModel,
        kind: OutputKind,
        ctx: &EvalContext,
    ) -> Result<Vec<f64>, ApsfError>;
}

/// Evaluated field plus the warnings raised while producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub values: Vec<f64>,
    pub diagnostics: Diagnostics,
}

/// Geometry-tag dispatcher.
pub struct Predictor {
    families: BTreeMap<Geometry, Box<dyn FamilyEvaluator>>,
}

impl Default for Predictor {
    fn default() -> Self {
        Self::new().with_family(Geometry::Annular, Box::new(AnnularEvaluator::default()))
    }
}

impl Predictor {
    /// Empty dispatcher with no families registered.
    pub fn new() -> Self {
        Self {
            families: BTreeMap::new(),
        }
    }

    /// Register (or replace) the evaluator of a geometry family.
    pub fn with_family(mut self, geometry: Geometry, evaluator: Box<dyn FamilyEvaluator>) -> Self {
        self.families.insert(geometry, evaluator);
        self
    }

    pub fn predict(
        &self,
        radii: &[f64],
        model: &FittedModel,
        kind: OutputKind,
        pressure: Option<f64>,
        third: Option<f64>,
    ) -> Result<Prediction, ApsfError> {
        if let Some(r) = radii.iter().find(|r| !r.is_finite()) {
            return Err(ApsfError::InvalidRadii(format!("non-finite radius {r}")));
        }
        if let Some(r) = radii.iter().find(|r| **r < 0.0) {
            return Err(ApsfError::InvalidRadii(format!("negative radius {r}")));
        }

        let mut diagnostics = Diagnostics::default();
        let pressure = resolve_pressure(model, pressure, &mut diagnostics)?;

        let evaluator = self
            .families
            .get(&model.geometry)
            .ok_or(ApsfError::UnsupportedGeometry(model.geometry))?;
        let ctx = EvalContext {
            pressure_ratio: pressure / REFERENCE_PRESSURE,
            azimuth_span: match model.geometry {
                Geometry::Annular => None,
                Geometry::Sectorial => Some(FULL_CIRCLE),
            },
            third,
        };

        let values = evaluator.evaluate(radii, model, kind, &ctx)?;
        Ok(Prediction { values, diagnostics })
    }
}

/// Surface pressure (mbar) to evaluate `model` at.
fn resolve_pressure(
    model: &FittedModel,
    pressure: Option<f64>,
    diagnostics: &mut Diagnostics,
) -> Result<f64, ApsfError> {
    if !model.pressure_dependent {
        if let Some(p) = pressure {
            diagnostics.warn(Warning::PressureIgnored { pressure: p });
        }
        return Ok(REFERENCE_PRESSURE);
    }

    let p = pressure.ok_or(ApsfError::MissingParameter { name: "pressure" })?;
    if !(p.is_finite() && p > 0.0) {
        return Err(ApsfError::InvalidPressure(p));
    }
    if !model.pressure_in_range(p) {
        diagnostics.warn(Warning::PressureExtrapolation {
            pressure: p,
            range: model.pressure_range,
        });
    }
    Ok(p)
}

/// Predict with the default dispatcher (annular family only).
pub fn predict(
    radii: &[f64],
    model: &FittedModel,
    kind: OutputKind,
    pressure: Option<f64>,
    third: Option<f64>,
) -> Result<Prediction, ApsfError> {
    Predictor::default().predict(radii, model, kind, pressure, third)
}
