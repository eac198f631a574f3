//! Shared fit pipeline used by every subcommand.
//!
//! load/synthesize histograms -> fit -> (optional) predict
//!
//! The subcommands then only deal with presentation.

use std::path::PathBuf;

use crate::data::{SyntheticSpec, demo_coefficients, synthesize_histogram};
use crate::domain::{Histogram, OutputKind, SimulationMeta};
use crate::error::AppError;
use crate::fit::{FitOptions, FitOutcome, fit_annular};
use crate::io::read_histogram_json;
use crate::models::AnnularCoefficients;
use crate::predict::{Prediction, predict};

/// Outputs of `apsf fit`.
#[derive(Debug, Clone)]
pub struct FitRun {
    pub histograms: Vec<Histogram>,
    pub fit: FitOutcome,
}

/// Outputs of `apsf demo`.
#[derive(Debug, Clone)]
pub struct DemoRun {
    pub truth: AnnularCoefficients,
    pub histograms: Vec<Histogram>,
    pub fit: FitOutcome,
}

/// Read every histogram file and fit them.
pub fn run_fit(paths: &[PathBuf], opts: &FitOptions) -> Result<FitRun, AppError> {
    let histograms = paths
        .iter()
        .map(|p| read_histogram_json(p))
        .collect::<Result<Vec<_>, _>>()?;
    log::info!("loaded {} histogram(s)", histograms.len());

    let fit = fit_annular(&histograms, opts)?;
    Ok(FitRun { histograms, fit })
}

/// Fit a synthetic histogram built from the demo coefficients.
pub fn run_demo(spec: &SyntheticSpec, opts: &FitOptions) -> Result<DemoRun, AppError> {
    let truth = demo_coefficients();
    let hist = synthesize_histogram(&truth, spec, SimulationMeta::default())?;
    let histograms = vec![hist];

    let fit = fit_annular(&histograms, opts)?;
    Ok(DemoRun {
        truth,
        histograms,
        fit,
    })
}

/// Evaluate a fitted model; non-finite output is a numeric failure.
pub fn evaluate(
    model: &crate::domain::FittedModel,
    radii: &[f64],
    kind: OutputKind,
    pressure: Option<f64>,
) -> Result<Prediction, AppError> {
    let prediction = predict(radii, model, kind, pressure, None)?;
    let skip_origin = kind == OutputKind::Density;
    let bad = prediction
        .values
        .iter()
        .zip(radii)
        .any(|(v, r)| !v.is_finite() && !(skip_origin && *r == 0.0));
    if bad {
        return Err(AppError::new(4, "Non-finite model prediction."));
    }
    Ok(prediction)
}
