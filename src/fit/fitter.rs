//! Annular fit: histograms in, closed-form surrogate out.
//!
//! Given one or more histograms we:
//! - build the cumulative fit set (normalization, consistency, extraction)
//! - minimize the MARE of the exponential decomposition from several starts
//! - relabel the best raw parameters into the stored coefficients `c1..c6`
//!
//! Optimizer non-convergence is not an error: it shows up in
//! `FittedModel::status`, which callers should inspect.

use crate::domain::{Diagnostics, FittedModel, Geometry, Histogram};
use crate::error::ApsfError;
use crate::fit::dataset::prepare;
use crate::fit::objective::ExpDecomposition;
use crate::fit::optimizer::{Minimizer, MultiStart, NelderMeadMinimizer, multi_start};
use crate::models::AnnularCoefficients;

/// Options that affect how a model is fitted.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOptions {
    /// L1-normalize each histogram before fitting (`c1` becomes 1).
    pub normalize: bool,
    /// Fit the pressure-scaled fast term across several histograms.
    pub pressure_dependence: bool,
    /// Number of random starts after the deterministic one.
    pub nstart: usize,
    /// Seed of the random starts; fix it for reproducible fits.
    pub seed: u64,
    /// Iteration budget per start.
    pub max_iters: u64,
    /// Simplex cost standard deviation at which a start counts as converged.
    pub sd_tolerance: f64,
    /// Run starts in parallel.
    pub parallel: bool,
}

impl Default for FitOptions {
    fn default() -> Self {
        let nm = NelderMeadMinimizer::default();
        Self {
            normalize: true,
            pressure_dependence: false,
            nstart: 20,
            seed: 0,
            max_iters: nm.max_iters,
            sd_tolerance: nm.sd_tolerance,
            parallel: true,
        }
    }
}

/// Fitted model plus the warnings raised while fitting it.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOutcome {
    pub model: FittedModel,
    pub diagnostics: Diagnostics,
}

/// Fit an annular model with the default Nelder–Mead minimizer.
pub fn fit_annular(histograms: &[Histogram], opts: &FitOptions) -> Result<FitOutcome, ApsfError> {
    let minimizer = NelderMeadMinimizer {
        max_iters: opts.max_iters,
        sd_tolerance: opts.sd_tolerance,
    };
    fit_annular_with(histograms, opts, &minimizer)
}

/// Fit an annular model with a caller-supplied local minimizer.
pub fn fit_annular_with(
    histograms: &[Histogram],
    opts: &FitOptions,
    minimizer: &dyn Minimizer,
) -> Result<FitOutcome, ApsfError> {
    let mut diagnostics = Diagnostics::default();
    let data = prepare(
        histograms,
        opts.normalize,
        opts.pressure_dependence,
        &mut diagnostics,
    )?;

    let objective = ExpDecomposition::new(&data);
    let settings = MultiStart {
        nstart: opts.nstart,
        seed: opts.seed,
        parallel: opts.parallel,
    };
    let outcome = multi_start(&objective, minimizer, &settings)?;

    let coefficients = AnnularCoefficients::from_raw(&outcome.best.x, data.finf);
    let model = FittedModel {
        geometry: Geometry::Annular,
        coefficients: coefficients.to_map(),
        mare: outcome.best.value,
        rmse: objective.rmse(&outcome.best.x),
        mare_trace: outcome.trace,
        status: outcome.best.status,
        pressure_dependent: data.pressure_dependent,
        pressure_range: data.pressure_range,
    };

    log::info!(
        "annular fit: mare={:.4e} rmse={:.4e} status={} starts={}",
        model.mare,
        model.rmse,
        model.status,
        opts.nstart + 1
    );

    Ok(FitOutcome { model, diagnostics })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::synthetic::{SyntheticSpec, synthesize_histogram};
    use crate::domain::{OutputKind, REFERENCE_PRESSURE, SimulationMeta, Warning};
    use crate::fit::optimizer::Minimum;
    use crate::predict::predict;

    fn uniform_histogram() -> Histogram {
        let edges: Vec<f64> = (0..=10).map(|i| i as f64).collect();
        Histogram::from_edges(edges, vec![0.1; 10], SimulationMeta::default()).unwrap()
    }

    #[test]
    fn uniform_bins_fit_end_to_end() {
        let opts = FitOptions {
            nstart: 5,
            seed: 3,
            ..FitOptions::default()
        };
        let fit = fit_annular(&[uniform_histogram()], &opts).unwrap();
        let model = &fit.model;

        assert_eq!(model.geometry, Geometry::Annular);
        assert!((model.coefficients["c1"] - 1.0).abs() < 1e-12);
        assert!(model.mare < 0.05, "mare={}", model.mare);
        assert!(model.rmse.is_finite());
        assert_eq!(model.mare_trace.len(), 6);
        assert!(model.mare_trace.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(model.mare, *model.mare_trace.last().unwrap());
        assert!(!model.pressure_dependent);
        assert_eq!(model.pressure_range, [REFERENCE_PRESSURE; 2]);
        assert!(fit.diagnostics.is_empty());

        let cum = predict(&[10.0], model, OutputKind::Cumulative, None, None).unwrap();
        assert!((cum.values[0] - 1.0).abs() < 0.05, "F(10)={}", cum.values[0]);

        let radii = [0.0, 2.0, 4.0, 6.0, 8.0, 10.0];
        let psf = predict(&radii, model, OutputKind::Psf, None, None).unwrap();
        assert_eq!(psf.values.len(), 5);
        let total: f64 = psf.values.iter().sum();
        assert!((total - 1.0).abs() < 0.15, "psf total={total}");
    }

    #[test]
    fn expanded_amplitudes_reproduce_c1() {
        let fit = fit_annular(
            &[uniform_histogram()],
            &FitOptions {
                nstart: 2,
                ..FitOptions::default()
            },
        )
        .unwrap();
        let c = AnnularCoefficients::from_model(&fit.model).unwrap();
        let terms = c.expand(1.0);
        let sum: f64 = terms.amplitudes.iter().sum();
        assert!((sum - c.c1).abs() < 1e-9 * c.c1.abs().max(1.0));
    }

    #[test]
    fn recovers_synthetic_model() {
        let truth = AnnularCoefficients {
            c1: 1.0,
            c2: 0.35,
            c3: -0.9,
            c4: 0.6,
            c5: -0.3,
            c6: -0.15,
        };
        // F(r_max) is within 1e-4 of c1, so the empirical asymptote matches.
        let spec = SyntheticSpec {
            bins: 40,
            r_max: 60.0,
            noise: 0.0,
            seed: 0,
        };
        let hist = synthesize_histogram(&truth, &spec, SimulationMeta::default()).unwrap();
        let fit = fit_annular(
            &[hist],
            &FitOptions {
                nstart: 10,
                seed: 1,
                ..FitOptions::default()
            },
        )
        .unwrap();
        assert!(fit.model.mare < 0.05, "mare={}", fit.model.mare);
    }

    #[test]
    fn unnormalized_fit_keeps_total_transmittance() {
        let edges: Vec<f64> = (0..=10).map(|i| i as f64).collect();
        let hist = Histogram::from_edges(edges, vec![0.07; 10], SimulationMeta::default()).unwrap();
        let fit = fit_annular(
            &[hist],
            &FitOptions {
                normalize: false,
                nstart: 1,
                ..FitOptions::default()
            },
        )
        .unwrap();
        assert!((fit.model.coefficients["c1"] - 0.7).abs() < 1e-12);
    }

    #[test]
    fn pressure_dependent_fit_records_range() {
        let truth = AnnularCoefficients {
            c1: 1.0,
            c2: 0.3,
            c3: -0.8,
            c4: 0.5,
            c5: -0.2,
            c6: -0.04,
        };
        let spec = SyntheticSpec {
            bins: 30,
            r_max: 30.0,
            noise: 0.0,
            seed: 0,
        };
        let low = synthesize_histogram(
            &truth,
            &spec,
            SimulationMeta {
                pressure: 800.0,
                ..SimulationMeta::default()
            },
        )
        .unwrap();
        let high = synthesize_histogram(&truth, &spec, SimulationMeta::default()).unwrap();

        let fit = fit_annular(
            &[low, high],
            &FitOptions {
                pressure_dependence: true,
                nstart: 4,
                ..FitOptions::default()
            },
        )
        .unwrap();
        assert!(fit.model.pressure_dependent);
        assert_eq!(fit.model.pressure_range, [800.0, REFERENCE_PRESSURE]);
        assert!(fit.diagnostics.is_empty());
    }

    #[test]
    fn single_histogram_pressure_mode_is_not_fatal() {
        let fit = fit_annular(
            &[uniform_histogram()],
            &FitOptions {
                pressure_dependence: true,
                nstart: 1,
                ..FitOptions::default()
            },
        )
        .unwrap();
        assert!(!fit.model.pressure_dependent);
        assert_eq!(
            fit.diagnostics.warnings,
            vec![Warning::SinglePressureHistogram]
        );
    }

    #[test]
    fn fov_mismatch_aborts_pressure_fit() {
        let a = uniform_histogram();
        let mut b = uniform_histogram();
        b.meta.pressure = 850.0;
        b.meta.sensor_fov = 5.0;
        let err = fit_annular(
            &[a, b],
            &FitOptions {
                pressure_dependence: true,
                ..FitOptions::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, ApsfError::Configuration { index: 1, .. }));
    }

    #[test]
    fn fixed_seed_is_reproducible() {
        let opts = FitOptions {
            nstart: 3,
            seed: 42,
            ..FitOptions::default()
        };
        let a = fit_annular(&[uniform_histogram()], &opts).unwrap();
        let b = fit_annular(&[uniform_histogram()], &opts).unwrap();
        assert_eq!(a, b);
    }

    struct Fixed;

    impl Minimizer for Fixed {
        fn minimize(
            &self,
            objective: &dyn crate::fit::objective::Objective,
            x0: &[f64],
        ) -> Result<Minimum, ApsfError> {
            Ok(Minimum {
                x: x0.to_vec(),
                value: objective.cost(x0),
                status: crate::domain::status::STOPPED,
                iterations: 0,
            })
        }
    }

    #[test]
    fn minimizer_is_injectable() {
        let fit = fit_annular_with(
            &[uniform_histogram()],
            &FitOptions {
                nstart: 0,
                ..FitOptions::default()
            },
            &Fixed,
        )
        .unwrap();
        let c = AnnularCoefficients::from_model(&fit.model).unwrap();
        assert_eq!(
            [c.c2, c.c3, c.c4, c.c5, c.c6],
            crate::fit::optimizer::FIRST_START
        );
        assert_eq!(fit.model.status, crate::domain::status::STOPPED);
        assert_eq!(fit.model.mare_trace.len(), 1);
    }
}
