//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the real main that:
//! - parses CLI arguments
//! - loads or synthesizes histograms
//! - runs the fit
//! - prints the model summary and optional predictions

use clap::Parser;

use crate::cli::{Command, DemoArgs, FitArgs, OptimizerArgs};
use crate::error::AppError;
use crate::fit::FitOptions;

pub mod pipeline;

/// Entry point for the `apsf` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Demo(args) => handle_demo(args),
    }
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let opts = fit_options_from_args(&args.optimizer, !args.no_normalize, args.pressure_dependent);
    let run = pipeline::run_fit(&args.hist, &opts)?;

    println!(
        "{}",
        crate::report::format_fit_summary(&run.fit.model, &run.fit.diagnostics)
    );

    if !args.radii.is_empty() {
        let prediction = pipeline::evaluate(&run.fit.model, &args.radii, args.kind, args.pressure)?;
        print_prediction(&args.radii, &prediction, args.kind);
    }

    Ok(())
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    let opts = fit_options_from_args(&args.optimizer, true, false);
    let spec = crate::data::SyntheticSpec {
        bins: args.bins,
        r_max: args.rmax,
        noise: args.noise,
        seed: args.noise_seed,
    };
    let run = pipeline::run_demo(&spec, &opts)?;

    println!("Ground truth: {}", fmt_truth(&run.truth));
    println!(
        "{}",
        crate::report::format_fit_summary(&run.fit.model, &run.fit.diagnostics)
    );

    let radii = &run.histograms[0].bin_edges;
    let prediction = pipeline::evaluate(&run.fit.model, radii, args.kind, None)?;
    print_prediction(radii, &prediction, args.kind);

    Ok(())
}

fn print_prediction(radii: &[f64], prediction: &crate::predict::Prediction, kind: crate::domain::OutputKind) {
    for w in &prediction.diagnostics.warnings {
        eprintln!("warning: {w}");
    }
    println!("{}", crate::report::format_prediction(radii, &prediction.values, kind));
}

fn fmt_truth(c: &crate::models::AnnularCoefficients) -> String {
    let parts: Vec<String> = c.as_array().iter().map(|x| format!("{x:.4}")).collect();
    format!("[{}]", parts.join(", "))
}

pub fn fit_options_from_args(args: &OptimizerArgs, normalize: bool, pressure_dependence: bool) -> FitOptions {
    FitOptions {
        normalize,
        pressure_dependence,
        nstart: args.nstart,
        seed: args.seed,
        max_iters: args.max_iters,
        parallel: !args.serial,
        ..FitOptions::default()
    }
}
