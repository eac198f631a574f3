//! Command-line parsing for the APSF surrogate fitter.
//!
//! Argument parsing and command dispatch stay separate from the fitting and
//! prediction code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::OutputKind;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "apsf", version, about = "Atmospheric PSF surrogate fitter")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit a model to simulator histograms (JSON) and optionally evaluate it.
    Fit(FitArgs),
    /// Fit a synthetic histogram built from known coefficients.
    Demo(DemoArgs),
}

/// Optimizer options shared by every subcommand.
#[derive(Debug, Args, Clone)]
pub struct OptimizerArgs {
    /// Number of random optimizer starts (after the deterministic one).
    #[arg(long, default_value_t = 20)]
    pub nstart: usize,

    /// Seed of the random starts.
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Iteration budget per start.
    #[arg(long, default_value_t = 20_000)]
    pub max_iters: u64,

    /// Run optimizer starts sequentially.
    #[arg(long)]
    pub serial: bool,
}

/// Options for `apsf fit`.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Histogram JSON file(s); several files for a pressure-dependent fit.
    #[arg(long = "hist", value_name = "JSON", required = true, num_args = 1..)]
    pub hist: Vec<PathBuf>,

    /// Fit the pressure-scaled fast term across histograms.
    #[arg(long)]
    pub pressure_dependent: bool,

    /// Fit raw weights instead of L1-normalized ones.
    #[arg(long)]
    pub no_normalize: bool,

    #[command(flatten)]
    pub optimizer: OptimizerArgs,

    /// Output kind to evaluate at `--radii`.
    #[arg(long, value_enum, default_value_t = OutputKind::Cumulative)]
    pub kind: OutputKind,

    /// Radii to evaluate the fitted model at (comma separated).
    #[arg(long, value_delimiter = ',')]
    pub radii: Vec<f64>,

    /// Surface pressure (mbar) for pressure-dependent models.
    #[arg(long)]
    pub pressure: Option<f64>,
}

/// Options for `apsf demo`.
#[derive(Debug, Parser, Clone)]
pub struct DemoArgs {
    /// Number of radial bins.
    #[arg(long, default_value_t = 50)]
    pub bins: usize,

    /// Outer radius of the last bin.
    #[arg(long, default_value_t = 25.0)]
    pub rmax: f64,

    /// Log-normal noise level applied to the bin weights.
    #[arg(long, default_value_t = 0.0)]
    pub noise: f64,

    /// Seed of the synthetic noise.
    #[arg(long, default_value_t = 42)]
    pub noise_seed: u64,

    #[command(flatten)]
    pub optimizer: OptimizerArgs,

    /// Output kind evaluated on the histogram's bin edges.
    #[arg(long, value_enum, default_value_t = OutputKind::Psf)]
    pub kind: OutputKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_parses_files_radii_and_pressure() {
        let cli = Cli::try_parse_from([
            "apsf",
            "fit",
            "--hist",
            "a.json",
            "b.json",
            "--pressure-dependent",
            "--radii",
            "0,1.5,3",
            "--kind",
            "psf",
            "--pressure",
            "900",
            "--nstart",
            "4",
            "--serial",
        ])
        .unwrap();
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(args.hist.len(), 2);
        assert!(args.pressure_dependent);
        assert_eq!(args.radii, vec![0.0, 1.5, 3.0]);
        assert_eq!(args.kind, OutputKind::Psf);
        assert_eq!(args.pressure, Some(900.0));
        assert_eq!(args.optimizer.nstart, 4);
        assert!(args.optimizer.serial);
    }

    #[test]
    fn fit_requires_a_histogram() {
        assert!(Cli::try_parse_from(["apsf", "fit"]).is_err());
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert!(Cli::try_parse_from(["apsf", "demo", "--kind", "flux"]).is_err());
    }

    #[test]
    fn demo_defaults() {
        let cli = Cli::try_parse_from(["apsf", "demo"]).unwrap();
        let Command::Demo(args) = cli.command else {
            panic!("expected demo");
        };
        assert_eq!(args.bins, 50);
        assert_eq!(args.kind, OutputKind::Psf);
        assert_eq!(args.optimizer.nstart, 20);
    }
}
