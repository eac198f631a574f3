//! `apsf-fit` library crate.
//!
//! Fits closed-form exponential surrogates of the atmospheric point spread
//! function (APSF) to Monte-Carlo radiative-transfer histograms, and evaluates
//! them as cumulative fields, areal densities or per-annulus PSF values.
//!
//! The binary (`apsf`) is a thin wrapper around this library so the engine is
//! testable without spawning processes.

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod predict;
pub mod report;
