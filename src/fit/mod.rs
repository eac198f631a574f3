//! Annular fitting.
//!
//! Responsibilities:
//!
//! - turn histograms into cumulative samples (`dataset`)
//! - score candidate parameters (`objective`)
//! - search the parameter space from several starts (`optimizer`)
//! - assemble the fitted model record (`fitter`)

pub mod dataset;
pub mod fitter;
pub mod objective;
pub mod optimizer;

pub use dataset::*;
pub use fitter::*;
pub use objective::*;
pub use optimizer::*;
