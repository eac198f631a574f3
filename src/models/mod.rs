//! Closed-form surrogate models.
//!
//! Models are small, pure functions of their coefficients so that the fitter
//! and the predictor share one evaluator.

pub mod model;

pub use model::*;
