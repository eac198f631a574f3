//! Domain types used throughout the engine.
//!
//! This module defines:
//!
//! - the simulator input record (`Histogram`, `SimulationMeta`)
//! - the fitted surrogate (`FittedModel`, `Geometry`)
//! - prediction selectors and structured diagnostics (`OutputKind`, `Warning`)

pub mod types;

pub use types::*;
