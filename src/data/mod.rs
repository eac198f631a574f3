//! Synthetic input generation.

pub mod synthetic;

pub use synthetic::*;
