//! Mathematical utilities: numeric differentiation and annular quadrature.

pub mod diff;
pub mod quadrature;

pub use diff::*;
pub use quadrature::*;
