//! Input helpers.
//!
//! - histogram JSON ingest + validation (`histogram`)

pub mod histogram;

pub use histogram::*;
