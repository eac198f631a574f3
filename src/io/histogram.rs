//! Read simulator histogram dumps (JSON).
//!
//! One file holds one run:
//!
//! ```json
//! {
//!   "bin_edges": [0.0, 1.0, 2.0],
//!   "bin_mid": [0.5, 1.5],
//!   "weights": [0.7, 0.3],
//!   "meta": {
//!     "pressure": 1013.25, "extinction": 0.1, "sensor_zenith": 0.0,
//!     "sensor_fov": 0.0, "sensor_position": [0.0, 0.0, 800.0], "resolution": 1.0
//!   }
//! }
//! ```
//!
//! `bin_mid` may be omitted; it is then derived from the edges.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::domain::{Histogram, SimulationMeta};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
struct HistogramFile {
    bin_edges: Vec<f64>,
    #[serde(default)]
    bin_mid: Option<Vec<f64>>,
    weights: Vec<f64>,
    meta: SimulationMeta,
}

/// Parse and validate one histogram from JSON text.
pub fn parse_histogram_json(text: &str) -> Result<Histogram, AppError> {
    let raw: HistogramFile =
        serde_json::from_str(text).map_err(|e| AppError::new(2, format!("Invalid histogram JSON: {e}")))?;
    let hist = match raw.bin_mid {
        Some(mid) => Histogram::new(raw.bin_edges, mid, raw.weights, raw.meta),
        None => Histogram::from_edges(raw.bin_edges, raw.weights, raw.meta),
    }?;
    Ok(hist)
}

/// Read one histogram JSON file.
pub fn read_histogram_json(path: &Path) -> Result<Histogram, AppError> {
    let mut file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open histogram '{}': {e}", path.display())))?;
    let mut text = String::new();
    file.read_to_string(&mut text)
        .map_err(|e| AppError::new(2, format!("Failed to read histogram '{}': {e}", path.display())))?;
    parse_histogram_json(&text)
        .map_err(|e| AppError::new(e.exit_code(), format!("{}: {e}", path.display())))
}
