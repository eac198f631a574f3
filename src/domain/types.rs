//! Shared domain types.
//!
//! These types are kept lightweight and serializable so they can be:
//!
//! - built in memory by the simulator side and borrowed by the fitter
//! - deserialized from simulator JSON dumps
//! - handed to reporting code as plain data

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::ApsfError;

/// Reference surface pressure (mbar) used to normalize the pressure predictor.
pub const REFERENCE_PRESSURE: f64 = 1013.25;

/// Names of the stored annular coefficients, in order.
pub const COEFFICIENT_NAMES: [&str; 6] = ["c1", "c2", "c3", "c4", "c5", "c6"];

/// Acquisition parameters of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationMeta {
    /// Surface pressure (mbar).
    pub pressure: f64,
    /// Aerosol optical extinction.
    pub extinction: f64,
    /// Sensor zenith angle (degrees).
    pub sensor_zenith: f64,
    /// Sensor field of view (degrees).
    pub sensor_fov: f64,
    /// Sensor position `[x, y, z]` (km).
    pub sensor_position: [f64; 3],
    /// Radial resolution of the binning (km).
    pub resolution: f64,
}

impl Default for SimulationMeta {
    fn default() -> Self {
        Self {
            pressure: REFERENCE_PRESSURE,
            extinction: 0.1,
            sensor_zenith: 0.0,
            sensor_fov: 0.0,
            sensor_position: [0.0, 0.0, 800.0],
            resolution: 1.0,
        }
    }
}

/// Binned photon weights of one backward Monte-Carlo run (annular binning).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub bin_edges: Vec<f64>,
    pub bin_mid: Vec<f64>,
    pub weights: Vec<f64>,
    pub meta: SimulationMeta,
}

impl Histogram {
    /// Build a validated histogram.
    pub fn new(
        bin_edges: Vec<f64>,
        bin_mid: Vec<f64>,
        weights: Vec<f64>,
        meta: SimulationMeta,
    ) -> Result<Self, ApsfError> {
        let hist = Self {
            bin_edges,
            bin_mid,
            weights,
            meta,
        };
        hist.validate()?;
        Ok(hist)
    }

    /// Build a histogram from edges and weights, deriving the bin midpoints.
    pub fn from_edges(
        bin_edges: Vec<f64>,
        weights: Vec<f64>,
        meta: SimulationMeta,
    ) -> Result<Self, ApsfError> {
        let bin_mid = bin_edges.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect();
        Self::new(bin_edges, bin_mid, weights, meta)
    }

    /// Number of bins.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Check the structural invariants of the binning.
    pub fn validate(&self) -> Result<(), ApsfError> {
        let n = self.weights.len();
        if n == 0 {
            return Err(ApsfError::InvalidHistogram("histogram has no bins".into()));
        }
        if self.bin_edges.len() != n + 1 || self.bin_mid.len() != n {
            return Err(ApsfError::InvalidHistogram(format!(
                "length mismatch: edges={}, midpoints={}, weights={n}",
                self.bin_edges.len(),
                self.bin_mid.len()
            )));
        }
        if self.bin_edges[0] != 0.0 {
            return Err(ApsfError::InvalidHistogram(format!(
                "first bin edge must be 0, got {}",
                self.bin_edges[0]
            )));
        }
        if self.bin_edges.windows(2).any(|w| !(w[1] > w[0]) || !w[1].is_finite()) {
            return Err(ApsfError::InvalidHistogram(
                "bin edges must be finite and strictly increasing".into(),
            ));
        }
        if let Some(i) = self.weights.iter().position(|w| !w.is_finite()) {
            return Err(ApsfError::InvalidHistogram(format!(
                "non-finite weight at bin {i}"
            )));
        }
        if !(self.meta.pressure.is_finite() && self.meta.pressure > 0.0) {
            return Err(ApsfError::InvalidHistogram(format!(
                "surface pressure must be finite and > 0, got {}",
                self.meta.pressure
            )));
        }
        Ok(())
    }
}

/// Geometry family of a fitted model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Geometry {
    Annular,
    Sectorial,
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Geometry::Annular => write!(f, "annular"),
            Geometry::Sectorial => write!(f, "sectorial"),
        }
    }
}

/// Which field the predictor evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// Cumulative APSF `F(r)`.
    Cumulative,
    /// Areal density `dF/dr / (2πr)`.
    Density,
    /// Integrated PSF per annulus between consecutive radii.
    Psf,
}

impl OutputKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputKind::Cumulative => "cumulative",
            OutputKind::Density => "density",
            OutputKind::Psf => "psf",
        }
    }
}

impl FromStr for OutputKind {
    type Err = ApsfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cumulative" => Ok(OutputKind::Cumulative),
            "density" => Ok(OutputKind::Density),
            "psf" => Ok(OutputKind::Psf),
            _ => Err(ApsfError::UnsupportedKind(s.to_string())),
        }
    }
}

/// Convergence codes reported in [`FittedModel::status`].
pub mod status {
    /// The simplex collapsed below the cost tolerance.
    pub const CONVERGED: i32 = 0;
    /// The solver stopped for a reason other than convergence or the budget.
    pub const STOPPED: i32 = 1;
    /// The iteration budget ran out before convergence.
    pub const MAX_ITERS: i32 = 2;
}

/// Closed-form surrogate produced by the fitter.
///
/// Immutable once built; every prediction borrows it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedModel {
    #[serde(rename = "type")]
    pub geometry: Geometry,
    /// Named coefficients (`c1..c6` for annular models).
    pub coefficients: BTreeMap<String, f64>,
    /// Minimum mean absolute relative error over all starts.
    pub mare: f64,
    /// Root-mean-square error of the best parameters.
    pub rmse: f64,
    /// MARE of every optimizer start, sorted descending.
    pub mare_trace: Vec<f64>,
    /// Convergence code of the best start (see [`status`]).
    pub status: i32,
    pub pressure_dependent: bool,
    /// `[min, max]` surface pressure (mbar) spanned by the fitted data.
    pub pressure_range: [f64; 2],
}

impl FittedModel {
    pub fn coefficient(&self, name: &str) -> Result<f64, ApsfError> {
        self.coefficients
            .get(name)
            .copied()
            .ok_or_else(|| ApsfError::MissingCoefficient(name.to_string()))
    }

    /// Inclusive check against the fitted pressure range.
    pub fn pressure_in_range(&self, pressure: f64) -> bool {
        pressure >= self.pressure_range[0] && pressure <= self.pressure_range[1]
    }
}

/// Non-fatal conditions surfaced alongside results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// Pressure dependence was requested but only one histogram was supplied;
    /// the fit proceeded without pressure dependence.
    SinglePressureHistogram,
    /// Several histograms were supplied without pressure dependence; only the
    /// first one was fitted.
    ExtraHistogramsIgnored { ignored: usize },
    /// Prediction pressure lies outside the fitted range.
    PressureExtrapolation { pressure: f64, range: [f64; 2] },
    /// A pressure was supplied to a model without pressure dependence.
    PressureIgnored { pressure: f64 },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::SinglePressureHistogram => write!(
                f,
                "multiple histograms expected for a pressure-dependent fit; only one supplied, pressure dependence disabled"
            ),
            Warning::ExtraHistogramsIgnored { ignored } => write!(
                f,
                "pressure dependence disabled; {ignored} extra histogram(s) ignored, fitting the first only"
            ),
            Warning::PressureExtrapolation { pressure, range } => write!(
                f,
                "pressure {pressure} mbar outside fitted range [{}, {}] mbar; extrapolating",
                range[0], range[1]
            ),
            Warning::PressureIgnored { pressure } => write!(
                f,
                "model has no pressure dependence; pressure {pressure} mbar ignored"
            ),
        }
    }
}

/// Warnings collected during a fit or prediction.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    pub warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning and mirror it to the log.
    pub fn warn(&mut self, warning: Warning) {
        log::warn!("{warning}");
        self.warnings.push(warning);
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_edges_derives_midpoints() {
        let h = Histogram::from_edges(vec![0.0, 1.0, 3.0], vec![0.5, 0.5], SimulationMeta::default())
            .unwrap();
        assert_eq!(h.bin_mid, vec![0.5, 2.0]);
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn validate_rejects_bad_binning() {
        let meta = SimulationMeta::default();
        let err = Histogram::from_edges(vec![0.5, 1.0], vec![1.0], meta.clone()).unwrap_err();
        assert!(matches!(err, ApsfError::InvalidHistogram(_)));

        let err = Histogram::from_edges(vec![0.0, 2.0, 1.0], vec![1.0, 1.0], meta.clone()).unwrap_err();
        assert!(matches!(err, ApsfError::InvalidHistogram(_)));

        let err = Histogram::new(vec![0.0, 1.0], vec![0.5], vec![1.0, 2.0], meta).unwrap_err();
        assert!(matches!(err, ApsfError::InvalidHistogram(_)));
    }

    #[test]
    fn output_kind_parses_known_names_only() {
        assert_eq!("psf".parse::<OutputKind>().unwrap(), OutputKind::Psf);
        assert_eq!(" Density ".parse::<OutputKind>().unwrap(), OutputKind::Density);
        let err = "flux".parse::<OutputKind>().unwrap_err();
        assert_eq!(err, ApsfError::UnsupportedKind("flux".into()));
    }

    #[test]
    fn pressure_range_is_inclusive() {
        let model = FittedModel {
            geometry: Geometry::Annular,
            coefficients: BTreeMap::new(),
            mare: 0.0,
            rmse: 0.0,
            mare_trace: vec![],
            status: status::CONVERGED,
            pressure_dependent: true,
            pressure_range: [800.0, 1013.25],
        };
        assert!(model.pressure_in_range(800.0));
        assert!(model.pressure_in_range(1013.25));
        assert!(!model.pressure_in_range(1013.26));
        assert!(matches!(
            model.coefficient("c1"),
            Err(ApsfError::MissingCoefficient(_))
        ));
    }
}
