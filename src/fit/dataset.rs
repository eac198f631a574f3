//! Turn simulator histograms into the cumulative samples the objective scores.
//!
//! Steps, in order:
//!
//! - decide which histograms take part (pressure mode needs more than one)
//! - check that a pressure-dependent set shares its acquisition geometry
//! - L1-normalize private copies of the weights (optional)
//! - build prefix sums indexed by upper bin edge and concatenate them, with the
//!   normalized pressure replicated per sample
//!
//! The caller's histograms are only borrowed; nothing here mutates them.

use crate::domain::{Diagnostics, Histogram, REFERENCE_PRESSURE, SimulationMeta, Warning};
use crate::error::ApsfError;

/// Cumulative samples for one fit.
#[derive(Debug, Clone, PartialEq)]
pub struct CumulativeData {
    /// Upper bin edge of every sample.
    pub radii: Vec<f64>,
    /// Cumulative weight up to that edge.
    pub observed: Vec<f64>,
    /// Surface pressure over [`REFERENCE_PRESSURE`] for every sample.
    pub pressure: Vec<f64>,
    /// Largest observed cumulative value (the model asymptote).
    pub finf: f64,
    /// `[min, max]` surface pressure (mbar) of the histograms used.
    pub pressure_range: [f64; 2],
    /// Whether pressure dependence is actually fitted.
    pub pressure_dependent: bool,
}

impl CumulativeData {
    pub fn len(&self) -> usize {
        self.observed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observed.is_empty()
    }
}

/// Scale `weights` to unit sum.
pub fn normalize_weights(weights: &[f64]) -> Result<Vec<f64>, ApsfError> {
    let total: f64 = weights.iter().sum();
    if !(total.is_finite() && total != 0.0) {
        return Err(ApsfError::InvalidHistogram(format!(
            "cannot normalize weights with sum {total}"
        )));
    }
    Ok(weights.iter().map(|w| w / total).collect())
}

/// Running sum of `weights`, one value per upper bin edge.
///
/// The origin (radius 0, value 0) is not included.
pub fn cumulative_integral(weights: &[f64]) -> Vec<f64> {
    weights
        .iter()
        .scan(0.0, |acc, w| {
            *acc += w;
            Some(*acc)
        })
        .collect()
}

/// Exact comparison of the non-pressure acquisition parameters.
///
/// Returns the name of the first differing field.
pub fn geometry_mismatch(a: &SimulationMeta, b: &SimulationMeta) -> Option<&'static str> {
    if a.resolution != b.resolution {
        Some("resolution")
    } else if a.extinction != b.extinction {
        Some("extinction")
    } else if a.sensor_zenith != b.sensor_zenith {
        Some("sensor zenith")
    } else if a.sensor_fov != b.sensor_fov {
        Some("sensor field of view")
    } else if a.sensor_position != b.sensor_position {
        Some("sensor position")
    } else {
        None
    }
}

/// Fail if any histogram's geometry differs from the first one's.
pub fn check_consistency(histograms: &[Histogram]) -> Result<(), ApsfError> {
    let Some((first, rest)) = histograms.split_first() else {
        return Ok(());
    };
    for (i, h) in rest.iter().enumerate() {
        if let Some(field) = geometry_mismatch(&first.meta, &h.meta) {
            return Err(ApsfError::Configuration { index: i + 1, field });
        }
    }
    Ok(())
}

/// Build the fit set from `histograms`.
pub fn prepare(
    histograms: &[Histogram],
    normalize: bool,
    pressure_dependence: bool,
    diagnostics: &mut Diagnostics,
) -> Result<CumulativeData, ApsfError> {
    if histograms.is_empty() {
        return Err(ApsfError::EmptyInput);
    }
    for h in histograms {
        h.validate()?;
    }

    let pressure_dependent = pressure_dependence && histograms.len() > 1;
    let used: &[Histogram] = if pressure_dependent {
        check_consistency(histograms)?;
        histograms
    } else {
        if pressure_dependence {
            diagnostics.warn(Warning::SinglePressureHistogram);
        } else if histograms.len() > 1 {
            diagnostics.warn(Warning::ExtraHistogramsIgnored {
                ignored: histograms.len() - 1,
            });
        }
        &histograms[..1]
    };

    let mut radii = Vec::new();
    let mut observed = Vec::new();
    let mut pressure = Vec::new();
    let mut p_min = f64::INFINITY;
    let mut p_max = f64::NEG_INFINITY;

    for h in used {
        let weights = if normalize {
            normalize_weights(&h.weights)?
        } else {
            h.weights.clone()
        };
        let cumulative = cumulative_integral(&weights);
        let p = if pressure_dependent {
            h.meta.pressure / REFERENCE_PRESSURE
        } else {
            1.0
        };

        radii.extend_from_slice(&h.bin_edges[1..]);
        pressure.extend(std::iter::repeat_n(p, cumulative.len()));
        observed.extend(cumulative);
        p_min = p_min.min(h.meta.pressure);
        p_max = p_max.max(h.meta.pressure);
    }

    let finf = observed.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let pressure_range = if pressure_dependent {
        [p_min, p_max]
    } else {
        [REFERENCE_PRESSURE, REFERENCE_PRESSURE]
    };

    log::debug!(
        "fit set: {} samples from {} histogram(s), finf={finf:.6}, pressure range=[{}, {}]",
        observed.len(),
        used.len(),
        pressure_range[0],
        pressure_range[1]
    );

    Ok(CumulativeData {
        radii,
        observed,
        pressure,
        finf,
        pressure_range,
        pressure_dependent,
    })
}
