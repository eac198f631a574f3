//! Formatted terminal output for fits and predictions.
//!
//! Formatting lives here so the fitting and prediction code stays free of
//! presentation concerns.

use crate::domain::{COEFFICIENT_NAMES, Diagnostics, FittedModel, OutputKind, status};

/// Human label of an optimizer status code.
pub fn status_label(code: i32) -> &'static str {
    match code {
        status::CONVERGED => "converged",
        status::STOPPED => "stopped",
        status::MAX_ITERS => "max iterations reached",
        _ => "unknown",
    }
}

/// Fitted model summary: geometry, coefficients, errors, trace and warnings.
pub fn format_fit_summary(model: &FittedModel, diagnostics: &Diagnostics) -> String {
    let mut out = String::new();

    out.push_str("=== apsf - annular APSF surrogate fit ===\n");
    out.push_str(&format!("Geometry: {}\n", model.geometry));
    out.push_str(&format!(
        "Pressure dependent: {}",
        if model.pressure_dependent { "yes" } else { "no" }
    ));
    if model.pressure_dependent {
        out.push_str(&format!(
            " | range=[{:.2}, {:.2}] mbar",
            model.pressure_range[0], model.pressure_range[1]
        ));
    }
    out.push('\n');
    out.push_str(&format!(
        "Status: {} ({})\n",
        status_label(model.status),
        model.status
    ));
    out.push_str(&format!("MARE={:.6e} RMSE={:.6e}\n", model.mare, model.rmse));

    out.push_str("\nCoefficients:\n");
    for name in COEFFICIENT_NAMES {
        if let Some(v) = model.coefficients.get(name) {
            out.push_str(&format!("- {name} = {v:>14.8}\n"));
        }
    }

    out.push_str(&format!(
        "\nMARE trace ({} starts): {}\n",
        model.mare_trace.len(),
        fmt_vec(&model.mare_trace)
    ));

    if !diagnostics.is_empty() {
        out.push_str("\nWarnings:\n");
        for w in &diagnostics.warnings {
            out.push_str(&format!("! {w}\n"));
        }
    }

    out
}

/// Two-column table of predicted values.
///
/// PSF output has one value per annulus, labelled by its radius interval.
pub fn format_prediction(radii: &[f64], values: &[f64], kind: OutputKind) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:>21} {:>16}\n", "r", kind.as_str()));
    out.push_str(&format!("{:->21} {:->16}\n", "", ""));

    match kind {
        OutputKind::Psf => {
            let mut sorted = radii.to_vec();
            sorted.sort_by(f64::total_cmp);
            for (w, v) in sorted.windows(2).zip(values) {
                let label = format!("[{:.4}, {:.4}]", w[0], w[1]);
                out.push_str(&format!("{label:>21} {v:>16.8e}\n"));
            }
        }
        OutputKind::Cumulative | OutputKind::Density => {
            for (r, v) in radii.iter().zip(values) {
                out.push_str(&format!("{r:>21.4} {v:>16.8e}\n"));
            }
        }
    }

    out
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.3e}")).collect();
    format!("[{}]", parts.join(", "))
}
