use crate::domain::Geometry;

/// Errors raised by the fit and predict engine.
///
/// Configuration and contract violations are fatal. Recoverable conditions
/// (extrapolation, single-histogram pressure mode) are reported as
/// [`crate::domain::Warning`]s instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApsfError {
    #[error("incompatible simulation set for pressure-dependent fit: histogram {index} differs from histogram 0 in {field}")]
    Configuration { index: usize, field: &'static str },
    #[error("missing parameter '{name}': the model is pressure dependent, supply a surface pressure in mbar")]
    MissingParameter { name: &'static str },
    #[error("unsupported prediction kind '{0}' (expected cumulative, density or psf)")]
    UnsupportedKind(String),
    #[error("no evaluator registered for geometry '{0}'")]
    UnsupportedGeometry(Geometry),
    #[error("fitted model has no coefficient '{0}'")]
    MissingCoefficient(String),
    #[error("invalid histogram: {0}")]
    InvalidHistogram(String),
    #[error("surface pressure must be finite and > 0 mbar, got {0}")]
    InvalidPressure(f64),
    #[error("invalid radii: {0}")]
    InvalidRadii(String),
    #[error("no histograms to fit")]
    EmptyInput,
    #[error("optimizer failed: {0}")]
    Optimizer(String),
}

impl ApsfError {
    /// Process exit code used by the `apsf` binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            ApsfError::Optimizer(_) => 4,
            _ => 3,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<ApsfError> for AppError {
    fn from(err: ApsfError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_map_to_exit_codes() {
        let err: AppError = ApsfError::MissingParameter { name: "pressure" }.into();
        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("pressure"));

        let err: AppError = ApsfError::Optimizer("boom".into()).into();
        assert_eq!(err.exit_code(), 4);
    }
}
