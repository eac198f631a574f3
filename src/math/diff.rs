//! Numeric differentiation.
//!
//! The density needs `dF/dr`, which the predictor obtains numerically so any
//! closed form can be plugged in. The estimator sits behind [`Derivative`] so
//! an analytic derivative can replace it without touching the predictor.

/// Default relative step for [`CentralDifference`].
pub const DEFAULT_STEP: f64 = 1e-5;

/// Estimate the first derivative of a scalar function.
pub trait Derivative: Send + Sync {
    fn derivative(&self, f: &dyn Fn(f64) -> f64, x: f64) -> f64;
}

/// Symmetric difference quotient `(f(x+h) − f(x−h)) / 2h`.
///
/// The absolute step is `step · max(1, |x|)` so large radii keep enough
/// significant digits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CentralDifference {
    pub step: f64,
}

impl Default for CentralDifference {
    fn default() -> Self {
        Self { step: DEFAULT_STEP }
    }
}

impl CentralDifference {
    pub fn new(step: f64) -> Self {
        Self { step }
    }
}

impl Derivative for CentralDifference {
    fn derivative(&self, f: &dyn Fn(f64) -> f64, x: f64) -> f64 {
        let h = self.step * x.abs().max(1.0);
        (f(x + h) - f(x - h)) / (2.0 * h)
    }
}

/// Derivative of `f` at every point of `xs`.
pub fn gradient(d: &dyn Derivative, f: &dyn Fn(f64) -> f64, xs: &[f64]) -> Vec<f64> {
    xs.iter().map(|&x| d.derivative(f, x)).collect()
}
