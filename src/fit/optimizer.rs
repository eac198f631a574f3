//! Multi-start derivative-free minimization.
//!
//! The exponential decomposition is smooth but non-convex, so a single local
//! search often stalls. We run one deterministic start plus `nstart` random
//! ones (in parallel) and keep the lowest cost.
//!
//! Reproducibility: all starting points are drawn up front from one
//! `StdRng::seed_from_u64(seed)` before any start runs, so results depend only
//! on `seed` and `nstart`, never on thread scheduling. A different seed gives
//! different random starts and possibly a different optimum.

use argmin::core::{CostFunction, Error as ArgminError, Executor, State, TerminationReason};
use argmin::solver::neldermead::NelderMead;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Uniform};
use rayon::prelude::*;

use crate::domain::status;
use crate::error::ApsfError;
use crate::fit::objective::Objective;

/// Deterministic first start.
pub const FIRST_START: [f64; 5] = [0.05, -0.14, 0.23, -0.32, -0.05];

/// Signs applied to the uniform `[0, 1)` draws of the random starts.
///
/// Rates `x2`, `x4` and `x5` are decays and start negative.
pub const START_SIGNS: [f64; 5] = [1.0, -1.0, 1.0, -1.0, -1.0];

/// Result of one local minimization.
#[derive(Debug, Clone, PartialEq)]
pub struct Minimum {
    pub x: Vec<f64>,
    pub value: f64,
    /// Convergence code (see [`crate::domain::status`]).
    pub status: i32,
    pub iterations: u64,
}

/// A local minimizer started from a single point.
pub trait Minimizer: Sync {
    fn minimize(&self, objective: &dyn Objective, x0: &[f64]) -> Result<Minimum, ApsfError>;
}

/// Nelder–Mead simplex search (argmin).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NelderMeadMinimizer {
    /// Iteration budget per start.
    pub max_iters: u64,
    /// Stop once the standard deviation of the simplex costs drops below this.
    pub sd_tolerance: f64,
}

impl Default for NelderMeadMinimizer {
    fn default() -> Self {
        Self {
            max_iters: 20_000,
            sd_tolerance: 1e-12,
        }
    }
}

/// Initial simplex around `x0`: each vertex nudges one coordinate by 5%
/// (or sets it to 0.00025 when it is zero).
pub fn initial_simplex(x0: &[f64]) -> Vec<Vec<f64>> {
    let mut simplex = Vec::with_capacity(x0.len() + 1);
    simplex.push(x0.to_vec());
    for k in 0..x0.len() {
        let mut vertex = x0.to_vec();
        vertex[k] = if vertex[k] != 0.0 {
            vertex[k] * 1.05
        } else {
            0.00025
        };
        simplex.push(vertex);
    }
    simplex
}

struct CostAdapter<'a> {
    objective: &'a dyn Objective,
}

impl CostFunction for CostAdapter<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, x: &Self::Param) -> Result<Self::Output, ArgminError> {
        // The simplex orders vertices by cost, so unusable points rank last
        // instead of poisoning the comparison with NaN.
        let value = self.objective.cost(x);
        Ok(if value.is_finite() { value } else { f64::INFINITY })
    }
}

impl Minimizer for NelderMeadMinimizer {
    fn minimize(&self, objective: &dyn Objective, x0: &[f64]) -> Result<Minimum, ApsfError> {
        let solver = NelderMead::new(initial_simplex(x0))
            .with_sd_tolerance(self.sd_tolerance)
            .map_err(|e| ApsfError::Optimizer(e.to_string()))?;
        let problem = CostAdapter { objective };

        let result = Executor::new(problem, solver)
            .configure(|state| state.max_iters(self.max_iters))
            .run()
            .map_err(|e| ApsfError::Optimizer(e.to_string()))?;
        let state = result.state();

        let x = state
            .get_best_param()
            .cloned()
            .ok_or_else(|| ApsfError::Optimizer("solver returned no parameters".into()))?;
        let code = match state.get_termination_reason() {
            Some(TerminationReason::SolverConverged) => status::CONVERGED,
            Some(TerminationReason::MaxItersReached) => status::MAX_ITERS,
            _ => status::STOPPED,
        };

        Ok(Minimum {
            x,
            value: state.get_best_cost(),
            status: code,
            iterations: state.get_iter(),
        })
    }
}

/// Multi-start settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultiStart {
    /// Number of random starts after the deterministic one.
    pub nstart: usize,
    /// Base seed of the random starts.
    pub seed: u64,
    /// Run starts on the rayon pool.
    pub parallel: bool,
}

/// Best start plus the costs of all starts.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiStartOutcome {
    pub best: Minimum,
    /// Per-start minima, sorted descending.
    pub trace: Vec<f64>,
}

/// Starting points: [`FIRST_START`] followed by `nstart` sign-patterned draws.
pub fn starting_points(nstart: usize, seed: u64) -> Vec<Vec<f64>> {
    let unit = Uniform::new(0.0, 1.0);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut starts = Vec::with_capacity(nstart + 1);
    starts.push(FIRST_START.to_vec());
    for _ in 0..nstart {
        starts.push(
            START_SIGNS
                .iter()
                .map(|sign| sign * unit.sample(&mut rng))
                .collect(),
        );
    }
    starts
}

/// Minimize `objective` from every starting point and keep the best.
pub fn multi_start(
    objective: &dyn Objective,
    minimizer: &dyn Minimizer,
    settings: &MultiStart,
) -> Result<MultiStartOutcome, ApsfError> {
    if objective.dim() != FIRST_START.len() {
        return Err(ApsfError::Optimizer(format!(
            "objective expects {} parameters, starting points have {}",
            objective.dim(),
            FIRST_START.len()
        )));
    }
    let starts = starting_points(settings.nstart, settings.seed);

    let run = |(idx, x0): (usize, &Vec<f64>)| -> Result<(usize, Minimum), ApsfError> {
        let m = minimizer.minimize(objective, x0)?;
        log::debug!(
            "start {idx}: cost={:.6e} status={} iterations={}",
            m.value,
            m.status,
            m.iterations
        );
        Ok((idx, m))
    };

    let results: Vec<(usize, Minimum)> = if settings.parallel {
        starts.par_iter().enumerate().map(run).collect::<Result<_, _>>()?
    } else {
        starts.iter().enumerate().map(run).collect::<Result<_, _>>()?
    };

    // Deterministic selection: lowest cost, ties broken by start index.
    let mut best = &results[0];
    for r in &results[1..] {
        if r.1.value < best.1.value || (r.1.value == best.1.value && r.0 < best.0) {
            best = r;
        }
    }

    let mut trace: Vec<f64> = results.iter().map(|(_, m)| m.value).collect();
    trace.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

    Ok(MultiStartOutcome {
        best: best.1.clone(),
        trace,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Shifted quadratic bowl with its minimum at `center`.
    struct Bowl {
        center: [f64; 5],
    }

    impl Objective for Bowl {
        fn dim(&self) -> usize {
            5
        }

        fn cost(&self, x: &[f64]) -> f64 {
            x.iter()
                .zip(self.center.iter())
                .map(|(a, b)| (a - b) * (a - b))
                .sum()
        }
    }

    #[test]
    fn initial_simplex_perturbs_one_coordinate_per_vertex() {
        let s = initial_simplex(&[1.0, 0.0]);
        assert_eq!(s, vec![vec![1.0, 0.0], vec![1.05, 0.0], vec![1.0, 0.00025]]);
    }

    #[test]
    fn starting_points_follow_sign_pattern() {
        let starts = starting_points(8, 7);
        assert_eq!(starts.len(), 9);
        assert_eq!(starts[0], FIRST_START.to_vec());
        for s in &starts[1..] {
            for (v, sign) in s.iter().zip(START_SIGNS) {
                assert!(v.abs() < 1.0);
                assert!(*v == 0.0 || v.signum() == sign);
            }
        }
        assert_eq!(starts, starting_points(8, 7));
        // One stream for every start: start 1 takes the first five draws.
        let unit = Uniform::new(0.0, 1.0);
        let mut rng = StdRng::seed_from_u64(7);
        let first: Vec<f64> = START_SIGNS.iter().map(|s| s * unit.sample(&mut rng)).collect();
        assert_eq!(starts[1], first);
        let second: Vec<f64> = START_SIGNS.iter().map(|s| s * unit.sample(&mut rng)).collect();
        assert_eq!(starts[2], second);
        assert_ne!(starts[1], starting_points(8, 8)[1]);
        // More starts extend the sequence without changing earlier ones.
        assert_eq!(&starting_points(10, 7)[..9], &starts[..]);
    }

    #[test]
    fn nelder_mead_finds_bowl_minimum() {
        let bowl = Bowl {
            center: [0.3, -0.2, 0.6, -0.4, -0.1],
        };
        let m = NelderMeadMinimizer::default()
            .minimize(&bowl, &FIRST_START)
            .unwrap();
        assert!(m.value < 1e-8, "cost={}", m.value);
        for (a, b) in m.x.iter().zip(bowl.center) {
            assert!((a - b).abs() < 1e-3);
        }
    }

    #[test]
    fn tiny_budget_is_reported_not_raised() {
        let bowl = Bowl {
            center: [3.0, -2.0, 6.0, -4.0, -1.0],
        };
        let nm = NelderMeadMinimizer {
            max_iters: 3,
            sd_tolerance: 1e-12,
        };
        let m = nm.minimize(&bowl, &FIRST_START).unwrap();
        assert_eq!(m.status, status::MAX_ITERS);
    }

    #[test]
    fn multi_start_keeps_best_and_sorted_trace() {
        let bowl = Bowl {
            center: [0.5, -0.5, 0.5, -0.5, -0.5],
        };
        let settings = MultiStart {
            nstart: 4,
            seed: 11,
            parallel: true,
        };
        let out = multi_start(&bowl, &NelderMeadMinimizer::default(), &settings).unwrap();
        assert_eq!(out.trace.len(), 5);
        assert!(out.trace.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(out.best.value, *out.trace.last().unwrap());

        let serial = multi_start(
            &bowl,
            &NelderMeadMinimizer::default(),
            &MultiStart {
                parallel: false,
                ..settings
            },
        )
        .unwrap();
        assert_eq!(serial, out);
    }
}
