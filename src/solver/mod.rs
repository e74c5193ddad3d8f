//! Non-negative reconstruction weights
//!
//! Given neighbor columns `A` (d × k) and the query's known values `b`, find
//! weights `w >= 0` that minimize `||Aw - b||²`. Strategies:
//! - Uniform averaging
//! - Coordinate descent with single-coordinate updates (sum-to-one as a soft
//!   penalty row)
//! - SMO-style paired updates that keep the weight sum fixed
//! - A generic convex optimizer with hard simplex constraints

mod coordinate;
mod qp;

pub use coordinate::{optimize_1d, optimize_2d};
pub use qp::{ConvexOptimizer, ProjectedGradient, QpConfig, QuadraticProgram};

use crate::dataset::Row;
use crate::error::{LlrError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Weight solving strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SolverStrategy {
    /// `w_i = 1/k`
    Uniform,
    /// Single-coordinate descent on the augmented system
    #[default]
    Optimize1D,
    /// Paired-coordinate descent on the augmented system
    Optimize2D,
    /// External convex optimizer with `w >= 0` and `sum(w) = 1`
    GenericQp,
}

impl SolverStrategy {
    /// Whether the strategy solves the system with the appended row of ones
    pub fn augments(&self) -> bool {
        matches!(self, SolverStrategy::Optimize1D | SolverStrategy::Optimize2D)
    }
}

/// Coordinate-descent settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverSettings {
    /// Activity threshold on weights and gradient entries
    pub epsilon: f64,
    /// Maximum number of full sweeps
    pub max_iterations: usize,
    /// Seed for partner selection in paired updates
    pub seed: u64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            epsilon: 1e-4,
            max_iterations: 100,
            seed: 42,
        }
    }
}

/// Least-squares system over `k` neighbor columns
#[derive(Debug, Clone)]
pub struct LeastSquaresProblem {
    a: Array2<f64>,
    b: Array1<f64>,
    augmented: bool,
}

impl LeastSquaresProblem {
    /// Create a problem; `a` is d × k, `b` has length d
    pub fn new(a: Array2<f64>, b: Array1<f64>) -> Result<Self> {
        if a.nrows() == 0 || a.ncols() == 0 {
            return Err(LlrError::InvalidArgument(format!(
                "system matrix must be non-empty, got {}x{}",
                a.nrows(),
                a.ncols()
            )));
        }
        if a.nrows() != b.len() {
            return Err(LlrError::ShapeError {
                expected: format!("target of length {}", a.nrows()),
                actual: format!("length {}", b.len()),
            });
        }
        Ok(Self {
            a,
            b,
            augmented: false,
        })
    }

    /// System whose columns are the `neighbors`' values on `attributes` and
    /// whose target is the query's values on the same attributes
    pub fn from_neighbors(query: &Row, attributes: &[usize], neighbors: &[&Row]) -> Result<Self> {
        let d = attributes.len();
        let k = neighbors.len();
        let mut a = Array2::zeros((d, k));
        let mut b = Array1::zeros(d);

        for (r, &attr) in attributes.iter().enumerate() {
            b[r] = query.numeric(attr).ok_or_else(|| {
                LlrError::InvalidArgument(format!("query attribute {} is missing", attr))
            })?;
            for (j, nb) in neighbors.iter().enumerate() {
                a[[r, j]] = nb.numeric(attr).ok_or_else(|| {
                    LlrError::InvalidArgument(format!("neighbor {} attribute {} is missing", j, attr))
                })?;
            }
        }
        Self::new(a, b)
    }

    /// Copy with a row of ones appended to `A` and a 1 appended to `b`
    pub fn augmented(&self) -> Self {
        if self.augmented {
            return self.clone();
        }
        let (d, k) = self.a.dim();
        let a = Array2::from_shape_fn((d + 1, k), |(i, j)| if i < d { self.a[[i, j]] } else { 1.0 });
        let b = Array1::from_shape_fn(d + 1, |i| if i < d { self.b[i] } else { 1.0 });
        Self {
            a,
            b,
            augmented: true,
        }
    }

    /// Number of neighbor columns
    pub fn k(&self) -> usize {
        self.a.ncols()
    }

    pub fn a(&self) -> &Array2<f64> {
        &self.a
    }

    pub fn b(&self) -> &Array1<f64> {
        &self.b
    }

    pub fn is_augmented(&self) -> bool {
        self.augmented
    }

    /// `||Aw - b||`
    pub fn residual_norm(&self, w: &Array1<f64>) -> f64 {
        let r = self.a.dot(w) - &self.b;
        r.dot(&r).sqrt()
    }
}

/// `1/k` for every neighbor
pub fn uniform_weights(k: usize) -> Array1<f64> {
    Array1::from_elem(k, 1.0 / k as f64)
}

/// Dispatches a [`LeastSquaresProblem`] to the configured strategy
#[derive(Clone)]
pub struct WeightSolver {
    strategy: SolverStrategy,
    settings: SolverSettings,
    optimizer: Arc<dyn ConvexOptimizer>,
}

impl std::fmt::Debug for WeightSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeightSolver")
            .field("strategy", &self.strategy)
            .field("settings", &self.settings)
            .finish()
    }
}

impl WeightSolver {
    pub fn new(strategy: SolverStrategy, settings: SolverSettings, optimizer: Arc<dyn ConvexOptimizer>) -> Self {
        Self {
            strategy,
            settings,
            optimizer,
        }
    }

    /// Solver using the built-in projected-gradient optimizer for `GenericQp`
    pub fn with_strategy(strategy: SolverStrategy) -> Self {
        Self::new(
            strategy,
            SolverSettings::default(),
            Arc::new(ProjectedGradient::default()),
        )
    }

    pub fn strategy(&self) -> SolverStrategy {
        self.strategy
    }

    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    /// Solve the plain (non-augmented) `problem`; returns exactly k weights
    pub fn solve(&self, problem: &LeastSquaresProblem) -> Result<Array1<f64>> {
        let k = problem.k();
        if k == 1 {
            return Ok(Array1::ones(1));
        }

        let weights = match self.strategy {
            SolverStrategy::Uniform => uniform_weights(k),
            SolverStrategy::Optimize1D => optimize_1d(&problem.augmented(), &self.settings),
            SolverStrategy::Optimize2D => optimize_2d(&problem.augmented(), &self.settings)?,
            SolverStrategy::GenericQp => self.solve_qp(problem)?,
        };

        debug_assert_eq!(weights.len(), k, "solver returned the wrong number of weights");
        Ok(weights)
    }

    fn solve_qp(&self, problem: &LeastSquaresProblem) -> Result<Array1<f64>> {
        let k = problem.k();
        let initial = uniform_weights(k);
        let program = QuadraticProgram::simplex_least_squares(problem);

        match self.optimizer.minimize(&program, &initial) {
            Ok(w) if w.len() == k => Ok(w),
            Ok(w) => {
                warn!(expected = k, got = w.len(), "Optimizer returned wrong dimension, using uniform weights");
                Ok(initial)
            }
            Err(err @ LlrError::SolverFailure { .. }) => {
                warn!(error = %err, "Generic QP failed, using uniform weights");
                Ok(initial)
            }
            Err(err) => Err(err),
        }
    }
}

impl Default for WeightSolver {
    fn default() -> Self {
        Self::with_strategy(SolverStrategy::default())
    }
}
