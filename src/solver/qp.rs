//! Generic convex quadratic programming
//!
//! [`ConvexOptimizer`] is the seam for an external QP library. The built-in
//! [`ProjectedGradient`] handles programs whose inequalities are per-coordinate
//! lower bounds and whose single equality has positive coefficients, which
//! covers the simplex-constrained least-squares problem.

use crate::error::{LlrError, Result};
use crate::solver::LeastSquaresProblem;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// `minimize ½ wᵀPw + qᵀw` subject to `Gw <= h` and `aᵀw = rhs`
#[derive(Debug, Clone)]
pub struct QuadraticProgram {
    pub p: Array2<f64>,
    pub q: Array1<f64>,
    /// Inequality matrix `G` (m × k)
    pub inequalities: Array2<f64>,
    /// Inequality bounds `h` (length m)
    pub upper: Array1<f64>,
    /// Equality coefficients `a` (length k)
    pub equality: Array1<f64>,
    pub equality_rhs: f64,
}

impl QuadraticProgram {
    /// `min ||Aw - b||²` over the probability simplex
    pub fn simplex_least_squares(problem: &LeastSquaresProblem) -> Self {
        let a = problem.a();
        let k = a.ncols();
        let p = a.t().dot(a);
        let q = -a.t().dot(problem.b());
        Self {
            p,
            q,
            inequalities: -Array2::<f64>::eye(k),
            upper: Array1::zeros(k),
            equality: Array1::ones(k),
            equality_rhs: 1.0,
        }
    }

    /// Number of variables
    pub fn dim(&self) -> usize {
        self.q.len()
    }

    /// Objective value at `w`
    pub fn objective(&self, w: &Array1<f64>) -> f64 {
        0.5 * w.dot(&self.p.dot(w)) + self.q.dot(w)
    }

    fn check_shapes(&self) -> Result<()> {
        let k = self.dim();
        let shapes_ok = self.p.dim() == (k, k)
            && self.inequalities.ncols() == k
            && self.inequalities.nrows() == self.upper.len()
            && self.equality.len() == k;
        if k == 0 || !shapes_ok {
            return Err(LlrError::InvalidArgument(format!(
                "inconsistent program shapes: P {:?}, q {}, G {:?}, h {}, a {}",
                self.p.dim(),
                k,
                self.inequalities.dim(),
                self.upper.len(),
                self.equality.len()
            )));
        }
        Ok(())
    }
}

/// External convex optimizer contract
pub trait ConvexOptimizer: Send + Sync {
    /// Minimize `program` starting from `initial`.
    ///
    /// Numerical trouble is reported as [`LlrError::SolverFailure`].
    fn minimize(&self, program: &QuadraticProgram, initial: &Array1<f64>) -> Result<Array1<f64>>;
}

/// Projected-gradient settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QpConfig {
    pub max_iterations: usize,
    /// Stop once no coordinate moves by more than this
    pub tolerance: f64,
}

impl Default for QpConfig {
    fn default() -> Self {
        Self {
            max_iterations: 2000,
            tolerance: 1e-10,
        }
    }
}

/// Accelerated projected gradient with momentum restarts
#[derive(Debug, Clone, Default)]
pub struct ProjectedGradient {
    config: QpConfig,
}

impl ProjectedGradient {
    pub fn new(config: QpConfig) -> Self {
        Self { config }
    }
}

impl ConvexOptimizer for ProjectedGradient {
    fn minimize(&self, program: &QuadraticProgram, initial: &Array1<f64>) -> Result<Array1<f64>> {
        program.check_shapes()?;
        if initial.len() != program.dim() {
            return Err(LlrError::InvalidArgument(format!(
                "initial point has {} entries, program has {} variables",
                initial.len(),
                program.dim()
            )));
        }
        let feasible = FeasibleSet::from_program(program)?;

        let lipschitz = lipschitz_bound(&program.p);
        let mut x = feasible.project(initial);
        if lipschitz <= 0.0 {
            return Ok(x);
        }
        let step = 1.0 / lipschitz;

        let mut y = x.clone();
        let mut t = 1.0f64;
        let mut f_x = program.objective(&x);
        let mut iterations = 0;

        for _ in 0..self.config.max_iterations {
            iterations += 1;
            let grad = program.p.dot(&y) + &program.q;
            let mut next = feasible.project(&(&y - &(grad * step)));
            let mut f_next = program.objective(&next);

            if f_next > f_x {
                // Momentum overshot; take a plain step from x instead
                let grad = program.p.dot(&x) + &program.q;
                next = feasible.project(&(&x - &(grad * step)));
                f_next = program.objective(&next);
                t = 1.0;
            }

            if next.iter().any(|v| !v.is_finite()) {
                return Err(LlrError::solver(format!(
                    "projected gradient produced a non-finite iterate after {} iterations",
                    iterations
                )));
            }

            let t_next = (1.0 + (1.0 + 4.0 * t * t).sqrt()) / 2.0;
            let momentum = (t - 1.0) / t_next;
            let delta = &next - &x;
            let max_move = delta.iter().fold(0.0f64, |m, d| m.max(d.abs()));

            y = &next + &(&delta * momentum);
            x = next;
            f_x = f_next;
            t = t_next;

            if max_move < self.config.tolerance {
                break;
            }
        }

        debug!(iterations, objective = f_x, "Projected gradient finished");
        Ok(x)
    }
}

/// `{ w : w >= lower, aᵀw = rhs }` with `a > 0`
struct FeasibleSet {
    lower: Array1<f64>,
    coefficients: Array1<f64>,
    rhs: f64,
}

impl FeasibleSet {
    fn from_program(program: &QuadraticProgram) -> Result<Self> {
        let k = program.dim();
        let mut lower = Array1::from_elem(k, f64::NEG_INFINITY);

        for (row, &h) in program.inequalities.rows().into_iter().zip(program.upper.iter()) {
            let nonzero: Vec<(usize, f64)> = row
                .iter()
                .enumerate()
                .filter(|(_, g)| **g != 0.0)
                .map(|(i, g)| (i, *g))
                .collect();
            match nonzero.as_slice() {
                [(i, g)] if *g < 0.0 => lower[*i] = lower[*i].max(h / g),
                _ => {
                    return Err(LlrError::solver(
                        "only per-coordinate lower-bound inequalities are supported",
                    ))
                }
            }
        }
        if lower.iter().any(|l| !l.is_finite()) {
            return Err(LlrError::solver("every variable needs a finite lower bound"));
        }
        if program.equality.iter().any(|a| !(*a > 0.0) || !a.is_finite()) {
            return Err(LlrError::solver("equality coefficients must be positive"));
        }
        if program.equality.dot(&lower) > program.equality_rhs {
            return Err(LlrError::solver("lower bounds are incompatible with the equality constraint"));
        }

        Ok(Self {
            lower,
            coefficients: program.equality.clone(),
            rhs: program.equality_rhs,
        })
    }

    fn clipped(&self, v: &Array1<f64>, tau: f64) -> Array1<f64> {
        Array1::from_shape_fn(v.len(), |i| (v[i] - tau * self.coefficients[i]).max(self.lower[i]))
    }

    /// Euclidean projection; bisection on the equality multiplier
    fn project(&self, v: &Array1<f64>) -> Array1<f64> {
        let a = &self.coefficients;
        let slack = self.rhs - a.dot(&self.lower);
        let ratios = Array1::from_shape_fn(v.len(), |i| (v[i] - self.lower[i]) / a[i]);

        let mut hi = ratios.fold(f64::NEG_INFINITY, |m, &r| m.max(r));
        let mut lo = ratios.fold(f64::INFINITY, |m, &r| m.min(r)) - slack / a.dot(a);

        for _ in 0..200 {
            let mid = 0.5 * (lo + hi);
            if a.dot(&self.clipped(v, mid)) > self.rhs {
                lo = mid;
            } else {
                hi = mid;
            }
            if hi - lo <= 1e-15 * (1.0 + hi.abs().max(lo.abs())) {
                break;
            }
        }
        self.clipped(v, 0.5 * (lo + hi))
    }
}

/// Upper bound on the largest eigenvalue of the PSD matrix `p`: the smaller of
/// the trace and the largest absolute row sum (Gershgorin)
fn lipschitz_bound(p: &Array2<f64>) -> f64 {
    let trace = p.diag().sum();
    if p.nrows() == 0 || trace <= 0.0 {
        return trace.max(0.0);
    }
    let row_sum = p
        .rows()
        .into_iter()
        .map(|row| row.iter().map(|v| v.abs()).sum::<f64>())
        .fold(0.0f64, f64::max);
    trace.min(row_sum).max(f64::MIN_POSITIVE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn simplex_program(p: Array2<f64>, q: Array1<f64>) -> QuadraticProgram {
        let k = q.len();
        QuadraticProgram {
            p,
            q,
            inequalities: -Array2::<f64>::eye(k),
            upper: Array1::zeros(k),
            equality: Array1::ones(k),
            equality_rhs: 1.0,
        }
    }

    #[test]
    fn test_projection_onto_simplex() {
        let program = simplex_program(Array2::eye(3), Array1::zeros(3));
        let set = FeasibleSet::from_program(&program).unwrap();
        let w = set.project(&array![2.0, 0.0, -1.0]);
        assert_relative_eq!(w[0], 1.0, epsilon = 1e-9);
        assert_relative_eq!(w.sum(), 1.0, epsilon = 1e-9);
        let w = set.project(&array![0.5, 0.5, 0.5]);
        for &x in w.iter() {
            assert_relative_eq!(x, 1.0 / 3.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_identity_objective_hits_vertex() {
        // min ½||w||² - 3 w_0 on the simplex → w = e_0
        let program = simplex_program(Array2::eye(3), array![-3.0, 0.0, 0.0]);
        let w = ProjectedGradient::default()
            .minimize(&program, &Array1::from_elem(3, 1.0 / 3.0))
            .unwrap();
        assert_relative_eq!(w[0], 1.0, epsilon = 1e-6);
        assert!(w.iter().all(|&x| x >= -1e-12));
    }

    #[test]
    fn test_general_inequality_is_solver_failure() {
        let mut program = simplex_program(Array2::eye(2), Array1::zeros(2));
        program.inequalities = array![[1.0, 1.0], [-1.0, 0.0]];
        program.upper = array![1.0, 0.0];
        let err = ProjectedGradient::default()
            .minimize(&program, &array![0.5, 0.5])
            .unwrap_err();
        assert!(matches!(err, LlrError::SolverFailure { .. }));
    }

    #[test]
    fn test_infeasible_bounds() {
        let mut program = simplex_program(Array2::eye(2), Array1::zeros(2));
        program.upper = array![-1.0, -1.0]; // w >= 1 on both, sum = 1
        assert!(matches!(
            ProjectedGradient::default().minimize(&program, &array![0.5, 0.5]),
            Err(LlrError::SolverFailure { .. })
        ));
    }

    #[test]
    fn test_uniform_eigenvector_does_not_shrink_bound() {
        // Columns of equal norm with a negative inner product: the uniform
        // vector is the eigenvector of the small eigenvalue 0.02; the large one is 2
        let problem = LeastSquaresProblem::new(array![[1.0, -1.0], [0.1, 0.1]], array![0.5, 0.1]).unwrap();
        let program = QuadraticProgram::simplex_least_squares(&problem);
        assert!(lipschitz_bound(&program.p) >= 2.0 - 1e-12);

        let w = ProjectedGradient::default()
            .minimize(&program, &array![0.5, 0.5])
            .unwrap();
        assert_relative_eq!(w[0], 0.75, epsilon = 1e-6);
        assert_relative_eq!(w[1], 0.25, epsilon = 1e-6);
        assert!(problem.residual_norm(&w) < 1e-5);
    }

    #[test]
    fn test_lipschitz_bound_dominates_spectrum() {
        let p = array![[4.0, 1.0], [1.0, 3.0]];
        let l = lipschitz_bound(&p);
        let lambda_max = 3.5 + (1.25f64).sqrt();
        assert!(l >= lambda_max - 1e-9);
        assert!(l <= 7.0 + 1e-12);
    }
}
