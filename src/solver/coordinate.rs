//! SMO-style coordinate descent for non-negative least squares
//!
//! Both solvers start from uniform weights and keep the residual `c = Aw - b`
//! and `alpha = Aᵀc` up to date with rank-1 adjustments, so one sweep costs
//! O(k·d) on top of the O(k²·d) Gram matrix.

use crate::error::{LlrError, Result};
use crate::solver::{uniform_weights, LeastSquaresProblem, SolverSettings};
use ndarray::Array1;
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use tracing::debug;

/// Single-coordinate descent.
///
/// Expects the augmented system: the row of ones penalizes departure from
/// `sum(w) = 1` but does not enforce it, so the returned weights only
/// approximately sum to one. Each active coordinate `i` (both `|alpha_i|` and
/// `|w_i|` above epsilon) moves to the exact minimizer along its axis, clipped
/// at zero. Stops after a sweep without updates or after `max_iterations`
/// sweeps.
pub fn optimize_1d(problem: &LeastSquaresProblem, settings: &SolverSettings) -> Array1<f64> {
    let a = problem.a();
    let k = a.ncols();
    let eps = settings.epsilon;

    let mut w = uniform_weights(k);
    let ata = a.t().dot(a);
    let q = ata.diag().to_owned();
    let mut c = a.dot(&w) - problem.b();
    let mut alpha = a.t().dot(&c);

    let mut sweeps = 0;
    for _ in 0..settings.max_iterations {
        sweeps += 1;
        let mut updated = false;

        for i in 0..k {
            if alpha[i].abs() <= eps || w[i].abs() <= eps || q[i] <= 0.0 {
                continue;
            }
            updated = true;

            let col = a.column(i);
            // argmin over x of ||(c - col * w_i) + col * x||²
            let new_wi = ((q[i] * w[i] - col.dot(&c)) / q[i]).max(0.0);
            let delta = new_wi - w[i];
            w[i] = new_wi;
            c.scaled_add(delta, &col);
            alpha.scaled_add(delta, &ata.row(i));
        }

        if !updated {
            break;
        }
    }

    debug!(k, sweeps, "Optimize1D finished");
    w
}

/// Paired-coordinate descent.
///
/// For each active coordinate `i` a partner `j != i` is drawn uniformly at
/// random and the pair moves along `w_i + w_j = const`, clipped to
/// `[0, w_i + w_j]`, so the weight sum never changes. A running count and sum of
/// non-negligible weights drive a uniform re-centering of `alpha` after every
/// pair update; the sweep stops early when no active weight would remain.
pub fn optimize_2d(problem: &LeastSquaresProblem, settings: &SolverSettings) -> Result<Array1<f64>> {
    let a = problem.a();
    let k = a.ncols();
    if k < 2 {
        return Err(LlrError::InvalidArgument(format!(
            "paired updates need at least 2 neighbors, got {}",
            k
        )));
    }
    let eps = settings.epsilon;

    let mut w = uniform_weights(k);
    let ata = a.t().dot(a);
    let mut c = a.dot(&w) - problem.b();
    let mut alpha = a.t().dot(&c);

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(settings.seed);
    let mut nz_sum = 1.0f64;
    let mut nz_count = k as f64;
    let mut beta = 0.0f64;

    let mut sweeps = 0;
    for _ in 0..settings.max_iterations {
        sweeps += 1;
        let mut updated = false;

        for i in 0..k {
            if alpha[i].abs() <= eps || w[i].abs() <= eps {
                continue;
            }
            let j = loop {
                let j = rng.gen_range(0..k);
                if j != i {
                    break j;
                }
            };
            updated = true;

            let diff = &a.column(i) - &a.column(j);
            let denom = diff.dot(&diff);
            if denom <= f64::EPSILON {
                // Identical neighbors: every split of the pair is optimal
                continue;
            }

            let bound = w[i] + w[j];
            let new_wi = (w[i] - diff.dot(&c) / denom).max(0.0).min(bound);
            let new_wj = bound - new_wi;

            for old in [w[i], w[j]] {
                if old.abs() > eps {
                    nz_count -= 1.0;
                    nz_sum -= old;
                }
            }
            for new in [new_wi, new_wj] {
                if new.abs() > eps {
                    nz_count += 1.0;
                    nz_sum += new;
                }
            }
            if nz_count < eps {
                updated = false;
                break;
            }

            let delta_i = new_wi - w[i];
            let delta_j = new_wj - w[j];
            c.scaled_add(delta_i, &diff);
            alpha.scaled_add(delta_i, &ata.row(i));
            alpha.scaled_add(delta_j, &ata.row(j));

            let mean = nz_sum / nz_count;
            alpha -= mean - beta;
            beta = mean;

            w[i] = new_wi;
            w[j] = new_wj;
        }

        if !updated {
            break;
        }
    }

    debug!(k, sweeps, active = nz_count, "Optimize2D finished");
    Ok(w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Array2};

    fn problem(a: Array2<f64>, b: Array1<f64>) -> LeastSquaresProblem {
        LeastSquaresProblem::new(a, b).unwrap().augmented()
    }

    #[test]
    fn test_1d_picks_exact_neighbor() {
        // Query equals neighbor 1
        let p = problem(
            array![[0.0, 5.0, 10.0], [0.0, 5.0, 10.0], [1.0, 6.0, 2.0]],
            array![5.0, 5.0, 6.0],
        );
        let uniform_err = p.residual_norm(&uniform_weights(3));
        let w = optimize_1d(&p, &SolverSettings::default());
        assert_eq!(w.len(), 3);
        assert!(w.iter().all(|&x| x >= 0.0));
        assert!(p.residual_norm(&w) < uniform_err);
        assert!(p.residual_norm(&w) < 0.1);
    }

    #[test]
    fn test_1d_no_update_when_already_optimal() {
        // Uniform weights reproduce b exactly: alpha is zero from the start
        let p = problem(array![[1.0, 3.0], [2.0, 4.0]], array![2.0, 3.0]);
        let w = optimize_1d(&p, &SolverSettings::default());
        assert_relative_eq!(w[0], 0.5);
        assert_relative_eq!(w[1], 0.5);
    }

    #[test]
    fn test_2d_keeps_sum_and_improves() {
        let p = problem(
            array![[0.0, 2.0, 9.0, 4.0], [0.0, 2.0, -4.0, 1.0], [1.0, 3.0, 7.0, 0.0]],
            array![1.0, 1.0, 2.0],
        );
        let uniform_err = p.residual_norm(&uniform_weights(4));
        let w = optimize_2d(&p, &SolverSettings::default()).unwrap();
        assert_relative_eq!(w.sum(), 1.0, epsilon = 1e-9);
        assert!(w.iter().all(|&x| x >= 0.0));
        assert!(p.residual_norm(&w) <= uniform_err + 1e-12);
    }

    #[test]
    fn test_2d_is_deterministic_for_a_seed() {
        let p = problem(
            array![[0.0, 2.0, 9.0, 4.0], [0.0, 2.0, -4.0, 1.0], [1.0, 3.0, 7.0, 0.0]],
            array![3.0, -1.0, 2.0],
        );
        let settings = SolverSettings { seed: 7, ..SolverSettings::default() };
        let w1 = optimize_2d(&p, &settings).unwrap();
        let w2 = optimize_2d(&p, &settings).unwrap();
        assert_eq!(w1, w2);
    }

    #[test]
    fn test_2d_needs_two_neighbors() {
        let p = problem(array![[1.0], [2.0]], array![1.0, 2.0]);
        assert!(matches!(
            optimize_2d(&p, &SolverSettings::default()),
            Err(LlrError::InvalidArgument(_))
        ));
    }
}
