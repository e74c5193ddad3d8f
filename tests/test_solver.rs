//! Integration test: weight solvers on random systems

use approx::assert_relative_eq;
use llr_impute::solver::{
    optimize_1d, optimize_2d, uniform_weights, LeastSquaresProblem, SolverSettings, SolverStrategy,
    WeightSolver,
};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

fn random_problem(rng: &mut Xoshiro256PlusPlus) -> LeastSquaresProblem {
    let d = rng.gen_range(2..7);
    let k = rng.gen_range(2..9);
    let a = Array2::from_shape_fn((d, k), |_| rng.gen_range(-5.0..5.0));
    let b = Array1::from_shape_fn(d, |_| rng.gen_range(-5.0..5.0));
    LeastSquaresProblem::new(a, b).unwrap()
}

#[test]
fn test_coordinate_solvers_never_worse_than_uniform() {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(2024);
    let settings = SolverSettings::default();

    for _ in 0..100 {
        let problem = random_problem(&mut rng).augmented();
        let k = problem.k();
        let baseline = problem.residual_norm(&uniform_weights(k));

        let w1 = optimize_1d(&problem, &settings);
        assert_eq!(w1.len(), k);
        assert!(w1.iter().all(|&x| x >= 0.0));
        assert!(problem.residual_norm(&w1) <= baseline * (1.0 + 1e-9) + 1e-9);

        let w2 = optimize_2d(&problem, &settings).unwrap();
        assert_eq!(w2.len(), k);
        assert!(w2.iter().all(|&x| x >= 0.0));
        assert_relative_eq!(w2.sum(), 1.0, epsilon = 1e-9);
        assert!(problem.residual_norm(&w2) <= baseline * (1.0 + 1e-9) + 1e-9);
    }
}

#[test]
fn test_generic_qp_stays_on_simplex() {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(99);
    let solver = WeightSolver::with_strategy(SolverStrategy::GenericQp);

    for _ in 0..30 {
        let problem = random_problem(&mut rng);
        let k = problem.k();
        let w = solver.solve(&problem).unwrap();
        assert_eq!(w.len(), k);
        assert!(w.iter().all(|&x| x >= -1e-12));
        assert_relative_eq!(w.sum(), 1.0, epsilon = 1e-6);
        assert!(problem.residual_norm(&w) <= problem.residual_norm(&uniform_weights(k)) + 1e-9);
    }
}

#[test]
fn test_generic_qp_with_opposed_columns() {
    // AᵀA has eigenvalues 2 and 0.02, with the uniform vector along the small one
    let problem = LeastSquaresProblem::new(
        Array2::from_shape_vec((2, 2), vec![1.0, -1.0, 0.1, 0.1]).unwrap(),
        Array1::from(vec![0.5, 0.1]),
    )
    .unwrap();
    let w = WeightSolver::with_strategy(SolverStrategy::GenericQp).solve(&problem).unwrap();
    assert_relative_eq!(w[0], 0.75, epsilon = 1e-6);
    assert_relative_eq!(w[1], 0.25, epsilon = 1e-6);
    assert!(problem.residual_norm(&w) < problem.residual_norm(&uniform_weights(2)));
}

#[test]
fn test_every_strategy_returns_k_weights() {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
    let problem = random_problem(&mut rng);
    for strategy in [
        SolverStrategy::Uniform,
        SolverStrategy::Optimize1D,
        SolverStrategy::Optimize2D,
        SolverStrategy::GenericQp,
    ] {
        let w = WeightSolver::with_strategy(strategy).solve(&problem).unwrap();
        assert_eq!(w.len(), problem.k(), "{:?}", strategy);
    }
}
