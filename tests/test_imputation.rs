//! Integration test: dataset-wide imputation and configuration files

use llr_impute::prelude::*;
use ndarray::{array, Array2};
use tempfile::NamedTempFile;

fn grid() -> Array2<f64> {
    // Columns: x, y, x + y, 2x - y, class
    let mut rows = Vec::new();
    for i in 0..6 {
        for j in 0..4 {
            let (x, y) = (i as f64, j as f64);
            rows.extend_from_slice(&[x, y, x + y, 2.0 * x - y, ((i + j) % 2) as f64]);
        }
    }
    Array2::from_shape_vec((24, 5), rows).unwrap()
}

fn with_holes() -> Array2<f64> {
    let mut x = grid();
    x[[1, 2]] = f64::NAN;
    x[[5, 0]] = f64::NAN;
    x[[9, 3]] = f64::NAN;
    x[[9, 1]] = f64::NAN;
    x[[14, 4]] = f64::NAN; // target only
    // Only one known non-target attribute
    x[[20, 0]] = f64::NAN;
    x[[20, 1]] = f64::NAN;
    x[[20, 2]] = f64::NAN;
    x
}

#[test]
fn test_impute_report() {
    let dataset = Dataset::from_array(&with_holes()).unwrap();
    for strategy in [NeighborStrategy::BruteForce, NeighborStrategy::Approximate] {
        let mut engine = LlrEngine::new(LlrConfig::new().with_k(4).with_neighbor_strategy(strategy)).unwrap();
        engine.train(&dataset, 4).unwrap();

        let report = engine.impute(&dataset).unwrap();
        assert_eq!(report.imputed_rows, 3);
        assert_eq!(report.filled_values, 4);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].index, 20);

        let filled = report.dataset.to_array().unwrap();
        for i in 0..filled.nrows() {
            if i == 20 {
                continue;
            }
            for j in 0..4 {
                assert!(!filled[[i, j]].is_nan(), "cell ({}, {}) still missing", i, j);
            }
        }
        // Target and skipped rows are left alone
        assert!(filled[[14, 4]].is_nan());
        assert!(filled[[20, 0]].is_nan());
        // Input is untouched
        assert_eq!(dataset.count_incomplete(), 5);
    }
}

#[test]
fn test_impute_layout_mismatch() {
    let mut engine = LlrEngine::new(LlrConfig::new().with_k(3)).unwrap();
    engine.train(&Dataset::from_array(&grid()).unwrap(), 4).unwrap();
    let other = Dataset::from_array(&array![[1.0, 2.0, 3.0]]).unwrap();
    assert!(matches!(engine.impute(&other), Err(LlrError::SchemaMismatch(_))));
}

#[test]
fn test_llr_imputer_matrix() {
    let mut imputer = LlrImputer::new(
        LlrConfig::new()
            .with_k(3)
            .with_neighbor_strategy(NeighborStrategy::BruteForce)
            .with_solver(SolverStrategy::GenericQp),
    );
    let result = imputer.fit_transform(&with_holes()).unwrap();
    assert_eq!(result.dim(), (24, 5));

    // Row 1 lies on the grid, so its sum column is reproduced closely
    assert!((result[[1, 2]] - 1.0).abs() < 0.5, "got {}", result[[1, 2]]);
    assert!(result[[5, 0]].is_finite());
}

#[test]
fn test_config_file_round_trip() {
    let config = LlrConfig::new()
        .with_k(7)
        .with_solver(SolverStrategy::Optimize2D)
        .with_distance(DistanceMetric::WeightedEuclidean {
            weights: vec![1.0, 0.5, 0.0, 2.0, 1.0],
        })
        .with_graph(GraphConfig {
            degree: Some(5),
            build_deadline_ms: Some(250),
        })
        .with_seed(None);

    let file = NamedTempFile::new().unwrap();
    config.save(file.path()).unwrap();
    let loaded = LlrConfig::load(file.path()).unwrap();
    assert_eq!(loaded.k, 7);
    assert_eq!(loaded.solver, SolverStrategy::Optimize2D);
    assert_eq!(loaded.distance, config.distance);
    assert_eq!(loaded.graph, config.graph);
    assert_eq!(loaded.seed, None);
    assert_eq!(loaded.min_training_rows, config.min_training_rows);
}

#[test]
fn test_weighted_distance_length_checked_at_training() {
    let config = LlrConfig::new()
        .with_neighbor_strategy(NeighborStrategy::BruteForce)
        .with_distance(DistanceMetric::WeightedEuclidean { weights: vec![1.0, 1.0] });
    let mut engine = LlrEngine::new(config).unwrap();
    assert!(matches!(
        engine.train(&Dataset::from_array(&grid()).unwrap(), 4),
        Err(LlrError::InvalidArgument(_))
    ));
}
