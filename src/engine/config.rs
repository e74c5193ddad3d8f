//! Engine configuration

use crate::error::{LlrError, Result};
use crate::neighbors::{DistanceMetric, GraphConfig, NeighborStrategy};
use crate::solver::{QpConfig, SolverSettings, SolverStrategy};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for [`LlrEngine`](super::LlrEngine)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlrConfig {
    /// Number of neighbors per reconstruction
    pub k: usize,

    /// Exact or graph-based neighbor search
    pub neighbor_strategy: NeighborStrategy,

    /// Weight solving strategy
    pub solver: SolverStrategy,

    /// Metric for exact search
    pub distance: DistanceMetric,

    /// Minimum number of complete rows needed to train
    pub min_training_rows: usize,

    /// Minimum number of known numeric attributes in a query
    pub min_attributes: usize,

    /// Coordinate-descent activity threshold
    pub epsilon: f64,

    /// Coordinate-descent sweep limit
    pub max_iterations: usize,

    /// Approximate search speedup; the search evaluates about n / speedup rows
    pub speedup: f64,

    /// Random seed for partner selection and graph restarts
    pub seed: Option<u64>,

    /// Similarity graph construction
    pub graph: GraphConfig,

    /// Built-in QP optimizer
    pub qp: QpConfig,
}

impl Default for LlrConfig {
    fn default() -> Self {
        Self {
            k: 50,
            neighbor_strategy: NeighborStrategy::Approximate,
            solver: SolverStrategy::Optimize1D,
            distance: DistanceMetric::Manhattan,
            min_training_rows: 3,
            min_attributes: 2,
            epsilon: 1e-4,
            max_iterations: 100,
            speedup: 4.0,
            seed: Some(42),
            graph: GraphConfig::default(),
            qp: QpConfig::default(),
        }
    }
}

impl LlrConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_neighbor_strategy(mut self, strategy: NeighborStrategy) -> Self {
        self.neighbor_strategy = strategy;
        self
    }

    pub fn with_solver(mut self, solver: SolverStrategy) -> Self {
        self.solver = solver;
        self
    }

    pub fn with_distance(mut self, distance: DistanceMetric) -> Self {
        self.distance = distance;
        self
    }

    pub fn with_min_training_rows(mut self, rows: usize) -> Self {
        self.min_training_rows = rows;
        self
    }

    pub fn with_min_attributes(mut self, attributes: usize) -> Self {
        self.min_attributes = attributes;
        self
    }

    /// Builder method to set the coordinate-descent tolerance and sweep limit
    pub fn with_tolerance(mut self, epsilon: f64, max_iterations: usize) -> Self {
        self.epsilon = epsilon;
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_speedup(mut self, speedup: f64) -> Self {
        self.speedup = speedup;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_graph(mut self, graph: GraphConfig) -> Self {
        self.graph = graph;
        self
    }

    pub fn with_qp(mut self, qp: QpConfig) -> Self {
        self.qp = qp;
        self
    }

    /// Check value ranges; does not look at any dataset
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(LlrError::ConfigError("k must be at least 1".to_string()));
        }
        if self.min_training_rows == 0 {
            return Err(LlrError::ConfigError("min_training_rows must be at least 1".to_string()));
        }
        if self.min_attributes == 0 {
            return Err(LlrError::ConfigError("min_attributes must be at least 1".to_string()));
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(LlrError::ConfigError(format!("epsilon must be positive, got {}", self.epsilon)));
        }
        if self.max_iterations == 0 {
            return Err(LlrError::ConfigError("max_iterations must be at least 1".to_string()));
        }
        if !(self.speedup.is_finite() && self.speedup >= 1.0) {
            return Err(LlrError::ConfigError(format!("speedup must be >= 1, got {}", self.speedup)));
        }
        if self.graph.degree == Some(0) {
            return Err(LlrError::ConfigError("graph degree must be at least 1".to_string()));
        }
        if self.qp.max_iterations == 0 || !(self.qp.tolerance >= 0.0) {
            return Err(LlrError::ConfigError(format!(
                "invalid QP settings: {} iterations, tolerance {}",
                self.qp.max_iterations, self.qp.tolerance
            )));
        }
        if let DistanceMetric::WeightedEuclidean { weights } = &self.distance {
            if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
                return Err(LlrError::ConfigError("distance weights must be finite and non-negative".to_string()));
            }
        }
        Ok(())
    }

    /// Coordinate-descent settings derived from this configuration
    pub fn solver_settings(&self) -> SolverSettings {
        SolverSettings {
            epsilon: self.epsilon,
            max_iterations: self.max_iterations,
            seed: self.effective_seed(),
        }
    }

    /// The configured seed, or a fresh random one
    pub fn effective_seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }

    /// Save configuration as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load and validate configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Parse and validate configuration from JSON; missing fields take defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}
