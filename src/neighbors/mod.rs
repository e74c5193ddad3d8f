//! Neighbor sources over the complete pool
//!
//! Two interchangeable strategies behind one query contract:
//! - Exact brute-force search with linear-time top-k selection
//! - Approximate search through a build-once similarity index

mod distance;
mod exact;
mod graph;

pub use distance::DistanceMetric;
pub use exact::ExactBruteForce;
pub use graph::{
    numeric_similarity, similarity_to_distance, GraphConfig, KnnGraph, KnnGraphBuilder,
    SimilarityFn, SimilarityIndex, SimilarityIndexBuilder,
};

use crate::dataset::{Row, Schema};
use crate::error::{LlrError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// A pool row and its distance to the query
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    /// Index into the complete pool
    pub index: usize,
    /// Distance to the query (smaller is closer)
    pub distance: f64,
}

/// Neighbor search strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NeighborStrategy {
    /// Exact search over every pool row
    BruteForce,
    /// Similarity-graph search
    #[default]
    Approximate,
}

/// Approximate neighbor search backed by a [`SimilarityIndex`]
pub struct ApproximateGraph {
    index: Box<dyn SimilarityIndex>,
    speedup: f64,
}

impl std::fmt::Debug for ApproximateGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApproximateGraph")
            .field("indexed_rows", &self.index.len())
            .field("speedup", &self.speedup)
            .finish()
    }
}

impl ApproximateGraph {
    /// Build the index over `pool` with the numeric similarity of `schema`
    pub fn build(
        pool: Arc<Vec<Row>>,
        schema: Arc<Schema>,
        builder: &dyn SimilarityIndexBuilder,
        speedup: f64,
    ) -> Result<Self> {
        let index = builder.build(pool, numeric_similarity(schema))?;
        Ok(Self::from_index(index, speedup))
    }

    /// Wrap an already built index
    pub fn from_index(index: Box<dyn SimilarityIndex>, speedup: f64) -> Self {
        Self { index, speedup }
    }

    /// Up to `k` neighbors; fewer results clamp `k`, none is an error
    pub fn query(&self, query: &Row, k: usize) -> Result<Vec<Neighbor>> {
        if k == 0 {
            return Err(LlrError::InvalidArgument("k must be at least 1".to_string()));
        }
        let mut found = self.index.search(query, k, self.speedup);
        if found.is_empty() {
            return Err(LlrError::InsufficientNeighbors { requested: k });
        }
        if found.len() < k {
            debug!(requested = k, returned = found.len(), "Approximate search returned fewer neighbors");
        }
        found.truncate(k);
        Ok(found)
    }
}

/// Neighbor source selected at training time
#[derive(Debug)]
pub enum NeighborSource {
    Exact(ExactBruteForce),
    Approximate(ApproximateGraph),
}

impl NeighborSource {
    /// Build the source for `strategy` over the complete pool
    pub fn build(
        strategy: NeighborStrategy,
        pool: Arc<Vec<Row>>,
        schema: Arc<Schema>,
        metric: DistanceMetric,
        speedup: f64,
        builder: &dyn SimilarityIndexBuilder,
    ) -> Result<Self> {
        match strategy {
            NeighborStrategy::BruteForce => Ok(NeighborSource::Exact(ExactBruteForce::new(pool, metric))),
            NeighborStrategy::Approximate => Ok(NeighborSource::Approximate(ApproximateGraph::build(
                pool, schema, builder, speedup,
            )?)),
        }
    }

    /// Up to `k` neighbors of `query`; `attributes` are the query's known
    /// numeric non-target attributes
    pub fn query(&self, query: &Row, attributes: &[usize], k: usize) -> Result<Vec<Neighbor>> {
        match self {
            NeighborSource::Exact(exact) => exact.query(query, attributes, k),
            NeighborSource::Approximate(graph) => graph.query(query, k),
        }
    }

    pub fn strategy(&self) -> NeighborStrategy {
        match self {
            NeighborSource::Exact(_) => NeighborStrategy::BruteForce,
            NeighborSource::Approximate(_) => NeighborStrategy::Approximate,
        }
    }
}
