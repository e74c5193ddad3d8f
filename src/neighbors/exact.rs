//! Exact brute-force neighbor search

use crate::dataset::Row;
use crate::error::{LlrError, Result};
use crate::neighbors::{DistanceMetric, Neighbor};
use crate::selection::least_indices;
use std::cmp::Ordering;
use std::sync::Arc;

/// Brute-force search over the complete pool; the pool itself is the index
#[derive(Debug, Clone)]
pub struct ExactBruteForce {
    pool: Arc<Vec<Row>>,
    metric: DistanceMetric,
}

impl ExactBruteForce {
    pub fn new(pool: Arc<Vec<Row>>, metric: DistanceMetric) -> Self {
        Self { pool, metric }
    }

    pub fn metric(&self) -> &DistanceMetric {
        &self.metric
    }

    /// The `k` pool rows closest to `query` over `attributes`, nearest first.
    ///
    /// `k` larger than the pool returns the whole pool.
    pub fn query(&self, query: &Row, attributes: &[usize], k: usize) -> Result<Vec<Neighbor>> {
        if k == 0 {
            return Err(LlrError::InvalidArgument("k must be at least 1".to_string()));
        }
        if self.pool.is_empty() {
            return Err(LlrError::InsufficientNeighbors { requested: k });
        }
        let k = k.min(self.pool.len());

        let mut distances: Vec<f64> = self
            .pool
            .iter()
            .map(|row| self.metric.distance(query, row, attributes))
            .collect();

        let indices = least_indices(&mut distances, k)?;

        let mut neighbors: Vec<Neighbor> = indices
            .into_iter()
            .zip(distances[..k].iter().copied())
            .map(|(index, distance)| Neighbor { index, distance })
            .collect();
        neighbors.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(Ordering::Equal)
                .then(a.index.cmp(&b.index))
        });
        Ok(neighbors)
    }
}
