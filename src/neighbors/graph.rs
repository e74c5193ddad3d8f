//! Approximate similarity index
//!
//! The engine only consumes the [`SimilarityIndexBuilder`] / [`SimilarityIndex`]
//! contract: build once over the complete pool with a pairwise similarity, then
//! answer fast searches that may return fewer than `k` rows. [`KnnGraphBuilder`]
//! is the built-in implementation: an exact k-NN graph searched greedily.

use crate::dataset::{Row, Schema};
use crate::error::{LlrError, Result};
use crate::neighbors::Neighbor;
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Pairwise similarity in `(0, 1]`, larger is closer
pub type SimilarityFn = Arc<dyn Fn(&Row, &Row) -> f64 + Send + Sync>;

/// A built similarity index
pub trait SimilarityIndex: Send + Sync {
    /// Number of indexed rows
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Up to `k` indexed rows most similar to `query`, most similar first.
    ///
    /// `speedup` trades accuracy for fewer similarity evaluations.
    fn search(&self, query: &Row, k: usize, speedup: f64) -> Vec<Neighbor>;
}

/// Builds a [`SimilarityIndex`] over a set of rows
pub trait SimilarityIndexBuilder: Send + Sync {
    fn build(&self, rows: Arc<Vec<Row>>, similarity: SimilarityFn) -> Result<Box<dyn SimilarityIndex>>;
}

/// `1 / (1 + sqrt(sum of squared differences))` over numeric non-target
/// attributes present in both rows
pub fn numeric_similarity(schema: Arc<Schema>) -> SimilarityFn {
    Arc::new(move |a: &Row, b: &Row| {
        let diff: f64 = schema
            .attributes()
            .iter()
            .enumerate()
            .filter(|(i, attr)| attr.is_numeric() && !schema.is_target(*i))
            .filter_map(|(i, _)| {
                let d = a.numeric(i)? - b.numeric(i)?;
                Some(d * d)
            })
            .sum();
        1.0 / (1.0 + diff.sqrt())
    })
}

/// Inverse of the similarity transform used by [`numeric_similarity`]
#[inline]
pub fn similarity_to_distance(similarity: f64) -> f64 {
    if similarity > 0.0 {
        1.0 / similarity - 1.0
    } else {
        f64::INFINITY
    }
}

/// Approximate graph configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Out-degree of each node; `None` uses the engine's k
    pub degree: Option<usize>,
    /// Wall-clock budget for the build in milliseconds
    pub build_deadline_ms: Option<u64>,
}

/// Builder for [`KnnGraph`]
#[derive(Debug, Clone)]
pub struct KnnGraphBuilder {
    degree: usize,
    seed: u64,
    deadline: Option<Duration>,
}

impl KnnGraphBuilder {
    pub fn new(degree: usize) -> Self {
        Self {
            degree: degree.max(1),
            seed: 42,
            deadline: None,
        }
    }

    /// Seed for the search restarts
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Stop computing neighbor lists once `deadline` has elapsed
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

impl SimilarityIndexBuilder for KnnGraphBuilder {
    fn build(&self, rows: Arc<Vec<Row>>, similarity: SimilarityFn) -> Result<Box<dyn SimilarityIndex>> {
        let n = rows.len();
        if n == 0 {
            return Err(LlrError::InvalidArgument("cannot build a graph over no rows".to_string()));
        }
        let started = Instant::now();
        let degree = self.degree.min(n.saturating_sub(1));

        let adjacency: Vec<Option<Vec<(usize, f64)>>> = (0..n)
            .into_par_iter()
            .map(|i| {
                if let Some(limit) = self.deadline {
                    if started.elapsed() >= limit {
                        return None;
                    }
                }
                let mut sims: Vec<(usize, f64)> = (0..n)
                    .filter(|&j| j != i)
                    .map(|j| (j, similarity(&rows[i], &rows[j])))
                    .collect();
                sims.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
                sims.truncate(degree);
                Some(sims)
            })
            .collect();

        let skipped = adjacency.iter().filter(|a| a.is_none()).count();
        if skipped > 0 {
            warn!(skipped, nodes = n, "Graph build deadline reached, some nodes have no edges");
        }
        debug!(nodes = n, degree, elapsed_ms = started.elapsed().as_millis() as u64, "Built k-NN graph");

        Ok(Box::new(KnnGraph {
            rows,
            similarity,
            adjacency: adjacency.into_iter().map(Option::unwrap_or_default).collect(),
            seed: self.seed,
        }))
    }
}

/// k-NN graph with greedy restart search
pub struct KnnGraph {
    rows: Arc<Vec<Row>>,
    similarity: SimilarityFn,
    adjacency: Vec<Vec<(usize, f64)>>,
    seed: u64,
}

impl KnnGraph {
    /// Out-edges of `node`
    pub fn edges(&self, node: usize) -> &[(usize, f64)] {
        self.adjacency.get(node).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl SimilarityIndex for KnnGraph {
    fn len(&self) -> usize {
        self.rows.len()
    }

    fn search(&self, query: &Row, k: usize, speedup: f64) -> Vec<Neighbor> {
        let n = self.rows.len();
        if n == 0 || k == 0 {
            return Vec::new();
        }
        let budget = ((n as f64 / speedup.max(1.0)).ceil() as usize).max(k).min(n);

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.seed);
        let mut visited = vec![false; n];
        let mut evaluated: Vec<(usize, f64)> = Vec::with_capacity(budget);

        while evaluated.len() < budget {
            // Random restart from an unvisited node
            let mut current = rng.gen_range(0..n);
            if visited[current] {
                match (0..n).map(|o| (current + o) % n).find(|&c| !visited[c]) {
                    Some(c) => current = c,
                    None => break,
                }
            }
            visited[current] = true;
            let mut current_sim = (self.similarity)(query, &self.rows[current]);
            evaluated.push((current, current_sim));

            // Hill-climb along out-edges
            loop {
                let mut best: Option<(usize, f64)> = None;
                for &(next, _) in &self.adjacency[current] {
                    if evaluated.len() >= budget {
                        break;
                    }
                    if visited[next] {
                        continue;
                    }
                    visited[next] = true;
                    let sim = (self.similarity)(query, &self.rows[next]);
                    evaluated.push((next, sim));
                    if best.map_or(true, |(_, s)| sim > s) {
                        best = Some((next, sim));
                    }
                }
                match best {
                    Some((next, sim)) if sim > current_sim => {
                        current = next;
                        current_sim = sim;
                    }
                    _ => break,
                }
            }
        }

        evaluated.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        evaluated.truncate(k);
        evaluated
            .into_iter()
            .map(|(index, sim)| Neighbor {
                index,
                distance: similarity_to_distance(sim),
            })
            .collect()
    }
}
