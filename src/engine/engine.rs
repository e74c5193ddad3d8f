//! LLR engine implementation
//!
//! Training builds the complete pool and a neighbor source once. The resulting
//! [`TrainedModel`] is immutable and shared behind an `Arc`, so reconstruction
//! runs concurrently without locks.

use super::LlrConfig;
use crate::dataset::{Dataset, Row, Schema};
use crate::error::{LlrError, Result};
use crate::neighbors::{KnnGraphBuilder, NeighborSource, SimilarityIndexBuilder};
use crate::reconstruct::{AttributeSplit, ReconstructionResult, RowReconstructor, TargetEstimate};
use crate::solver::{ConvexOptimizer, LeastSquaresProblem, ProjectedGradient, WeightSolver};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// A row left untouched by [`LlrEngine::impute`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRow {
    pub index: usize,
    pub reason: String,
}

/// Outcome of imputing a whole dataset
#[derive(Debug, Clone)]
pub struct ImputationReport {
    /// Copy of the input with every reconstructible row filled
    pub dataset: Dataset,
    /// Rows that had at least one value filled
    pub imputed_rows: usize,
    /// Total number of filled cells
    pub filled_values: usize,
    /// Rows that could not be reconstructed
    pub skipped: Vec<SkippedRow>,
}

/// Immutable state produced by training
#[derive(Debug)]
pub struct TrainedModel {
    schema: Arc<Schema>,
    pool: Arc<Vec<Row>>,
    source: NeighborSource,
    solver: WeightSolver,
    reconstructor: RowReconstructor,
    k: usize,
}

impl TrainedModel {
    /// Schema seen at training, with the target set
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Number of complete rows available as neighbors
    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    pub fn target(&self) -> Option<usize> {
        self.schema.target()
    }

    /// Effective neighbor count, `min(k, pool size)`
    pub fn k(&self) -> usize {
        self.k
    }

    pub fn neighbor_source(&self) -> &NeighborSource {
        &self.source
    }

    /// Reconstruct the missing attributes of `row`.
    ///
    /// `row` itself is never modified; the filled copy is in the result.
    pub fn reconstruct(&self, row: &Row) -> Result<ReconstructionResult> {
        self.schema.check_row(row)?;

        let split = AttributeSplit::of(row, &self.schema);
        self.reconstructor.check_attributes(&split)?;

        if split.incomplete.is_empty() {
            return Ok(ReconstructionResult {
                row: row.clone(),
                filled: Vec::new(),
                target: None,
                neighbors: Vec::new(),
                weights: Vec::new(),
            });
        }

        let neighbors = self.source.query(row, &split.complete, self.k)?;
        let neighbor_rows = neighbors
            .iter()
            .map(|nb| {
                self.pool.get(nb.index).ok_or_else(|| {
                    LlrError::InvalidArgument(format!(
                        "neighbor index {} outside pool of {}",
                        nb.index,
                        self.pool.len()
                    ))
                })
            })
            .collect::<Result<Vec<&Row>>>()?;

        let problem = LeastSquaresProblem::from_neighbors(row, &split.complete, &neighbor_rows)?;
        let weights = self.solver.solve(&problem)?;
        debug!(
            neighbors = neighbors.len(),
            known = split.complete.len(),
            missing = split.incomplete.len(),
            residual = problem.residual_norm(&weights),
            "Solved reconstruction weights"
        );

        self.reconstructor
            .reconstruct(row, &self.schema, &split, neighbors, &neighbor_rows, &weights)
    }

    /// Predicted target value: the numeric estimate or the arg-max symbol index
    pub fn classify(&self, row: &Row) -> Result<f64> {
        Ok(self.target_estimate(row)?.value())
    }

    /// Raw target estimate; `[value]` for a numeric target
    pub fn distribution(&self, row: &Row) -> Result<Vec<f64>> {
        Ok(self.target_estimate(row)?.to_vec())
    }

    fn target_estimate(&self, row: &Row) -> Result<TargetEstimate> {
        let target = self.schema.target().ok_or(LlrError::NotTrained)?;
        if !row.is_missing(target) {
            return Err(LlrError::InvalidArgument(format!(
                "target attribute {} must be missing to be predicted",
                target
            )));
        }
        self.reconstruct(row)?.target.ok_or_else(|| {
            LlrError::InvalidArgument(format!("no estimate produced for target attribute {}", target))
        })
    }

    /// Fill every row of `dataset` that has a missing non-target value.
    ///
    /// Rows with too few known attributes or no neighbors are skipped and
    /// reported; any other failure aborts the call.
    pub fn impute(&self, dataset: &Dataset) -> Result<ImputationReport> {
        if !dataset.schema().same_layout(&self.schema) {
            return Err(LlrError::SchemaMismatch(format!(
                "dataset has {} attributes, model was trained on {}",
                dataset.schema().num_attributes(),
                self.schema.num_attributes()
            )));
        }
        let started = Instant::now();

        let outcomes: Vec<Result<Option<ReconstructionResult>>> = dataset
            .rows()
            .par_iter()
            .map(|row| {
                if !self.needs_imputation(row) {
                    return Ok(None);
                }
                self.reconstruct(row).map(Some)
            })
            .collect();

        let mut rows = Vec::with_capacity(dataset.len());
        let mut imputed_rows = 0;
        let mut filled_values = 0;
        let mut skipped = Vec::new();

        for (index, (original, outcome)) in dataset.rows().iter().zip(outcomes).enumerate() {
            match outcome {
                Ok(Some(result)) => {
                    if !result.filled.is_empty() {
                        imputed_rows += 1;
                        filled_values += result.filled.len();
                    }
                    rows.push(result.row);
                }
                Ok(None) => rows.push(original.clone()),
                Err(err @ (LlrError::InsufficientAttributes { .. } | LlrError::InsufficientNeighbors { .. })) => {
                    warn!(row = index, error = %err, "Skipping row");
                    skipped.push(SkippedRow {
                        index,
                        reason: err.to_string(),
                    });
                    rows.push(original.clone());
                }
                Err(err) => return Err(err),
            }
        }

        info!(
            rows = dataset.len(),
            imputed_rows,
            filled_values,
            skipped = skipped.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Imputation complete"
        );

        Ok(ImputationReport {
            dataset: dataset.with_rows(rows),
            imputed_rows,
            filled_values,
            skipped,
        })
    }

    fn needs_imputation(&self, row: &Row) -> bool {
        row.values()
            .iter()
            .enumerate()
            .any(|(i, v)| v.is_missing() && !self.schema.is_target(i))
    }
}

/// Local Linear Reconstruction engine
pub struct LlrEngine {
    config: LlrConfig,
    optimizer: Arc<dyn ConvexOptimizer>,
    index_builder: Option<Arc<dyn SimilarityIndexBuilder>>,
    model: Option<Arc<TrainedModel>>,
}

impl std::fmt::Debug for LlrEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlrEngine")
            .field("config", &self.config)
            .field("custom_index_builder", &self.index_builder.is_some())
            .field("is_trained", &self.model.is_some())
            .finish()
    }
}

impl LlrEngine {
    /// Create an untrained engine
    pub fn new(config: LlrConfig) -> Result<Self> {
        config.validate()?;
        let optimizer = Arc::new(ProjectedGradient::new(config.qp));
        Ok(Self {
            config,
            optimizer,
            index_builder: None,
            model: None,
        })
    }

    /// Use `optimizer` for the `GenericQp` strategy
    pub fn with_optimizer(mut self, optimizer: Arc<dyn ConvexOptimizer>) -> Self {
        self.optimizer = optimizer;
        self
    }

    /// Use `builder` instead of the built-in k-NN graph for approximate search
    pub fn with_index_builder(mut self, builder: Arc<dyn SimilarityIndexBuilder>) -> Self {
        self.index_builder = Some(builder);
        self
    }

    pub fn config(&self) -> &LlrConfig {
        &self.config
    }

    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    /// Current trained model
    pub fn model(&self) -> Result<Arc<TrainedModel>> {
        self.model.clone().ok_or(LlrError::NotTrained)
    }

    /// Train on the complete rows of `dataset` with `target` as the class
    /// attribute. Retraining replaces the previous model.
    pub fn train(&mut self, dataset: &Dataset, target: usize) -> Result<Arc<TrainedModel>> {
        let model = Arc::new(self.fit(dataset, target)?);
        self.model = Some(Arc::clone(&model));
        Ok(model)
    }

    fn fit(&self, dataset: &Dataset, target: usize) -> Result<TrainedModel> {
        let started = Instant::now();
        let schema = Arc::new(dataset.schema().clone().with_target(target)?);
        self.config.distance.validate(schema.num_attributes())?;

        let pool: Vec<Row> = dataset.rows().iter().filter(|r| !r.has_missing()).cloned().collect();
        if pool.len() < self.config.min_training_rows {
            return Err(LlrError::InsufficientTrainingData {
                found: pool.len(),
                required: self.config.min_training_rows,
            });
        }
        let pool = Arc::new(pool);
        let settings = self.config.solver_settings();

        let source = match &self.index_builder {
            Some(builder) => NeighborSource::build(
                self.config.neighbor_strategy,
                Arc::clone(&pool),
                Arc::clone(&schema),
                self.config.distance.clone(),
                self.config.speedup,
                builder.as_ref(),
            )?,
            None => {
                let mut builder = KnnGraphBuilder::new(self.config.graph.degree.unwrap_or(self.config.k))
                    .with_seed(settings.seed);
                if let Some(ms) = self.config.graph.build_deadline_ms {
                    builder = builder.with_deadline(Duration::from_millis(ms));
                }
                NeighborSource::build(
                    self.config.neighbor_strategy,
                    Arc::clone(&pool),
                    Arc::clone(&schema),
                    self.config.distance.clone(),
                    self.config.speedup,
                    &builder,
                )?
            }
        };

        let k = self.config.k.min(pool.len());
        info!(
            pool = pool.len(),
            rows = dataset.len(),
            target,
            k,
            neighbors = ?self.config.neighbor_strategy,
            solver = ?self.config.solver,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "LLR model trained"
        );

        Ok(TrainedModel {
            schema,
            pool,
            source,
            solver: WeightSolver::new(self.config.solver, settings, Arc::clone(&self.optimizer)),
            reconstructor: RowReconstructor::new(self.config.min_attributes),
            k,
        })
    }

    /// See [`TrainedModel::reconstruct`]
    pub fn reconstruct(&self, row: &Row) -> Result<ReconstructionResult> {
        self.model()?.reconstruct(row)
    }

    /// See [`TrainedModel::classify`]
    pub fn classify(&self, row: &Row) -> Result<f64> {
        self.model()?.classify(row)
    }

    /// See [`TrainedModel::distribution`]
    pub fn distribution(&self, row: &Row) -> Result<Vec<f64>> {
        self.model()?.distribution(row)
    }

    /// See [`TrainedModel::impute`]
    pub fn impute(&self, dataset: &Dataset) -> Result<ImputationReport> {
        self.model()?.impute(dataset)
    }
}
