//! LLR-based matrix imputer

use crate::dataset::Dataset;
use crate::engine::{LlrConfig, LlrEngine, TrainedModel};
use crate::error::{LlrError, Result};
use crate::imputation::Imputer;
use ndarray::Array2;
use std::sync::Arc;
use tracing::debug;

/// Imputer for all-numeric matrices.
///
/// Complete rows of the fitted matrix form the neighbor pool. The target
/// column (last by default) is never filled.
#[derive(Debug, Clone)]
pub struct LlrImputer {
    config: LlrConfig,
    target_column: Option<usize>,
    model: Option<Arc<TrainedModel>>,
}

impl LlrImputer {
    /// Create new LLR imputer
    pub fn new(config: LlrConfig) -> Self {
        Self {
            config,
            target_column: None,
            model: None,
        }
    }

    /// Set the target column
    pub fn with_target_column(mut self, column: usize) -> Self {
        self.target_column = Some(column);
        self
    }

    pub fn is_fitted(&self) -> bool {
        self.model.is_some()
    }

    /// Fitted model, if any
    pub fn model(&self) -> Option<&Arc<TrainedModel>> {
        self.model.as_ref()
    }
}

impl Default for LlrImputer {
    fn default() -> Self {
        Self::new(LlrConfig::default())
    }
}

impl Imputer for LlrImputer {
    fn fit(&mut self, x: &Array2<f64>) -> Result<()> {
        let dataset = Dataset::from_array(x)?;
        let target = self.target_column.unwrap_or(x.ncols() - 1);
        let mut engine = LlrEngine::new(self.config.clone())?;
        self.model = Some(engine.train(&dataset, target)?);
        Ok(())
    }

    fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let model = self.model.as_ref().ok_or(LlrError::NotTrained)?;
        let report = model.impute(&Dataset::from_array(x)?)?;
        debug!(
            filled = report.filled_values,
            skipped = report.skipped.len(),
            "Matrix imputation finished"
        );
        report.dataset.to_array()
    }
}
