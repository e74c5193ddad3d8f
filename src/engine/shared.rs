//! Shared model handle
//!
//! Readers take a cheap `Arc` snapshot of the current model; a retrain swaps
//! the pointer under a short write lock, so in-flight reconstructions finish
//! on the model they started with.

use super::{LlrConfig, LlrEngine, TrainedModel};
use crate::dataset::{Dataset, Row};
use crate::error::{LlrError, Result};
use crate::reconstruct::ReconstructionResult;
use parking_lot::RwLock;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{info, warn};

/// Thread-safe, republishable handle to a [`TrainedModel`]
#[derive(Debug, Clone, Default)]
pub struct SharedModel {
    inner: Arc<RwLock<Option<Arc<TrainedModel>>>>,
}

impl SharedModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current model, returning the previous one
    pub fn publish(&self, model: Arc<TrainedModel>) -> Option<Arc<TrainedModel>> {
        self.inner.write().replace(model)
    }

    /// Snapshot of the current model
    pub fn current(&self) -> Result<Arc<TrainedModel>> {
        self.inner.read().clone().ok_or(LlrError::NotTrained)
    }

    pub fn is_trained(&self) -> bool {
        self.inner.read().is_some()
    }

    /// Reconstruct against the current snapshot
    pub fn reconstruct(&self, row: &Row) -> Result<ReconstructionResult> {
        self.current()?.reconstruct(row)
    }

    /// Train on a worker thread and publish the model on success.
    ///
    /// The handle stays on its previous model, if any, until training
    /// finishes; a failed training leaves it untouched.
    pub fn train_in_background(&self, config: LlrConfig, dataset: Dataset, target: usize) -> JoinHandle<Result<()>> {
        let handle = self.clone();
        thread::spawn(move || {
            let outcome = LlrEngine::new(config).and_then(|mut engine| engine.train(&dataset, target));
            match outcome {
                Ok(model) => {
                    let pool = model.pool_size();
                    handle.publish(model);
                    info!(pool, "Published retrained model");
                    Ok(())
                }
                Err(err) => {
                    warn!(error = %err, "Background training failed");
                    Err(err)
                }
            }
        })
    }
}
