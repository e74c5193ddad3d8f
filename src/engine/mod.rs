//! LLR engine module
//!
//! Provides training and reconstruction with:
//! - A complete-row pool built once per training run
//! - Exact or approximate neighbor search
//! - Configurable weight solving
//! - Parallel dataset-wide imputation via rayon
//! - An atomically republished shared model handle

mod config;
#[allow(clippy::module_inception)]
mod engine;
mod shared;

pub use config::LlrConfig;
pub use engine::{ImputationReport, LlrEngine, SkippedRow, TrainedModel};
pub use shared::SharedModel;
