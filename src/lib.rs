//! LLR Impute - missing-value imputation by Local Linear Reconstruction
//!
//! Each incomplete row is rebuilt as a non-negative weighted combination of
//! its nearest complete neighbors:
//! - Exact or approximate neighbor search over the complete rows
//! - Weight solving by uniform averaging, coordinate descent or a convex QP
//! - Numeric values filled by weighted sum, nominal values by weighted vote
//!
//! # Modules
//!
//! - [`dataset`] - Rows, values and schemas
//! - [`selection`] - Linear-time top-k selection
//! - [`neighbors`] - Exact and graph-based neighbor sources
//! - [`solver`] - Non-negative reconstruction weights
//! - [`reconstruct`] - Filling missing values from weights
//! - [`engine`] - Training, reconstruction and shared models
//! - [`imputation`] - Matrix imputer on top of the engine
//!
//! # Example
//!
//! ```no_run
//! use llr_impute::prelude::*;
//!
//! # fn main() -> llr_impute::Result<()> {
//! let x = ndarray::array![
//!     [1.0, 2.0, 3.0, 0.0],
//!     [2.0, 3.0, 4.0, 1.0],
//!     [3.0, 4.0, 5.0, 0.0],
//!     [f64::NAN, 3.5, 4.5, 1.0],
//! ];
//! let mut engine = LlrEngine::new(LlrConfig::default().with_k(3))?;
//! let dataset = Dataset::from_array(&x)?;
//! engine.train(&dataset, 3)?;
//! let report = engine.impute(&dataset)?;
//! assert_eq!(report.dataset.count_incomplete(), 0);
//! # Ok(())
//! # }
//! ```

pub mod error;

pub mod dataset;
pub mod selection;
pub mod neighbors;
pub mod solver;
pub mod reconstruct;
pub mod engine;
pub mod imputation;

pub use error::{LlrError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{LlrError, Result};

    pub use crate::dataset::{Attribute, AttributeKind, Dataset, Row, Schema, Value};

    pub use crate::neighbors::{
        DistanceMetric, GraphConfig, KnnGraphBuilder, Neighbor, NeighborSource, NeighborStrategy,
        SimilarityIndex, SimilarityIndexBuilder,
    };

    pub use crate::solver::{
        ConvexOptimizer, LeastSquaresProblem, ProjectedGradient, QpConfig, QuadraticProgram, SolverStrategy,
        WeightSolver,
    };

    pub use crate::reconstruct::{ReconstructionResult, TargetEstimate};

    pub use crate::engine::{ImputationReport, LlrConfig, LlrEngine, SharedModel, TrainedModel};

    pub use crate::imputation::{Imputer, LlrImputer};
}
