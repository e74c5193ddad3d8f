//! Distance metrics over numeric attributes

use crate::dataset::Row;
use crate::error::{LlrError, Result};
use serde::{Deserialize, Serialize};

/// Distance metric used by exact neighbor search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum DistanceMetric {
    /// Sum of absolute per-attribute differences
    #[default]
    Manhattan,
    /// Square root of the sum of squared differences
    Euclidean,
    /// Euclidean with one non-negative weight per schema attribute
    WeightedEuclidean { weights: Vec<f64> },
}

impl DistanceMetric {
    /// Distance between `a` and `b` restricted to `attributes`.
    ///
    /// Attributes missing in either row are skipped.
    pub fn distance(&self, a: &Row, b: &Row, attributes: &[usize]) -> f64 {
        let pairs = attributes
            .iter()
            .filter_map(|&i| Some((i, a.numeric(i)?, b.numeric(i)?)));

        match self {
            DistanceMetric::Manhattan => pairs.map(|(_, va, vb)| (va - vb).abs()).sum(),
            DistanceMetric::Euclidean => pairs
                .map(|(_, va, vb)| (va - vb) * (va - vb))
                .sum::<f64>()
                .sqrt(),
            DistanceMetric::WeightedEuclidean { weights } => pairs
                .map(|(i, va, vb)| {
                    let w = weights.get(i).copied().unwrap_or(1.0);
                    w * (va - vb) * (va - vb)
                })
                .sum::<f64>()
                .sqrt(),
        }
    }

    /// Check the metric against a schema with `n_attributes` attributes
    pub fn validate(&self, n_attributes: usize) -> Result<()> {
        if let DistanceMetric::WeightedEuclidean { weights } = self {
            if weights.len() != n_attributes {
                return Err(LlrError::InvalidArgument(format!(
                    "weighted euclidean needs {} weights, got {}",
                    n_attributes,
                    weights.len()
                )));
            }
            if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
                return Err(LlrError::InvalidArgument(
                    "attribute weights must be finite and non-negative".to_string(),
                ));
            }
        }
        Ok(())
    }
}
