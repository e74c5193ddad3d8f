//! Filling missing values from solved weights
//!
//! Numeric attributes take the weighted sum of the neighbors' values. Nominal
//! attributes accumulate weight per symbol and take the arg-max. A missing
//! target is returned as an estimate instead of being written into the row.

use crate::dataset::{AttributeKind, Row, Schema, Value};
use crate::error::{LlrError, Result};
use crate::neighbors::Neighbor;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Known and missing attributes of a query row
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AttributeSplit {
    /// Present numeric non-target attributes; these drive search and solving
    pub complete: Vec<usize>,
    /// Missing attributes of any kind, target included
    pub incomplete: Vec<usize>,
}

impl AttributeSplit {
    pub fn of(row: &Row, schema: &Schema) -> Self {
        let mut split = Self::default();
        for (i, attr) in schema.attributes().iter().enumerate() {
            if row.is_missing(i) {
                split.incomplete.push(i);
            } else if attr.is_numeric() && !schema.is_target(i) {
                split.complete.push(i);
            }
        }
        split
    }
}

/// Reconstructed target attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TargetEstimate {
    /// Weighted sum for a numeric target
    Numeric(f64),
    /// Weight mass per symbol for a nominal target
    Distribution(Vec<f64>),
}

impl TargetEstimate {
    /// Collapse to a single value: the numeric estimate or the arg-max symbol
    pub fn value(&self) -> f64 {
        match self {
            TargetEstimate::Numeric(v) => *v,
            TargetEstimate::Distribution(hist) => arg_max(hist) as f64,
        }
    }

    /// Estimate as a vector (`[value]` for numeric targets)
    pub fn to_vec(&self) -> Vec<f64> {
        match self {
            TargetEstimate::Numeric(v) => vec![*v],
            TargetEstimate::Distribution(hist) => hist.clone(),
        }
    }
}

/// A value written into the reconstructed row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilledValue {
    pub attribute: usize,
    pub value: Value,
}

/// Output of reconstructing one row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconstructionResult {
    /// Copy of the query with every missing non-target attribute filled
    pub row: Row,
    /// The filled attributes, in attribute order
    pub filled: Vec<FilledValue>,
    /// Estimate for the target when it was missing
    pub target: Option<TargetEstimate>,
    /// Neighbors used, aligned with `weights`
    pub neighbors: Vec<Neighbor>,
    pub weights: Vec<f64>,
}

/// Index of the largest entry; the lowest index wins ties
pub fn arg_max(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Builds filled rows from neighbors and weights
#[derive(Debug, Clone, Copy)]
pub struct RowReconstructor {
    min_attributes: usize,
}

impl RowReconstructor {
    pub fn new(min_attributes: usize) -> Self {
        Self { min_attributes }
    }

    pub fn min_attributes(&self) -> usize {
        self.min_attributes
    }

    /// Refuse ill-posed systems before any search or solve
    pub fn check_attributes(&self, split: &AttributeSplit) -> Result<()> {
        if split.complete.len() < self.min_attributes {
            return Err(LlrError::InsufficientAttributes {
                found: split.complete.len(),
                required: self.min_attributes,
            });
        }
        Ok(())
    }

    /// Fill `split.incomplete` from `neighbor_rows` weighted by `weights`
    pub fn reconstruct(
        &self,
        query: &Row,
        schema: &Schema,
        split: &AttributeSplit,
        neighbors: Vec<Neighbor>,
        neighbor_rows: &[&Row],
        weights: &Array1<f64>,
    ) -> Result<ReconstructionResult> {
        self.check_attributes(split)?;
        if neighbor_rows.len() != weights.len() || neighbors.len() != weights.len() {
            return Err(LlrError::InvalidArgument(format!(
                "{} neighbors, {} neighbor rows and {} weights",
                neighbors.len(),
                neighbor_rows.len(),
                weights.len()
            )));
        }

        let mut row = query.clone();
        let mut filled = Vec::with_capacity(split.incomplete.len());
        let mut target = None;

        for &attr_idx in &split.incomplete {
            let attr = schema.attribute(attr_idx).ok_or_else(|| {
                LlrError::SchemaMismatch(format!("attribute {} not in schema", attr_idx))
            })?;

            match &attr.kind {
                AttributeKind::Numeric => {
                    let mut sum = 0.0;
                    for (nb, &w) in neighbor_rows.iter().zip(weights.iter()) {
                        let v = nb.numeric(attr_idx).ok_or_else(|| {
                            LlrError::InvalidArgument(format!("neighbor attribute {} is missing", attr_idx))
                        })?;
                        sum += w * v;
                    }
                    if schema.is_target(attr_idx) {
                        target = Some(TargetEstimate::Numeric(sum));
                    } else {
                        let value = Value::Numeric(sum);
                        row.set(attr_idx, value);
                        filled.push(FilledValue { attribute: attr_idx, value });
                    }
                }
                AttributeKind::Nominal { symbols } => {
                    let mut hist = vec![0.0; symbols.len()];
                    for (nb, &w) in neighbor_rows.iter().zip(weights.iter()) {
                        match nb.value(attr_idx) {
                            Value::Nominal(s) if s < hist.len() => hist[s] += w,
                            other => {
                                return Err(LlrError::SchemaMismatch(format!(
                                    "neighbor value {:?} invalid for nominal attribute {} with {} symbols",
                                    other,
                                    attr_idx,
                                    symbols.len()
                                )))
                            }
                        }
                    }
                    if schema.is_target(attr_idx) {
                        target = Some(TargetEstimate::Distribution(hist));
                    } else {
                        let value = Value::Nominal(arg_max(&hist));
                        row.set(attr_idx, value);
                        filled.push(FilledValue { attribute: attr_idx, value });
                    }
                }
            }
        }

        Ok(ReconstructionResult {
            row,
            filled,
            target,
            neighbors,
            weights: weights.to_vec(),
        })
    }
}

impl Default for RowReconstructor {
    fn default() -> Self {
        Self::new(2)
    }
}
