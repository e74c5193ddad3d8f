//! Tabular data model
//!
//! Rows of typed values laid out by a dataset-wide [`Schema`]. A value is
//! numeric, a nominal symbol index, or missing.

mod row;
mod schema;

pub use row::{Row, Value};
pub use schema::{Attribute, AttributeKind, Schema};

use crate::error::{LlrError, Result};
use ndarray::Array2;
use std::sync::Arc;

/// Schema plus rows conforming to it
#[derive(Debug, Clone)]
pub struct Dataset {
    schema: Arc<Schema>,
    rows: Vec<Row>,
}

impl Dataset {
    /// Create a dataset, checking every row against the schema
    pub fn new(schema: Schema, rows: Vec<Row>) -> Result<Self> {
        for (i, row) in rows.iter().enumerate() {
            schema.check_row(row).map_err(|e| match e {
                LlrError::SchemaMismatch(msg) => LlrError::SchemaMismatch(format!("row {}: {}", i, msg)),
                other => other,
            })?;
        }
        Ok(Self {
            schema: Arc::new(schema),
            rows,
        })
    }

    /// All-numeric dataset from a matrix; NaN marks a missing value
    pub fn from_array(x: &Array2<f64>) -> Result<Self> {
        if x.ncols() == 0 {
            return Err(LlrError::InvalidArgument("matrix has no columns".to_string()));
        }
        let rows = x
            .rows()
            .into_iter()
            .map(|r| Row::from_numeric(&r.to_vec()))
            .collect();
        Self::new(Schema::numeric(x.ncols()), rows)
    }

    /// Numeric matrix view; missing values become NaN
    pub fn to_array(&self) -> Result<Array2<f64>> {
        let n_cols = self.schema.num_attributes();
        let flat: Vec<f64> = self
            .rows
            .iter()
            .flat_map(|row| row.values().iter().map(|v| v.as_f64().unwrap_or(f64::NAN)))
            .collect();
        Ok(Array2::from_shape_vec((self.rows.len(), n_cols), flat)?)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of rows with at least one missing value
    pub fn count_incomplete(&self) -> usize {
        self.rows.iter().filter(|r| r.has_missing()).count()
    }

    pub(crate) fn with_rows(&self, rows: Vec<Row>) -> Self {
        Self {
            schema: Arc::clone(&self.schema),
            rows,
        }
    }
}
