//! Row values

use serde::{Deserialize, Serialize};

/// A single attribute value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Numeric value
    Numeric(f64),
    /// Index into the attribute's symbol set
    Nominal(usize),
    /// Missing value
    Missing,
}

impl Value {
    /// Whether the value is missing
    #[inline]
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Numeric view of the value; nominal values map to their symbol index
    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Numeric(v) => Some(v),
            Value::Nominal(s) => Some(s as f64),
            Value::Missing => None,
        }
    }
}

/// An ordered sequence of attribute values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    /// Create a row from values
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Create an all-numeric row; NaN entries become missing
    pub fn from_numeric(values: &[f64]) -> Self {
        Self {
            values: values
                .iter()
                .map(|&v| if v.is_nan() { Value::Missing } else { Value::Numeric(v) })
                .collect(),
        }
    }

    /// Number of attributes
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row has no attributes
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at `index`
    #[inline]
    pub fn value(&self, index: usize) -> Value {
        self.values.get(index).copied().unwrap_or(Value::Missing)
    }

    /// All values
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Whether the value at `index` is missing
    #[inline]
    pub fn is_missing(&self, index: usize) -> bool {
        self.value(index).is_missing()
    }

    /// Whether any value is missing
    pub fn has_missing(&self) -> bool {
        self.values.iter().any(Value::is_missing)
    }

    /// Numeric view of the value at `index`
    #[inline]
    pub fn numeric(&self, index: usize) -> Option<f64> {
        self.value(index).as_f64()
    }

    /// Replace the value at `index`; out-of-range indices are ignored
    pub(crate) fn set(&mut self, index: usize, value: Value) {
        if let Some(slot) = self.values.get_mut(index) {
            *slot = value;
        }
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}
