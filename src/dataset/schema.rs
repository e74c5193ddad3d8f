//! Dataset-wide attribute layout

use crate::dataset::{Row, Value};
use crate::error::{LlrError, Result};
use serde::{Deserialize, Serialize};

/// Attribute type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeKind {
    /// Real-valued attribute
    Numeric,
    /// Attribute over a finite symbol set
    Nominal { symbols: Vec<String> },
}

/// A named attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub kind: AttributeKind,
}

impl Attribute {
    /// Numeric attribute
    pub fn numeric(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::Numeric,
        }
    }

    /// Nominal attribute over `symbols`
    pub fn nominal<S: Into<String>>(name: impl Into<String>, symbols: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::Nominal {
                symbols: symbols.into_iter().map(Into::into).collect(),
            },
        }
    }

    #[inline]
    pub fn is_numeric(&self) -> bool {
        matches!(self.kind, AttributeKind::Numeric)
    }

    #[inline]
    pub fn is_nominal(&self) -> bool {
        matches!(self.kind, AttributeKind::Nominal { .. })
    }

    /// Size of the symbol set (0 for numeric attributes)
    pub fn num_symbols(&self) -> usize {
        match &self.kind {
            AttributeKind::Nominal { symbols } => symbols.len(),
            AttributeKind::Numeric => 0,
        }
    }
}

/// Ordered attribute layout plus the distinguished target attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    attributes: Vec<Attribute>,
    target: Option<usize>,
}

impl Schema {
    /// Create a schema without a target
    pub fn new(attributes: Vec<Attribute>) -> Self {
        Self {
            attributes,
            target: None,
        }
    }

    /// All-numeric schema with generated names
    pub fn numeric(n_attributes: usize) -> Self {
        Self::new(
            (0..n_attributes)
                .map(|i| Attribute::numeric(format!("attr_{}", i)))
                .collect(),
        )
    }

    /// Set the target attribute
    pub fn with_target(mut self, target: usize) -> Result<Self> {
        if target >= self.attributes.len() {
            return Err(LlrError::InvalidArgument(format!(
                "target index {} out of range for {} attributes",
                target,
                self.attributes.len()
            )));
        }
        self.target = Some(target);
        Ok(self)
    }

    pub fn num_attributes(&self) -> usize {
        self.attributes.len()
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn attribute(&self, index: usize) -> Option<&Attribute> {
        self.attributes.get(index)
    }

    pub fn target(&self) -> Option<usize> {
        self.target
    }

    #[inline]
    pub fn is_target(&self, index: usize) -> bool {
        self.target == Some(index)
    }

    /// Whether two schemas share the same attribute layout (target ignored)
    pub fn same_layout(&self, other: &Schema) -> bool {
        self.attributes == other.attributes
    }

    /// Check that `row` conforms to this layout
    pub fn check_row(&self, row: &Row) -> Result<()> {
        if row.len() != self.attributes.len() {
            return Err(LlrError::SchemaMismatch(format!(
                "row has {} values, schema has {} attributes",
                row.len(),
                self.attributes.len()
            )));
        }

        for (i, (value, attr)) in row.values().iter().zip(&self.attributes).enumerate() {
            match (value, &attr.kind) {
                (Value::Missing, _) => {}
                (Value::Numeric(v), AttributeKind::Numeric) => {
                    if !v.is_finite() {
                        return Err(LlrError::SchemaMismatch(format!(
                            "attribute {} ('{}') holds non-finite value {}",
                            i, attr.name, v
                        )));
                    }
                }
                (Value::Nominal(s), AttributeKind::Nominal { symbols }) => {
                    if *s >= symbols.len() {
                        return Err(LlrError::SchemaMismatch(format!(
                            "attribute {} ('{}') symbol {} out of range for {} symbols",
                            i,
                            attr.name,
                            s,
                            symbols.len()
                        )));
                    }
                }
                _ => {
                    return Err(LlrError::SchemaMismatch(format!(
                        "attribute {} ('{}') value {:?} does not match kind {:?}",
                        i, attr.name, value, attr.kind
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixed_schema() -> Schema {
        Schema::new(vec![
            Attribute::numeric("x"),
            Attribute::nominal("color", ["red", "green"]),
        ])
    }

    #[test]
    fn test_check_row_accepts_conforming() {
        let schema = mixed_schema();
        let row = Row::new(vec![Value::Numeric(1.5), Value::Nominal(1)]);
        assert!(schema.check_row(&row).is_ok());
        let row = Row::new(vec![Value::Missing, Value::Missing]);
        assert!(schema.check_row(&row).is_ok());
    }

    #[test]
    fn test_check_row_rejects_bad_symbol_and_kind() {
        let schema = mixed_schema();
        let bad_symbol = Row::new(vec![Value::Numeric(1.0), Value::Nominal(2)]);
        assert!(matches!(schema.check_row(&bad_symbol), Err(LlrError::SchemaMismatch(_))));
        let bad_kind = Row::new(vec![Value::Nominal(0), Value::Nominal(0)]);
        assert!(matches!(schema.check_row(&bad_kind), Err(LlrError::SchemaMismatch(_))));
        let short = Row::new(vec![Value::Numeric(1.0)]);
        assert!(matches!(schema.check_row(&short), Err(LlrError::SchemaMismatch(_))));
    }

    #[test]
    fn test_with_target_bounds() {
        assert!(mixed_schema().with_target(1).is_ok());
        assert!(matches!(mixed_schema().with_target(2), Err(LlrError::InvalidArgument(_))));
    }

    #[test]
    fn test_same_layout_ignores_target() {
        let a = mixed_schema();
        let b = mixed_schema().with_target(1).unwrap();
        assert!(a.same_layout(&b));
        assert_ne!(a, b);
    }
}
