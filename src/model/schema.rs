//! Column metadata

use crate::error::{Error, Result};
use crate::model::dtype::DType;

/// Name, type, and nullability of one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub dtype: DType,
    pub nullable: bool,
}

impl ColumnSpec {
    /// A nullable column. Inferred schemas always produce these.
    pub fn new(name: impl Into<String>, dtype: DType) -> Self {
        ColumnSpec {
            name: name.into(),
            dtype,
            nullable: true,
        }
    }

    /// A column that rejects nulls at construction.
    pub fn non_nullable(name: impl Into<String>, dtype: DType) -> Self {
        ColumnSpec {
            name: name.into(),
            dtype,
            nullable: false,
        }
    }
}

/// Ordered column specs. Column order is part of a table's identity and
/// every operation states how it affects it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    specs: Vec<ColumnSpec>,
}

impl Schema {
    pub fn new(specs: Vec<ColumnSpec>) -> Result<Self> {
        for (i, spec) in specs.iter().enumerate() {
            if specs[..i].iter().any(|s| s.name == spec.name) {
                return Err(Error::schema_mismatch(format!(
                    "duplicate column name '{}'",
                    spec.name
                )));
            }
        }
        Ok(Schema { specs })
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn specs(&self) -> &[ColumnSpec] {
        &self.specs
    }

    pub fn spec(&self, idx: usize) -> &ColumnSpec {
        &self.specs[idx]
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().map(|s| s.name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.specs.iter().any(|s| s.name == name)
    }

    /// Position of a column, or `UnknownColumn`.
    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.specs
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| Error::unknown_column(name))
    }

    pub fn dtype_of(&self, name: &str) -> Result<&DType> {
        Ok(&self.specs[self.index_of(name)?].dtype)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_names_rejected() {
        let result = Schema::new(vec![
            ColumnSpec::new("a", DType::Int),
            ColumnSpec::new("a", DType::Float),
        ]);
        assert!(matches!(result, Err(Error::SchemaMismatch { .. })));
    }

    #[test]
    fn test_index_of_unknown_column() {
        let schema = Schema::new(vec![ColumnSpec::new("a", DType::Int)]).unwrap();
        assert_eq!(schema.index_of("a").unwrap(), 0);
        match schema.index_of("b") {
            Err(Error::UnknownColumn { name }) => assert_eq!(name, "b"),
            other => panic!("expected UnknownColumn, got {other:?}"),
        }
    }
}
