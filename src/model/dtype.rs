use std::fmt;

use crate::model::value::Value;

/// Column type.
///
/// A column holds values of exactly one `DType` plus nulls. `Categorical`
/// carries its declared level set in order; the levels are the column's
/// domain whether or not every level is observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DType {
    Bool,
    Int,
    Float,
    Str,
    Timestamp,
    Categorical { levels: Vec<String> },
}

impl DType {
    /// Combines the types of two non-null values seen in one column.
    /// Int and Float widen to Float; anything else must match exactly.
    pub fn widen(&self, other: &DType) -> Option<DType> {
        if self == other {
            return Some(self.clone());
        }
        match (self, other) {
            (DType::Int, DType::Float) | (DType::Float, DType::Int) => Some(DType::Float),
            _ => None,
        }
    }

    /// Fits a value into this column type. `None` means the value cannot
    /// belong to a column of this type.
    pub fn coerce(&self, value: Value) -> Option<Value> {
        match (self, value) {
            (_, Value::Null) => Some(Value::Null),
            (DType::Bool, v @ Value::Bool(_)) => Some(v),
            (DType::Int, v @ Value::Int(_)) => Some(v),
            (DType::Float, v @ Value::Float(_)) => Some(v),
            (DType::Float, Value::Int(i)) => Some(Value::Float(i as f64)),
            (DType::Str, v @ Value::Str(_)) => Some(v),
            (DType::Timestamp, v @ Value::Timestamp(_)) => Some(v),
            (DType::Categorical { levels }, Value::Str(s)) => {
                if levels.iter().any(|l| l == &s) {
                    Some(Value::Str(s))
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, DType::Int | DType::Float)
    }

    pub fn name(&self) -> &'static str {
        match self {
            DType::Bool => "bool",
            DType::Int => "int",
            DType::Float => "float",
            DType::Str => "string",
            DType::Timestamp => "timestamp",
            DType::Categorical { .. } => "categorical",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DType::Categorical { levels } => {
                write!(f, "categorical[{}]", levels.join(", "))
            }
            other => write!(f, "{}", other.name()),
        }
    }
}
