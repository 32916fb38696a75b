//! Column selection

use std::ops::Range;

use regex::Regex;

use crate::error::{Error, Result};
use crate::model::dtype::DType;
use crate::model::schema::Schema;

/// Picks columns by name, position, name pattern, or type.
///
/// Name selectors must match (`UnknownColumn` otherwise); pattern and type
/// selectors may legitimately match nothing.
#[derive(Debug, Clone)]
pub enum Selector {
    Name(String),
    Names(Vec<String>),
    /// Half-open position range over the current column order.
    Positions(Range<usize>),
    StartsWith(String),
    EndsWith(String),
    Contains(String),
    Matches(Regex),
    OfType(TypeSelector),
}

/// Type predicate for [`Selector::OfType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeSelector {
    Numeric,
    Bool,
    Int,
    Float,
    Str,
    Timestamp,
    Categorical,
}

impl TypeSelector {
    pub fn matches(&self, dtype: &DType) -> bool {
        match self {
            TypeSelector::Numeric => dtype.is_numeric(),
            TypeSelector::Bool => *dtype == DType::Bool,
            TypeSelector::Int => *dtype == DType::Int,
            TypeSelector::Float => *dtype == DType::Float,
            TypeSelector::Str => *dtype == DType::Str,
            TypeSelector::Timestamp => *dtype == DType::Timestamp,
            TypeSelector::Categorical => matches!(dtype, DType::Categorical { .. }),
        }
    }
}

impl Selector {
    pub fn name(name: impl Into<String>) -> Self {
        Selector::Name(name.into())
    }

    pub fn names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Selector::Names(names.into_iter().map(Into::into).collect())
    }

    pub fn starts_with(prefix: impl Into<String>) -> Self {
        Selector::StartsWith(prefix.into())
    }

    pub fn ends_with(suffix: impl Into<String>) -> Self {
        Selector::EndsWith(suffix.into())
    }

    pub fn contains(needle: impl Into<String>) -> Self {
        Selector::Contains(needle.into())
    }

    /// Regex selector; the pattern is matched anywhere in the name.
    pub fn matches(pattern: &str) -> std::result::Result<Self, regex::Error> {
        Ok(Selector::Matches(Regex::new(pattern)?))
    }

    /// Positions this selector matches, in match order.
    pub(crate) fn resolve(&self, schema: &Schema) -> Result<Vec<usize>> {
        match self {
            Selector::Name(name) => Ok(vec![schema.index_of(name)?]),
            Selector::Names(names) => {
                names.iter().map(|n| schema.index_of(n)).collect()
            }
            Selector::Positions(range) => {
                if range.end > schema.len() {
                    return Err(Error::schema_mismatch(format!(
                        "position range {}..{} out of bounds for {} columns",
                        range.start,
                        range.end,
                        schema.len()
                    )));
                }
                Ok(range.clone().collect())
            }
            Selector::StartsWith(prefix) => Ok(filter_names(schema, |n| n.starts_with(prefix))),
            Selector::EndsWith(suffix) => Ok(filter_names(schema, |n| n.ends_with(suffix))),
            Selector::Contains(needle) => Ok(filter_names(schema, |n| n.contains(needle))),
            Selector::Matches(re) => Ok(filter_names(schema, |n| re.is_match(n))),
            Selector::OfType(pred) => Ok(schema
                .specs()
                .iter()
                .enumerate()
                .filter(|(_, s)| pred.matches(&s.dtype))
                .map(|(i, _)| i)
                .collect()),
        }
    }

    /// Resolves a selector list into one position list, keeping the first
    /// occurrence of each column.
    pub(crate) fn resolve_many(selectors: &[Selector], schema: &Schema) -> Result<Vec<usize>> {
        let mut out = Vec::new();
        for selector in selectors {
            for idx in selector.resolve(schema)? {
                if !out.contains(&idx) {
                    out.push(idx);
                }
            }
        }
        Ok(out)
    }
}

fn filter_names(schema: &Schema, pred: impl Fn(&str) -> bool) -> Vec<usize> {
    schema
        .names()
        .enumerate()
        .filter(|(_, n)| pred(n))
        .map(|(i, _)| i)
        .collect()
}

/// Target position for [`Table::relocate`](crate::Table::relocate).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anchor {
    First,
    Last,
    Before(String),
    After(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::schema::ColumnSpec;

    fn schema() -> Schema {
        Schema::new(vec![
            ColumnSpec::new("id", DType::Int),
            ColumnSpec::new("score_a", DType::Float),
            ColumnSpec::new("score_b", DType::Float),
            ColumnSpec::new("label", DType::Str),
        ])
        .unwrap()
    }

    #[test]
    fn test_name_selector_requires_match() {
        let s = schema();
        assert_eq!(Selector::name("label").resolve(&s).unwrap(), vec![3]);
        assert!(matches!(
            Selector::name("nope").resolve(&s),
            Err(Error::UnknownColumn { .. })
        ));
    }

    #[test]
    fn test_pattern_selectors_may_match_nothing() {
        let s = schema();
        assert_eq!(
            Selector::starts_with("score").resolve(&s).unwrap(),
            vec![1, 2]
        );
        assert!(Selector::starts_with("zzz").resolve(&s).unwrap().is_empty());
        assert_eq!(
            Selector::matches("^score_[ab]$").unwrap().resolve(&s).unwrap(),
            vec![1, 2]
        );
    }

    #[test]
    fn test_position_range_bounds() {
        let s = schema();
        assert_eq!(Selector::Positions(1..3).resolve(&s).unwrap(), vec![1, 2]);
        assert!(matches!(
            Selector::Positions(2..9).resolve(&s),
            Err(Error::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_type_selector() {
        let s = schema();
        assert_eq!(
            Selector::OfType(TypeSelector::Numeric).resolve(&s).unwrap(),
            vec![0, 1, 2]
        );
        assert_eq!(
            Selector::OfType(TypeSelector::Str).resolve(&s).unwrap(),
            vec![3]
        );
    }

    #[test]
    fn test_resolve_many_dedups_keeping_first() {
        let s = schema();
        let resolved = Selector::resolve_many(
            &[Selector::name("score_b"), Selector::starts_with("score")],
            &s,
        )
        .unwrap();
        assert_eq!(resolved, vec![2, 1]);
    }
}
