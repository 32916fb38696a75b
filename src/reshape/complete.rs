//! Completing a table against an expansion grid

use log::debug;
use rustc_hash::FxHashSet;

use crate::error::{Error, Result};
use crate::join::left_join;
use crate::model::{Table, Value};
use crate::reshape::expand::{expand, ExpandSpec};

/// Expands the given axes into their full grid, joins the original rows
/// back on, and applies `fill` defaults to the rows the grid introduced.
///
/// Pre-existing rows come through untouched, nulls included: `fill` only
/// ever writes into cells of rows that did not exist before. Output order
/// is grid order; where a combination matched several original rows they
/// all appear, in original relative order. Grid columns come first,
/// remaining columns after, in original order.
pub fn complete(table: &Table, specs: &[ExpandSpec], fill: &[(&str, Value)]) -> Result<Table> {
    let grid = expand(table, specs)?;
    let by: Vec<&str> = grid.schema().names().collect();

    let key_indices: Vec<usize> = by
        .iter()
        .map(|name| table.schema().index_of(name))
        .collect::<Result<_>>()?;
    let mut observed: FxHashSet<Vec<Value>> = FxHashSet::default();
    for row in 0..table.nrows() {
        observed.insert(
            key_indices
                .iter()
                .map(|&c| table.value(row, c).clone())
                .collect(),
        );
    }

    let joined = left_join(&grid, table, &by)?;

    let fill_indices: Vec<(usize, Value)> = fill
        .iter()
        .map(|(name, value)| {
            let idx = joined.schema().index_of(name)?;
            let dtype = &joined.schema().spec(idx).dtype;
            let fitted = dtype.coerce(value.clone()).ok_or_else(|| {
                Error::schema_mismatch(format!(
                    "fill value for '{}': expected {}, got {}",
                    name,
                    dtype,
                    value.type_name()
                ))
            })?;
            Ok((idx, fitted))
        })
        .collect::<Result<_>>()?;

    let mut columns: Vec<Vec<Value>> = joined
        .columns()
        .iter()
        .map(|c| c.as_ref().clone())
        .collect();
    let mut introduced = 0usize;
    for row in 0..joined.nrows() {
        // grid columns sit first in the joined table, in `by` order
        let key: Vec<Value> = (0..by.len()).map(|c| columns[c][row].clone()).collect();
        if observed.contains(&key) {
            continue;
        }
        introduced += 1;
        for (idx, value) in &fill_indices {
            if columns[*idx][row].is_null() {
                columns[*idx][row] = value.clone();
            }
        }
    }
    debug!(
        "complete: {} grid rows, {} introduced, {} total",
        grid.nrows(),
        introduced,
        joined.nrows()
    );
    Table::new(joined.schema().clone(), columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ColumnSpec, DType, Schema};

    fn visits() -> Table {
        Table::new(
            Schema::new(vec![
                ColumnSpec::new("day", DType::Int),
                ColumnSpec::new("site", DType::Str),
                ColumnSpec::new("hits", DType::Int),
            ])
            .unwrap(),
            vec![
                vec![Value::Int(1), Value::Int(3), Value::Int(1)],
                vec![Value::from("n"), Value::from("n"), Value::from("m")],
                vec![Value::Int(10), Value::Int(30), Value::Null],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_complete_adds_missing_combinations() {
        let out = complete(
            &visits(),
            &[ExpandSpec::column("day"), ExpandSpec::column("site")],
            &[("hits", Value::Int(0))],
        )
        .unwrap();
        // grid: (1,m),(1,n),(3,m),(3,n); (3,m) is new
        assert_eq!(out.nrows(), 4);
        assert_eq!(
            out.schema().names().collect::<Vec<_>>(),
            vec!["day", "site", "hits"]
        );
        let hits = out.column("hits").unwrap();
        // (1,m) existed with a null: untouched. (3,m) introduced: filled.
        assert_eq!(hits, &[Value::Null, Value::Int(10), Value::Int(0), Value::Int(30)]);
    }

    #[test]
    fn test_complete_never_touches_existing_cells() {
        let before = visits();
        let out = complete(
            &before,
            &[ExpandSpec::column("day"), ExpandSpec::column("site")],
            &[("hits", Value::Int(99))],
        )
        .unwrap();
        for row in 0..before.nrows() {
            let day = before.value(row, 0);
            let site = before.value(row, 1);
            let hits = before.value(row, 2);
            let found = (0..out.nrows()).any(|r| {
                out.value(r, 0) == day && out.value(r, 1) == site && out.value(r, 2) == hits
            });
            assert!(found, "original row {row} was altered");
        }
    }

    #[test]
    fn test_complete_with_explicit_domain() {
        let t = Table::new(
            Schema::new(vec![
                ColumnSpec::new("day", DType::Int),
                ColumnSpec::new("val", DType::Int),
            ])
            .unwrap(),
            vec![
                vec![Value::Int(1), Value::Int(4)],
                vec![Value::Int(10), Value::Int(40)],
            ],
        )
        .unwrap();
        let out = complete(
            &t,
            &[ExpandSpec::with(
                "day",
                vec![Value::Int(1), Value::Int(2), Value::Int(3), Value::Int(4)],
            )],
            &[],
        )
        .unwrap();
        assert_eq!(out.nrows(), 4);
        assert_eq!(
            out.column("val").unwrap(),
            &[Value::Int(10), Value::Null, Value::Null, Value::Int(40)]
        );
    }

    #[test]
    fn test_complete_keeps_duplicate_matches() {
        let t = Table::new(
            Schema::new(vec![
                ColumnSpec::new("k", DType::Int),
                ColumnSpec::new("v", DType::Str),
            ])
            .unwrap(),
            vec![
                vec![Value::Int(2), Value::Int(1), Value::Int(2)],
                vec![Value::from("x"), Value::from("y"), Value::from("z")],
            ],
        )
        .unwrap();
        let out = complete(&t, &[ExpandSpec::column("k")], &[]).unwrap();
        // k=2 matched twice, in original relative order
        assert_eq!(
            out.column("v").unwrap(),
            &[Value::from("y"), Value::from("x"), Value::from("z")]
        );
    }

    #[test]
    fn test_fill_value_must_fit_column_type() {
        let result = complete(
            &visits(),
            &[ExpandSpec::column("day")],
            &[("hits", Value::from("zero"))],
        );
        assert!(matches!(result, Err(Error::SchemaMismatch { .. })));
    }
}
