//! Left join

use log::debug;
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::model::{ColumnSpec, Schema, Table, Value};

/// Left outer join on the named key columns.
///
/// Output rows follow left row order; a left row matching several right
/// rows appears once per match, in right row order. Unmatched left rows
/// carry `Null` in the right-hand columns. Right key columns are not
/// repeated, and any other shared column name is rejected.
pub fn left_join(left: &Table, right: &Table, by: &[&str]) -> Result<Table> {
    if by.is_empty() {
        return Err(Error::schema_mismatch(
            "join requires at least one key column",
        ));
    }
    let lkeys: Vec<usize> = by
        .iter()
        .map(|name| left.schema().index_of(name))
        .collect::<Result<_>>()?;
    let rkeys: Vec<usize> = by
        .iter()
        .map(|name| right.schema().index_of(name))
        .collect::<Result<_>>()?;
    for (name, (&l, &r)) in by.iter().zip(lkeys.iter().zip(&rkeys)) {
        let ldt = &left.schema().spec(l).dtype;
        let rdt = &right.schema().spec(r).dtype;
        if ldt != rdt {
            return Err(Error::schema_mismatch(format!(
                "join key '{name}': left is {ldt}, right is {rdt}"
            )));
        }
    }

    let payload: Vec<usize> = (0..right.ncols()).filter(|i| !rkeys.contains(i)).collect();
    for &i in &payload {
        let name = &right.schema().spec(i).name;
        if left.schema().contains(name) {
            return Err(Error::schema_mismatch(format!(
                "column '{name}' exists on both sides and is not a join key"
            )));
        }
    }

    let mut specs: Vec<ColumnSpec> = left.schema().specs().to_vec();
    for &i in &payload {
        let mut spec = right.schema().spec(i).clone();
        spec.nullable = true;
        specs.push(spec);
    }
    let schema = Schema::new(specs)?;

    let mut right_index: FxHashMap<Vec<Value>, Vec<usize>> = FxHashMap::default();
    for row in 0..right.nrows() {
        let key: Vec<Value> = rkeys.iter().map(|&c| right.value(row, c).clone()).collect();
        right_index.entry(key).or_default().push(row);
    }

    // (left row, matching right row if any), one entry per output row
    let mut pairs: Vec<(usize, Option<usize>)> = Vec::with_capacity(left.nrows());
    for lrow in 0..left.nrows() {
        let key: Vec<Value> = lkeys.iter().map(|&c| left.value(lrow, c).clone()).collect();
        match right_index.get(&key) {
            Some(rrows) => pairs.extend(rrows.iter().map(|&r| (lrow, Some(r)))),
            None => pairs.push((lrow, None)),
        }
    }

    let mut columns: Vec<Vec<Value>> = Vec::with_capacity(schema.len());
    for c in 0..left.ncols() {
        columns.push(
            pairs
                .iter()
                .map(|&(lrow, _)| left.value(lrow, c).clone())
                .collect(),
        );
    }
    for &c in &payload {
        columns.push(
            pairs
                .iter()
                .map(|&(_, rrow)| match rrow {
                    Some(r) => right.value(r, c).clone(),
                    None => Value::Null,
                })
                .collect(),
        );
    }
    debug!(
        "left_join on [{}]: {} left rows -> {} output rows",
        by.join(", "),
        left.nrows(),
        pairs.len()
    );
    Table::new(schema, columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DType;

    fn orders() -> Table {
        Table::new(
            Schema::new(vec![
                ColumnSpec::new("id", DType::Int),
                ColumnSpec::new("item", DType::Str),
            ])
            .unwrap(),
            vec![
                vec![Value::Int(1), Value::Int(2), Value::Int(3)],
                vec![Value::from("pen"), Value::from("ink"), Value::from("pad")],
            ],
        )
        .unwrap()
    }

    fn shipments() -> Table {
        Table::new(
            Schema::new(vec![
                ColumnSpec::new("id", DType::Int),
                ColumnSpec::new("carrier", DType::Str),
            ])
            .unwrap(),
            vec![
                vec![Value::Int(2), Value::Int(1), Value::Int(1)],
                vec![Value::from("dhl"), Value::from("ups"), Value::from("fedex")],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_left_join_multiplies_matches_in_right_order() {
        let out = left_join(&orders(), &shipments(), &["id"]).unwrap();
        assert_eq!(
            out.schema().names().collect::<Vec<_>>(),
            vec!["id", "item", "carrier"]
        );
        assert_eq!(
            out.column("id").unwrap(),
            &[Value::Int(1), Value::Int(1), Value::Int(2), Value::Int(3)]
        );
        assert_eq!(
            out.column("carrier").unwrap(),
            &[
                Value::from("ups"),
                Value::from("fedex"),
                Value::from("dhl"),
                Value::Null
            ]
        );
    }

    #[test]
    fn test_unmatched_left_rows_keep_nulls() {
        let out = left_join(&orders(), &shipments(), &["id"]).unwrap();
        let last = out.row_values(out.nrows() - 1);
        assert_eq!(last, vec![Value::Int(3), Value::from("pad"), Value::Null]);
    }

    #[test]
    fn test_overlapping_non_key_column_rejected() {
        let right = Table::new(
            Schema::new(vec![
                ColumnSpec::new("id", DType::Int),
                ColumnSpec::new("item", DType::Str),
            ])
            .unwrap(),
            vec![vec![Value::Int(1)], vec![Value::from("x")]],
        )
        .unwrap();
        assert!(matches!(
            left_join(&orders(), &right, &["id"]),
            Err(Error::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_key_dtype_mismatch_rejected() {
        let right = Table::new(
            Schema::new(vec![
                ColumnSpec::new("id", DType::Str),
                ColumnSpec::new("carrier", DType::Str),
            ])
            .unwrap(),
            vec![vec![Value::from("1")], vec![Value::from("dhl")]],
        )
        .unwrap();
        assert!(matches!(
            left_join(&orders(), &right, &["id"]),
            Err(Error::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_missing_key_column() {
        assert!(matches!(
            left_join(&orders(), &shipments(), &["sku"]),
            Err(Error::UnknownColumn { .. })
        ));
    }
}
