//! Wide/long reshaping

use indexmap::IndexMap;
use log::debug;
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::model::{ColumnSpec, DType, Schema, Selector, Table, Value};

/// Melts the matched columns into `(name, value)` pairs. Every unmatched
/// column becomes an id column and is repeated once per matched column.
/// The matched columns' types must widen to one common type.
pub fn pivot_longer(
    table: &Table,
    selectors: &[Selector],
    names_to: &str,
    values_to: &str,
) -> Result<Table> {
    let matched = Selector::resolve_many(selectors, table.schema())?;
    if matched.is_empty() {
        return Err(Error::schema_mismatch("pivot_longer matched no columns"));
    }
    let mut common: Option<DType> = None;
    for &idx in &matched {
        let dt = &table.schema().spec(idx).dtype;
        common = Some(match common {
            None => dt.clone(),
            Some(prev) => prev.widen(dt).ok_or_else(|| {
                Error::type_mismatch(prev.name(), dt.name())
            })?,
        });
    }
    let value_dtype = common.unwrap_or(DType::Str);

    let ids: Vec<usize> = (0..table.ncols()).filter(|i| !matched.contains(i)).collect();
    let mut specs: Vec<ColumnSpec> = ids.iter().map(|&i| table.schema().spec(i).clone()).collect();
    specs.push(ColumnSpec::non_nullable(names_to, DType::Str));
    specs.push(ColumnSpec::new(values_to, value_dtype));
    let schema = Schema::new(specs)?;

    let mut columns: Vec<Vec<Value>> = (0..schema.len())
        .map(|_| Vec::with_capacity(table.nrows() * matched.len()))
        .collect();
    for row in 0..table.nrows() {
        for &m in &matched {
            for (out, &id) in columns.iter_mut().zip(&ids) {
                out.push(table.value(row, id).clone());
            }
            let name_col = ids.len();
            columns[name_col].push(Value::Str(table.schema().spec(m).name.clone()));
            columns[name_col + 1].push(table.value(row, m).clone());
        }
    }
    debug!(
        "pivot_longer melted {} columns into {} rows",
        matched.len(),
        table.nrows() * matched.len()
    );
    Table::new(schema, columns)
}

/// Spreads `(names_from, values_from)` pairs into one column per distinct
/// name, in first-seen order. Name cells must be non-null and are rendered
/// to text to form the column names. The remaining columns form the row
/// key, also in first-seen order. A key/name pair occurring twice is an
/// error; a pair never observed leaves a `Null`.
pub fn pivot_wider(table: &Table, names_from: &str, values_from: &str) -> Result<Table> {
    let names_idx = table.schema().index_of(names_from)?;
    let values_idx = table.schema().index_of(values_from)?;
    if names_idx == values_idx {
        return Err(Error::schema_mismatch(
            "names_from and values_from must be different columns",
        ));
    }
    let value_dtype = table.schema().spec(values_idx).dtype.clone();
    let ids: Vec<usize> = (0..table.ncols())
        .filter(|&i| i != names_idx && i != values_idx)
        .collect();

    let mut names: IndexMap<String, usize> = IndexMap::new();
    let mut keys: IndexMap<Vec<Value>, usize> = IndexMap::new();
    let mut cells: FxHashMap<(usize, usize), Value> = FxHashMap::default();
    for row in 0..table.nrows() {
        let name_value = table.value(row, names_idx);
        if name_value.is_null() {
            return Err(Error::schema_mismatch(format!(
                "null in names column '{names_from}'"
            )));
        }
        let name = name_value.to_string();
        let next_name = names.len();
        let name_pos = *names.entry(name.clone()).or_insert(next_name);
        let key: Vec<Value> = ids.iter().map(|&c| table.value(row, c).clone()).collect();
        let next_key = keys.len();
        let key_pos = *keys.entry(key).or_insert(next_key);
        if cells
            .insert((key_pos, name_pos), table.value(row, values_idx).clone())
            .is_some()
        {
            return Err(Error::schema_mismatch(format!(
                "duplicate cell for name '{name}' within one row key"
            )));
        }
    }

    let mut specs: Vec<ColumnSpec> = ids.iter().map(|&i| table.schema().spec(i).clone()).collect();
    for name in names.keys() {
        specs.push(ColumnSpec::new(name.clone(), value_dtype.clone()));
    }
    let schema = Schema::new(specs)?;

    let mut columns: Vec<Vec<Value>> =
        (0..schema.len()).map(|_| vec![Value::Null; keys.len()]).collect();
    for (key, &key_pos) in &keys {
        for (c, value) in key.iter().enumerate() {
            columns[c][key_pos] = value.clone();
        }
    }
    for ((key_pos, name_pos), value) in cells {
        columns[ids.len() + name_pos][key_pos] = value;
    }
    debug!(
        "pivot_wider spread {} names over {} row keys",
        names.len(),
        keys.len()
    );
    Table::new(schema, columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wide() -> Table {
        Table::new(
            Schema::new(vec![
                ColumnSpec::new("id", DType::Int),
                ColumnSpec::new("jan", DType::Int),
                ColumnSpec::new("feb", DType::Float),
            ])
            .unwrap(),
            vec![
                vec![Value::Int(1), Value::Int(2)],
                vec![Value::Int(10), Value::Int(20)],
                vec![Value::Float(1.5), Value::Null],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_pivot_longer_melts_in_row_major_order() {
        let out = pivot_longer(
            &wide(),
            &[Selector::names(["jan", "feb"])],
            "month",
            "sales",
        )
        .unwrap();
        assert_eq!(
            out.schema().names().collect::<Vec<_>>(),
            vec!["id", "month", "sales"]
        );
        assert_eq!(out.nrows(), 4);
        assert_eq!(
            out.column("month").unwrap(),
            &[
                Value::from("jan"),
                Value::from("feb"),
                Value::from("jan"),
                Value::from("feb")
            ]
        );
        // int and float widened to float
        assert_eq!(out.schema().dtype_of("sales").unwrap(), &DType::Float);
        assert_eq!(
            out.column("sales").unwrap(),
            &[
                Value::Float(10.0),
                Value::Float(1.5),
                Value::Float(20.0),
                Value::Null
            ]
        );
    }

    #[test]
    fn test_pivot_longer_rejects_incompatible_value_types() {
        let t = Table::new(
            Schema::new(vec![
                ColumnSpec::new("a", DType::Int),
                ColumnSpec::new("b", DType::Str),
            ])
            .unwrap(),
            vec![vec![Value::Int(1)], vec![Value::from("x")]],
        )
        .unwrap();
        assert!(matches!(
            pivot_longer(&t, &[Selector::names(["a", "b"])], "k", "v"),
            Err(Error::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_pivot_longer_requires_a_match() {
        assert!(matches!(
            pivot_longer(&wide(), &[Selector::starts_with("zzz")], "k", "v"),
            Err(Error::SchemaMismatch { .. })
        ));
    }

    fn long() -> Table {
        Table::new(
            Schema::new(vec![
                ColumnSpec::new("id", DType::Int),
                ColumnSpec::new("month", DType::Str),
                ColumnSpec::new("sales", DType::Int),
            ])
            .unwrap(),
            vec![
                vec![Value::Int(1), Value::Int(1), Value::Int(2)],
                vec![Value::from("jan"), Value::from("feb"), Value::from("jan")],
                vec![Value::Int(10), Value::Int(11), Value::Int(20)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_pivot_wider_first_seen_orders() {
        let out = pivot_wider(&long(), "month", "sales").unwrap();
        assert_eq!(
            out.schema().names().collect::<Vec<_>>(),
            vec!["id", "jan", "feb"]
        );
        assert_eq!(out.column("id").unwrap(), &[Value::Int(1), Value::Int(2)]);
        assert_eq!(out.column("jan").unwrap(), &[Value::Int(10), Value::Int(20)]);
        // id 2 never reported feb
        assert_eq!(out.column("feb").unwrap(), &[Value::Int(11), Value::Null]);
    }

    #[test]
    fn test_pivot_wider_duplicate_cell_rejected() {
        let t = Table::new(
            Schema::new(vec![
                ColumnSpec::new("id", DType::Int),
                ColumnSpec::new("k", DType::Str),
                ColumnSpec::new("v", DType::Int),
            ])
            .unwrap(),
            vec![
                vec![Value::Int(1), Value::Int(1)],
                vec![Value::from("a"), Value::from("a")],
                vec![Value::Int(1), Value::Int(2)],
            ],
        )
        .unwrap();
        assert!(matches!(
            pivot_wider(&t, "k", "v"),
            Err(Error::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_pivot_wider_renders_non_string_names() {
        let t = Table::new(
            Schema::new(vec![
                ColumnSpec::new("id", DType::Int),
                ColumnSpec::new("day", DType::Int),
                ColumnSpec::new("v", DType::Int),
            ])
            .unwrap(),
            vec![
                vec![Value::Int(1), Value::Int(1)],
                vec![Value::Int(1), Value::Int(2)],
                vec![Value::Int(10), Value::Int(20)],
            ],
        )
        .unwrap();
        let out = pivot_wider(&t, "day", "v").unwrap();
        assert_eq!(
            out.schema().names().collect::<Vec<_>>(),
            vec!["id", "1", "2"]
        );
        assert_eq!(out.column("1").unwrap(), &[Value::Int(10)]);
    }

    #[test]
    fn test_pivot_wider_null_name_rejected() {
        let t = Table::new(
            Schema::new(vec![
                ColumnSpec::new("k", DType::Str),
                ColumnSpec::new("v", DType::Int),
            ])
            .unwrap(),
            vec![vec![Value::Null], vec![Value::Int(1)]],
        )
        .unwrap();
        assert!(matches!(
            pivot_wider(&t, "k", "v"),
            Err(Error::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_pivot_round_trip() {
        let out = pivot_wider(&long(), "month", "sales").unwrap();
        let back = pivot_longer(
            &out,
            &[Selector::names(["jan", "feb"])],
            "month",
            "sales",
        )
        .unwrap();
        assert_eq!(back.nrows(), 4);
        assert_eq!(
            back.schema().names().collect::<Vec<_>>(),
            vec!["id", "month", "sales"]
        );
    }
}
