//! Columnar table storage

use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::model::dtype::DType;
use crate::model::schema::{ColumnSpec, Schema};
use crate::model::selector::{Anchor, Selector};
use crate::model::value::Value;

/// One named row, as produced by record-oriented ingestion. Key order is
/// preserved and becomes column order when the schema is inferred.
pub type Record = IndexMap<String, Value>;

/// An immutable table: a schema plus one value vector per column.
///
/// Columns are shared between tables via `Arc`, so column-level operations
/// (select, rename, relocate) copy pointers, not data. Row-level operations
/// materialize fresh columns. Every operation returns a new `Table` and
/// leaves its input untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    schema: Schema,
    columns: Vec<Arc<Vec<Value>>>,
    nrows: usize,
}

/// Infers the type of a freshly computed column by widening over its
/// non-null values. All-null columns default to string.
pub(crate) fn infer_dtype(name: &str, values: &[Value]) -> Result<DType> {
    let mut acc: Option<DType> = None;
    for v in values {
        let Some(dt) = v.dtype() else { continue };
        acc = Some(match acc {
            None => dt,
            Some(prev) => prev.widen(&dt).ok_or_else(|| {
                Error::schema_mismatch(format!(
                    "column '{name}' mixes {} and {}",
                    prev.name(),
                    dt.name()
                ))
            })?,
        });
    }
    Ok(acc.unwrap_or(DType::Str))
}

impl Table {
    /// Builds a table from columns. Values are fitted to the declared
    /// types (ints widen into float columns); anything else is rejected.
    pub fn new(schema: Schema, columns: Vec<Vec<Value>>) -> Result<Self> {
        if columns.len() != schema.len() {
            return Err(Error::schema_mismatch(format!(
                "schema has {} columns but {} were provided",
                schema.len(),
                columns.len()
            )));
        }
        let nrows = columns.first().map(Vec::len).unwrap_or(0);
        let mut fitted = Vec::with_capacity(columns.len());
        for (spec, column) in schema.specs().iter().zip(columns) {
            if column.len() != nrows {
                return Err(Error::Shape {
                    expected: nrows,
                    actual: column.len(),
                });
            }
            let mut out = Vec::with_capacity(column.len());
            for (ri, value) in column.into_iter().enumerate() {
                let shown = value.type_name();
                match spec.dtype.coerce(value) {
                    Some(Value::Null) if !spec.nullable => {
                        return Err(Error::schema_mismatch(format!(
                            "column '{}' is non-nullable but row {} is null",
                            spec.name, ri
                        )))
                    }
                    Some(v) => out.push(v),
                    None => {
                        return Err(Error::schema_mismatch(format!(
                            "column '{}' row {}: expected {}, got {}",
                            spec.name, ri, spec.dtype, shown
                        )))
                    }
                }
            }
            fitted.push(Arc::new(out));
        }
        Ok(Table {
            schema,
            columns: fitted,
            nrows,
        })
    }

    /// Builds a table from rows. Each row must match the schema width.
    pub fn from_rows(schema: Schema, rows: Vec<Vec<Value>>) -> Result<Self> {
        let width = schema.len();
        let mut columns: Vec<Vec<Value>> = (0..width).map(|_| Vec::with_capacity(rows.len())).collect();
        for row in rows {
            if row.len() != width {
                return Err(Error::Shape {
                    expected: width,
                    actual: row.len(),
                });
            }
            for (col, value) in columns.iter_mut().zip(row) {
                col.push(value);
            }
        }
        Table::new(schema, columns)
    }

    /// Columnar construction with inferred types.
    pub fn from_columns(named: Vec<(impl Into<String>, Vec<Value>)>) -> Result<Self> {
        let mut specs = Vec::with_capacity(named.len());
        let mut columns = Vec::with_capacity(named.len());
        for (name, values) in named {
            let name = name.into();
            let dtype = infer_dtype(&name, &values)?;
            specs.push(ColumnSpec::new(name, dtype));
            columns.push(values);
        }
        Table::new(Schema::new(specs)?, columns)
    }

    /// Builds a table from named records.
    ///
    /// Without a schema, the first record fixes the column set and order,
    /// every later record must carry exactly the same keys, and types are
    /// inferred. With a schema, missing keys become `Null` where the column
    /// is nullable and fail otherwise, and unknown keys fail.
    pub fn from_records(records: Vec<Record>, schema: Option<Schema>) -> Result<Self> {
        match schema {
            Some(schema) => {
                let mut rows = Vec::with_capacity(records.len());
                for (ri, mut record) in records.into_iter().enumerate() {
                    let mut row = Vec::with_capacity(schema.len());
                    for spec in schema.specs() {
                        match record.shift_remove(&spec.name) {
                            Some(v) => row.push(v),
                            None if spec.nullable => row.push(Value::Null),
                            None => {
                                return Err(Error::schema_mismatch(format!(
                                    "record {} is missing non-nullable key '{}'",
                                    ri, spec.name
                                )))
                            }
                        }
                    }
                    if let Some(extra) = record.keys().next() {
                        return Err(Error::schema_mismatch(format!(
                            "record {ri} has unknown key '{extra}'"
                        )));
                    }
                    rows.push(row);
                }
                Table::from_rows(schema, rows)
            }
            None => {
                let Some(first) = records.first() else {
                    return Ok(Table::empty(Schema::default()));
                };
                let names: Vec<String> = first.keys().cloned().collect();
                let mut rows = Vec::with_capacity(records.len());
                for (ri, mut record) in records.into_iter().enumerate() {
                    let mut row = Vec::with_capacity(names.len());
                    for name in &names {
                        match record.shift_remove(name) {
                            Some(v) => row.push(v),
                            None => {
                                return Err(Error::schema_mismatch(format!(
                                    "record {ri} is missing key '{name}'"
                                )))
                            }
                        }
                    }
                    if let Some(extra) = record.keys().next() {
                        return Err(Error::schema_mismatch(format!(
                            "record {ri} has unknown key '{extra}'"
                        )));
                    }
                    rows.push(row);
                }
                let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
                Table::infer_from_rows(&name_refs, rows)
            }
        }
    }

    /// Builds a table by inferring each column's type from its values.
    pub fn infer_from_rows(names: &[&str], rows: Vec<Vec<Value>>) -> Result<Self> {
        let width = names.len();
        let mut columns: Vec<Vec<Value>> = (0..width).map(|_| Vec::with_capacity(rows.len())).collect();
        for row in rows {
            if row.len() != width {
                return Err(Error::Shape {
                    expected: width,
                    actual: row.len(),
                });
            }
            for (col, value) in columns.iter_mut().zip(row) {
                col.push(value);
            }
        }
        let mut specs = Vec::with_capacity(width);
        for (name, col) in names.iter().zip(&columns) {
            specs.push(ColumnSpec::new(*name, infer_dtype(name, col)?));
        }
        Table::new(Schema::new(specs)?, columns)
    }

    /// A table with the given schema and no rows.
    pub fn empty(schema: Schema) -> Self {
        let columns = schema.specs().iter().map(|_| Arc::new(Vec::new())).collect();
        Table {
            schema,
            columns,
            nrows: 0,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.schema.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nrows == 0
    }

    /// Values of one column, in row order.
    pub fn column(&self, name: &str) -> Result<&[Value]> {
        let idx = self.schema.index_of(name)?;
        Ok(&self.columns[idx])
    }

    pub(crate) fn column_at(&self, idx: usize) -> &[Value] {
        &self.columns[idx]
    }

    pub(crate) fn columns(&self) -> &[Arc<Vec<Value>>] {
        &self.columns
    }

    pub fn value(&self, row: usize, col: usize) -> &Value {
        &self.columns[col][row]
    }

    pub fn row(&self, idx: usize) -> RowView<'_> {
        RowView { table: self, row: idx }
    }

    pub fn rows(&self) -> impl Iterator<Item = RowView<'_>> {
        (0..self.nrows).map(move |row| RowView { table: self, row })
    }

    pub fn row_values(&self, idx: usize) -> Vec<Value> {
        self.columns.iter().map(|c| c[idx].clone()).collect()
    }

    /// Keeps the named columns, in selector order. Duplicate matches keep
    /// their first position. Row count and row order never change.
    pub fn select(&self, selectors: &[Selector]) -> Result<Table> {
        let indices = Selector::resolve_many(selectors, &self.schema)?;
        let specs = indices
            .iter()
            .map(|&i| self.schema.spec(i).clone())
            .collect();
        Ok(Table {
            schema: Schema::new(specs)?,
            columns: indices.iter().map(|&i| Arc::clone(&self.columns[i])).collect(),
            nrows: self.nrows,
        })
    }

    /// Renames columns from `(old, new)` pairs. Positions, types, and data
    /// are untouched.
    pub fn rename(&self, pairs: &[(&str, &str)]) -> Result<Table> {
        let mut specs: Vec<ColumnSpec> = self.schema.specs().to_vec();
        for (old, new) in pairs {
            let idx = self.schema.index_of(old)?;
            specs[idx].name = (*new).to_string();
        }
        Ok(Table {
            schema: Schema::new(specs)?,
            columns: self.columns.clone(),
            nrows: self.nrows,
        })
    }

    /// Moves the matched columns (in selector order) to the anchor
    /// position; the rest keep their relative order.
    pub fn relocate(&self, selectors: &[Selector], anchor: Anchor) -> Result<Table> {
        let moved = Selector::resolve_many(selectors, &self.schema)?;
        let mut rest: Vec<usize> = (0..self.schema.len())
            .filter(|i| !moved.contains(i))
            .collect();
        let at = match &anchor {
            Anchor::First => 0,
            Anchor::Last => rest.len(),
            Anchor::Before(name) | Anchor::After(name) => {
                let target = self.schema.index_of(name)?;
                if moved.contains(&target) {
                    return Err(Error::schema_mismatch(format!(
                        "relocate anchor '{name}' is among the moved columns"
                    )));
                }
                let pos = rest
                    .iter()
                    .position(|&i| i == target)
                    .unwrap_or(rest.len());
                if matches!(anchor, Anchor::Before(_)) {
                    pos
                } else {
                    pos + 1
                }
            }
        };
        rest.splice(at..at, moved);
        let specs = rest.iter().map(|&i| self.schema.spec(i).clone()).collect();
        Ok(Table {
            schema: Schema::new(specs)?,
            columns: rest.iter().map(|&i| Arc::clone(&self.columns[i])).collect(),
            nrows: self.nrows,
        })
    }

    /// Adds or replaces whole columns. Replaced columns keep their
    /// position; new columns append in call order.
    pub fn with_columns(&self, pairs: Vec<(&str, Vec<Value>)>) -> Result<Table> {
        let mut out = self.clone();
        for (name, values) in pairs {
            out = out.with_column(name, values)?;
        }
        Ok(out)
    }

    /// Appends a computed column, or replaces it if the name exists.
    /// The replacement's type is re-inferred from its values.
    pub(crate) fn with_column(&self, name: &str, values: Vec<Value>) -> Result<Table> {
        if values.len() != self.nrows {
            return Err(Error::Shape {
                expected: self.nrows,
                actual: values.len(),
            });
        }
        let dtype = infer_dtype(name, &values)?;
        let mut specs: Vec<ColumnSpec> = self.schema.specs().to_vec();
        let mut columns = self.columns.clone();
        match self.schema.index_of(name) {
            Ok(idx) => {
                specs[idx] = ColumnSpec::new(name, dtype);
                columns[idx] = Arc::new(values);
            }
            Err(_) => {
                specs.push(ColumnSpec::new(name, dtype));
                columns.push(Arc::new(values));
            }
        }
        Ok(Table {
            schema: Schema::new(specs)?,
            columns,
            nrows: self.nrows,
        })
    }

    /// Gathers the given rows, in the given order, into a fresh table.
    pub(crate) fn take_rows(&self, indices: &[usize]) -> Table {
        let columns = self
            .columns
            .iter()
            .map(|col| Arc::new(indices.iter().map(|&i| col[i].clone()).collect()))
            .collect();
        Table {
            schema: self.schema.clone(),
            columns,
            nrows: indices.len(),
        }
    }
}

/// Borrowed view of one row, used by filter predicates and mutate
/// expressions.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    table: &'a Table,
    row: usize,
}

impl<'a> RowView<'a> {
    /// Value of the named column in this row.
    pub fn get(&self, name: &str) -> Result<&'a Value> {
        let idx = self.table.schema.index_of(name)?;
        Ok(&self.table.columns[idx][self.row])
    }

    pub fn get_at(&self, idx: usize) -> &'a Value {
        &self.table.columns[idx][self.row]
    }

    pub fn index(&self) -> usize {
        self.row
    }

    pub fn values(&self) -> impl Iterator<Item = &'a Value> + '_ {
        self.table.columns.iter().map(move |c| &c[self.row])
    }
}
