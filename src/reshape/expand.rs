//! Cartesian grids over column domains

use log::debug;
use rustc_hash::FxHashSet;

use crate::error::{Error, Result};
use crate::model::infer_dtype;
use crate::model::{ColumnSpec, DType, Schema, Table, Value};

/// One axis of an expansion grid.
///
/// The domain a spec contributes is the core contract:
///
/// * `Column` on a categorical column uses **all declared levels** in
///   declared order, observed or not. On any other column it uses the
///   distinct observed values in ascending order, nulls last.
/// * `With` supplies an explicit domain, used exactly as given (typically
///   built with [`full_seq`](crate::reshape::full_seq)).
/// * `Nesting` contributes only the observed co-occurring combinations of
///   its columns, sorted.
#[derive(Debug, Clone)]
pub enum ExpandSpec {
    Column(String),
    With { column: String, values: Vec<Value> },
    Nesting(Vec<String>),
}

impl ExpandSpec {
    pub fn column(name: impl Into<String>) -> Self {
        ExpandSpec::Column(name.into())
    }

    pub fn with(column: impl Into<String>, values: Vec<Value>) -> Self {
        ExpandSpec::With {
            column: column.into(),
            values,
        }
    }

    pub fn nesting<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ExpandSpec::Nesting(names.into_iter().map(Into::into).collect())
    }
}

/// Distinct observed values of one column, ascending, nulls last.
fn observed_domain(table: &Table, idx: usize) -> Vec<Value> {
    let mut seen = FxHashSet::default();
    let mut domain: Vec<Value> = table
        .column_at(idx)
        .iter()
        .filter(|v| seen.insert((*v).clone()))
        .cloned()
        .collect();
    domain.sort();
    domain
}

/// Specs and value tuples contributed by one `ExpandSpec`.
fn axis(table: &Table, spec: &ExpandSpec) -> Result<(Vec<ColumnSpec>, Vec<Vec<Value>>)> {
    match spec {
        ExpandSpec::Column(name) => {
            let idx = table.schema().index_of(name)?;
            let col_spec = table.schema().spec(idx).clone();
            let domain = match &col_spec.dtype {
                DType::Categorical { levels } => {
                    levels.iter().map(|l| Value::Str(l.clone())).collect()
                }
                _ => observed_domain(table, idx),
            };
            Ok((vec![col_spec], domain.into_iter().map(|v| vec![v]).collect()))
        }
        ExpandSpec::With { column, values } => {
            let col_spec = match table.schema().index_of(column) {
                Ok(idx) => {
                    let spec = table.schema().spec(idx).clone();
                    for v in values {
                        if spec.dtype.coerce(v.clone()).is_none() {
                            return Err(Error::schema_mismatch(format!(
                                "expand domain for '{}': expected {}, got {}",
                                column,
                                spec.dtype,
                                v.type_name()
                            )));
                        }
                    }
                    spec
                }
                Err(_) => ColumnSpec::new(column, infer_dtype(column, values)?),
            };
            Ok((
                vec![col_spec],
                values.iter().map(|v| vec![v.clone()]).collect(),
            ))
        }
        ExpandSpec::Nesting(names) => {
            let indices: Vec<usize> = names
                .iter()
                .map(|n| table.schema().index_of(n))
                .collect::<Result<_>>()?;
            let specs = indices
                .iter()
                .map(|&i| table.schema().spec(i).clone())
                .collect();
            let mut seen = FxHashSet::default();
            let mut combos: Vec<Vec<Value>> = Vec::new();
            for row in 0..table.nrows() {
                let combo: Vec<Value> =
                    indices.iter().map(|&c| table.value(row, c).clone()).collect();
                if seen.insert(combo.clone()) {
                    combos.push(combo);
                }
            }
            combos.sort();
            Ok((specs, combos))
        }
    }
}

/// Cartesian product of the axis domains, leftmost axis varying slowest.
/// Output cardinality is the product of the domain sizes and does not
/// depend on the input row count.
pub fn expand(table: &Table, specs: &[ExpandSpec]) -> Result<Table> {
    let mut axes = Vec::with_capacity(specs.len());
    for spec in specs {
        axes.push(axis(table, spec)?);
    }
    let mut all_specs = Vec::new();
    for (specs, _) in &axes {
        all_specs.extend(specs.iter().cloned());
    }
    let schema = Schema::new(all_specs)?;

    let mut total: usize = 1;
    for (_, tuples) in &axes {
        total = total.checked_mul(tuples.len()).ok_or_else(|| {
            Error::schema_mismatch("expand cardinality overflows".to_string())
        })?;
    }
    if axes.is_empty() {
        return Ok(Table::empty(schema));
    }

    let mut columns: Vec<Vec<Value>> = (0..schema.len()).map(|_| Vec::with_capacity(total)).collect();
    // stride of each axis: product of domain sizes to its right
    let mut strides = vec![1usize; axes.len()];
    for i in (0..axes.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * axes[i + 1].1.len();
    }
    for row in 0..total {
        let mut col = 0;
        for ((_, tuples), stride) in axes.iter().zip(&strides) {
            let tuple = &tuples[(row / stride) % tuples.len()];
            for value in tuple {
                columns[col].push(value.clone());
                col += 1;
            }
        }
    }
    debug!("expand over {} axes produced {} rows", axes.len(), total);
    Table::new(schema, columns)
}
