//! Aggregation: summarise and across

use log::debug;
use rayon::prelude::*;
use rustc_hash::FxHashSet;

use crate::error::{Error, Result};
use crate::group::GroupedTable;
use crate::model::{ColumnSpec, DType, Schema, Selector, Table, Value};

/// Reduction over one group's values.
///
/// `skip_nulls: true` ignores nulls; `false` propagates them (any null in
/// the group makes the result `Null`). Sums of nothing are the zero of the
/// column type; `Mean`, `Min`, and `Max` have no identity and yield `Null`
/// over an empty or all-null group unless the [`Agg`] is strict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggOp {
    Count,
    Sum { skip_nulls: bool },
    Mean { skip_nulls: bool },
    Min { skip_nulls: bool },
    Max { skip_nulls: bool },
    First,
    Last,
    NUnique,
}

impl AggOp {
    pub fn fn_name(&self) -> &'static str {
        match self {
            AggOp::Count => "count",
            AggOp::Sum { .. } => "sum",
            AggOp::Mean { .. } => "mean",
            AggOp::Min { .. } => "min",
            AggOp::Max { .. } => "max",
            AggOp::First => "first",
            AggOp::Last => "last",
            AggOp::NUnique => "n_unique",
        }
    }

    /// Output column type given the input column type.
    fn result_dtype(&self, input: Option<&DType>) -> DType {
        match self {
            AggOp::Count | AggOp::NUnique => DType::Int,
            AggOp::Mean { .. } => DType::Float,
            AggOp::Sum { .. }
            | AggOp::Min { .. }
            | AggOp::Max { .. }
            | AggOp::First
            | AggOp::Last => input.cloned().unwrap_or(DType::Int),
        }
    }
}

/// One named aggregate in a `summarise` call.
#[derive(Debug, Clone)]
pub struct Agg {
    pub name: String,
    pub column: Option<String>,
    pub op: AggOp,
    pub strict: bool,
}

impl Agg {
    pub fn new(name: impl Into<String>, column: impl Into<String>, op: AggOp) -> Self {
        Agg {
            name: name.into(),
            column: Some(column.into()),
            op,
            strict: false,
        }
    }

    /// Group size; needs no input column.
    pub fn count(name: impl Into<String>) -> Self {
        Agg {
            name: name.into(),
            column: None,
            op: AggOp::Count,
            strict: false,
        }
    }

    /// Makes an empty or all-null group an `EmptyAggregation` error
    /// instead of `Null`.
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }
}

/// Applies one op to the given group rows.
pub(crate) fn apply_to_group(
    source: &Table,
    rows: &[usize],
    column: Option<&str>,
    op: &AggOp,
    strict: bool,
) -> Result<Value> {
    if matches!(op, AggOp::Count) {
        return Ok(Value::Int(rows.len() as i64));
    }
    let name = column.ok_or_else(|| {
        Error::schema_mismatch(format!(
            "aggregate '{}' requires an input column",
            op.fn_name()
        ))
    })?;
    let idx = source.schema().index_of(name)?;
    let dtype = source.schema().spec(idx).dtype.clone();
    let col = source.column_at(idx);
    let values: Vec<&Value> = rows.iter().map(|&r| &col[r]).collect();

    let require_numeric = || -> Result<()> {
        if dtype.is_numeric() {
            Ok(())
        } else {
            Err(Error::type_mismatch("numeric column", dtype.name()))
        }
    };
    let empty = || -> Result<Value> {
        if strict {
            Err(Error::EmptyAggregation {
                column: name.to_string(),
                op: op.fn_name().to_string(),
            })
        } else {
            Ok(Value::Null)
        }
    };

    match op {
        AggOp::Count => unreachable!("handled above"),
        AggOp::Sum { skip_nulls } => {
            require_numeric()?;
            if !skip_nulls && values.iter().any(|v| v.is_null()) {
                return Ok(Value::Null);
            }
            match dtype {
                DType::Int => {
                    let mut acc = 0i64;
                    for v in &values {
                        if let Value::Int(i) = v {
                            acc += i;
                        }
                    }
                    Ok(Value::Int(acc))
                }
                _ => {
                    let mut acc = 0f64;
                    for v in &values {
                        if let Some(x) = v.as_f64() {
                            acc += x;
                        }
                    }
                    Ok(Value::Float(acc))
                }
            }
        }
        AggOp::Mean { skip_nulls } => {
            require_numeric()?;
            if !skip_nulls && values.iter().any(|v| v.is_null()) {
                return Ok(Value::Null);
            }
            let usable: Vec<f64> = values.iter().filter_map(|v| v.as_f64()).collect();
            if usable.is_empty() {
                return empty();
            }
            Ok(Value::Float(usable.iter().sum::<f64>() / usable.len() as f64))
        }
        AggOp::Min { skip_nulls } | AggOp::Max { skip_nulls } => {
            if !skip_nulls && values.iter().any(|v| v.is_null()) {
                return Ok(Value::Null);
            }
            let usable = values.iter().filter(|v| !v.is_null());
            let found = if matches!(op, AggOp::Min { .. }) {
                usable.min_by(|a, b| a.cmp(b))
            } else {
                usable.max_by(|a, b| a.cmp(b))
            };
            match found {
                Some(v) => Ok((*v).clone()),
                None => empty(),
            }
        }
        AggOp::First => Ok(values.first().map(|v| (*v).clone()).unwrap_or(Value::Null)),
        AggOp::Last => Ok(values.last().map(|v| (*v).clone()).unwrap_or(Value::Null)),
        AggOp::NUnique => {
            let distinct: FxHashSet<&Value> =
                values.iter().filter(|v| !v.is_null()).copied().collect();
            Ok(Value::Int(distinct.len() as i64))
        }
    }
}

impl GroupedTable {
    /// One output row per group, in partition order: the key columns
    /// first (group_by order), then one column per aggregate (call order).
    pub fn summarise(&self, aggs: Vec<Agg>) -> Result<Table> {
        let source = self.source();
        let mut specs: Vec<ColumnSpec> = self
            .key_indices()
            .iter()
            .map(|&i| source.schema().spec(i).clone())
            .collect();
        for agg in &aggs {
            let input = match &agg.column {
                Some(name) => Some(source.schema().dtype_of(name)?),
                None => None,
            };
            specs.push(ColumnSpec::new(&agg.name, agg.op.result_dtype(input)));
        }
        let schema = Schema::new(specs)?;

        let partitions: Vec<(&super::GroupKey, &[usize])> = self.partitions().collect();
        let agg_rows: Vec<Vec<Value>> = partitions
            .par_iter()
            .map(|(_, rows)| {
                aggs.iter()
                    .map(|agg| {
                        apply_to_group(source, rows, agg.column.as_deref(), &agg.op, agg.strict)
                    })
                    .collect::<Result<Vec<Value>>>()
            })
            .collect::<Result<_>>()?;

        let nkeys = self.key_indices().len();
        let mut columns: Vec<Vec<Value>> =
            (0..schema.len()).map(|_| Vec::with_capacity(partitions.len())).collect();
        for ((key, _), agg_row) in partitions.iter().zip(agg_rows) {
            for (k, value) in key.iter().enumerate() {
                columns[k].push(value.clone());
            }
            for (a, value) in agg_row.into_iter().enumerate() {
                columns[nkeys + a].push(value);
            }
        }
        debug!(
            "summarise: {} groups, {} aggregates",
            partitions.len(),
            schema.len() - nkeys
        );
        Table::new(schema, columns)
    }

    /// Applies every op to every matched column; key columns are never
    /// aggregated even when a selector matches them.
    pub fn summarise_across(&self, across: &Across) -> Result<Table> {
        let schema = self.source().schema();
        let matched = Selector::resolve_many(&across.selectors, schema)?;
        let mut aggs = Vec::new();
        for idx in matched {
            if self.key_indices().contains(&idx) {
                continue;
            }
            let column = &schema.spec(idx).name;
            for op in &across.ops {
                let name = across
                    .template
                    .replace("{column}", column)
                    .replace("{function}", op.fn_name());
                aggs.push(Agg::new(name, column, op.clone()));
            }
        }
        self.summarise(aggs)
    }
}

/// Applies a set of ops across every column matched by the selectors.
/// Result columns are named by a template over `{column}` and
/// `{function}`.
#[derive(Debug, Clone)]
pub struct Across {
    selectors: Vec<Selector>,
    ops: Vec<AggOp>,
    template: String,
}

impl Across {
    pub fn new(selectors: Vec<Selector>, ops: Vec<AggOp>) -> Self {
        Across {
            selectors,
            ops,
            template: "{column}_{function}".to_string(),
        }
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }
}
