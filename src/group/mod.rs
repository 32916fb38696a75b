//! Grouping: partitioning a table by key columns
//!
//! `Table -> group_by -> GroupedTable -> (summarise | filter) -> Table`.
//! A `GroupedTable` is a transient annotation: it borrows nothing, owns a
//! cheap handle to the source, and is consumed by the next aggregation or
//! group-filter call.

mod aggregate;

pub use aggregate::{Across, Agg, AggOp};

use std::hash::BuildHasherDefault;

use indexmap::IndexMap;
use log::debug;
use rayon::prelude::*;
use rustc_hash::FxHasher;

use crate::error::{Error, Result};
use crate::model::{Table, Value};

/// Key-column values identifying one partition.
pub type GroupKey = Vec<Value>;

type Partitions = IndexMap<GroupKey, Vec<usize>, BuildHasherDefault<FxHasher>>;

/// A table partitioned by key columns. Partition order is the first
/// occurrence of each key tuple in the source, never sorted.
#[derive(Debug, Clone)]
pub struct GroupedTable {
    source: Table,
    key_indices: Vec<usize>,
    groups: Partitions,
}

impl Table {
    /// Partitions rows by distinct key tuples. Null keys group together
    /// like any other value.
    pub fn group_by(&self, keys: &[&str]) -> Result<GroupedTable> {
        if keys.is_empty() {
            return Err(Error::schema_mismatch(
                "group_by requires at least one key column",
            ));
        }
        let key_indices: Vec<usize> = keys
            .iter()
            .map(|name| self.schema().index_of(name))
            .collect::<Result<_>>()?;
        let mut groups = Partitions::default();
        for row in 0..self.nrows() {
            let key: GroupKey = key_indices
                .iter()
                .map(|&c| self.value(row, c).clone())
                .collect();
            groups.entry(key).or_default().push(row);
        }
        debug!(
            "group_by [{}] produced {} groups over {} rows",
            keys.join(", "),
            groups.len(),
            self.nrows()
        );
        Ok(GroupedTable {
            source: self.clone(),
            key_indices,
            groups,
        })
    }

    /// Rows per distinct key tuple, as a column named `n`.
    pub fn count(&self, columns: &[&str]) -> Result<Table> {
        self.group_by(columns)?.summarise(vec![Agg::count("n")])
    }
}

impl GroupedTable {
    /// Number of partitions.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn source(&self) -> &Table {
        &self.source
    }

    pub fn key_names(&self) -> Vec<&str> {
        self.key_indices
            .iter()
            .map(|&i| self.source.schema().spec(i).name.as_str())
            .collect()
    }

    pub(crate) fn key_indices(&self) -> &[usize] {
        &self.key_indices
    }

    pub(crate) fn partitions(&self) -> impl Iterator<Item = (&GroupKey, &[usize])> {
        self.groups.iter().map(|(k, rows)| (k, rows.as_slice()))
    }

    pub fn views(&self) -> impl Iterator<Item = GroupView<'_>> {
        self.groups.iter().map(move |(key, rows)| GroupView {
            grouped: self,
            key,
            rows,
        })
    }

    /// Keeps or drops whole groups. The predicate runs once per group and
    /// its boolean result is broadcast to every row of that group; `Null`
    /// drops the group, non-boolean results are an error. Surviving rows
    /// keep their original relative order and the result is an ungrouped
    /// table.
    pub fn filter<P>(&self, pred: P) -> Result<Table>
    where
        P: Fn(&GroupView<'_>) -> Result<Value> + Sync,
    {
        let views: Vec<GroupView<'_>> = self.views().collect();
        let verdicts: Vec<bool> = views
            .par_iter()
            .map(|view| match pred(view)? {
                Value::Bool(b) => Ok(b),
                Value::Null => Ok(false),
                other => Err(Error::type_mismatch("bool", other.type_name())),
            })
            .collect::<Result<_>>()?;
        let mut kept: Vec<usize> = views
            .iter()
            .zip(&verdicts)
            .filter(|(_, keep)| **keep)
            .flat_map(|(view, _)| view.rows.iter().copied())
            .collect();
        kept.sort_unstable();
        debug!(
            "group filter kept {}/{} groups ({} rows)",
            verdicts.iter().filter(|k| **k).count(),
            views.len(),
            kept.len()
        );
        Ok(self.source.take_rows(&kept))
    }
}

/// One partition, as seen by a group-filter predicate: its key, its rows,
/// and on-demand aggregates.
#[derive(Debug, Clone, Copy)]
pub struct GroupView<'a> {
    grouped: &'a GroupedTable,
    key: &'a GroupKey,
    rows: &'a [usize],
}

impl<'a> GroupView<'a> {
    /// Rows in this group. Never zero: partitions are built from rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn key(&self) -> &[Value] {
        self.key
    }

    /// Key value for one of the grouping columns.
    pub fn key_value(&self, name: &str) -> Result<&Value> {
        let pos = self
            .grouped
            .key_names()
            .iter()
            .position(|n| *n == name)
            .ok_or_else(|| Error::unknown_column(name))?;
        Ok(&self.key[pos])
    }

    /// This group's slice of one column, in source row order.
    pub fn values(&self, column: &str) -> Result<Vec<&'a Value>> {
        let idx = self.grouped.source.schema().index_of(column)?;
        let col = self.grouped.source.column_at(idx);
        Ok(self.rows.iter().map(|&r| &col[r]).collect())
    }

    /// Applies an aggregator to this group, with the same semantics as
    /// `summarise`.
    pub fn aggregate(&self, column: Option<&str>, op: &AggOp) -> Result<Value> {
        aggregate::apply_to_group(&self.grouped.source, self.rows, column, op, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ColumnSpec, DType, Schema};

    fn sample() -> Table {
        Table::new(
            Schema::new(vec![
                ColumnSpec::new("g", DType::Str),
                ColumnSpec::new("x", DType::Int),
            ])
            .unwrap(),
            vec![
                vec![
                    Value::from("b"),
                    Value::from("a"),
                    Value::from("b"),
                    Value::Null,
                    Value::from("a"),
                ],
                vec![
                    Value::Int(1),
                    Value::Int(2),
                    Value::Int(3),
                    Value::Int(4),
                    Value::Int(5),
                ],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_partition_order_is_first_seen() {
        let grouped = sample().group_by(&["g"]).unwrap();
        let keys: Vec<GroupKey> = grouped.views().map(|v| v.key().to_vec()).collect();
        assert_eq!(
            keys,
            vec![
                vec![Value::from("b")],
                vec![Value::from("a")],
                vec![Value::Null],
            ]
        );
    }

    #[test]
    fn test_null_keys_group_together() {
        let grouped = sample().group_by(&["g"]).unwrap();
        let null_group = grouped
            .views()
            .find(|v| v.key()[0].is_null())
            .expect("null group");
        assert_eq!(null_group.len(), 1);
    }

    #[test]
    fn test_group_by_unknown_key() {
        assert!(matches!(
            sample().group_by(&["nope"]),
            Err(Error::UnknownColumn { .. })
        ));
        assert!(sample().group_by(&[]).is_err());
    }

    #[test]
    fn test_group_filter_keeps_whole_groups_in_row_order() {
        let t = sample();
        let out = t
            .group_by(&["g"])
            .unwrap()
            .filter(|g| Ok(Value::Bool(g.len() >= 2)))
            .unwrap();
        assert_eq!(
            out.column("x").unwrap(),
            &[Value::Int(1), Value::Int(2), Value::Int(3), Value::Int(5)]
        );
    }

    #[test]
    fn test_group_filter_sees_aggregates() {
        let t = sample();
        let out = t
            .group_by(&["g"])
            .unwrap()
            .filter(|g| {
                g.aggregate(Some("x"), &AggOp::Sum { skip_nulls: true })?
                    .gt(&Value::Int(4))
            })
            .unwrap();
        // group "a" sums to 7, "b" to 4, null group to 4
        assert_eq!(out.column("x").unwrap(), &[Value::Int(2), Value::Int(5)]);
    }

    #[test]
    fn test_group_filter_rejects_non_boolean() {
        let t = sample();
        let result = t
            .group_by(&["g"])
            .unwrap()
            .filter(|g| Ok(Value::Int(g.len() as i64)));
        assert!(matches!(result, Err(Error::TypeMismatch { .. })));
    }

    #[test]
    fn test_count_shorthand() {
        let out = sample().count(&["g"]).unwrap();
        assert_eq!(out.schema().names().collect::<Vec<_>>(), vec!["g", "n"]);
        assert_eq!(
            out.column("n").unwrap(),
            &[Value::Int(2), Value::Int(2), Value::Int(1)]
        );
    }
}
