//! Row-level transformations: filter, mutate, transmute, arrange, distinct

use std::cmp::Ordering;

use log::debug;
use rayon::prelude::*;
use rustc_hash::FxHashSet;

use crate::error::{Error, Result};
use crate::model::{RowView, Selector, Table, Value};

/// A computed per-row expression, as passed to `mutate` and `transmute`.
pub type Expr = Box<dyn Fn(&RowView<'_>) -> Result<Value> + Sync>;

/// Sort direction for [`Table::arrange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

fn keep_row(value: Value) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(b),
        Value::Null => Ok(false),
        other => Err(Error::type_mismatch("bool", other.type_name())),
    }
}

impl Table {
    /// Keeps rows whose predicate yields `Bool(true)`, in order. A `Null`
    /// result drops the row; any other non-boolean result is an error.
    ///
    /// The mask is evaluated in parallel; the outcome is identical to a
    /// sequential scan.
    pub fn filter<P>(&self, pred: P) -> Result<Table>
    where
        P: Fn(&RowView<'_>) -> Result<Value> + Sync,
    {
        let mask: Vec<bool> = (0..self.nrows())
            .into_par_iter()
            .map(|i| pred(&self.row(i)).and_then(keep_row))
            .collect::<Result<_>>()?;
        let kept: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter(|(_, keep)| **keep)
            .map(|(i, _)| i)
            .collect();
        debug!("filter kept {}/{} rows", kept.len(), self.nrows());
        Ok(self.take_rows(&kept))
    }

    /// Computes columns left to right; each expression sees the columns
    /// introduced before it in the same call. Existing names are replaced
    /// in place, new names append.
    pub fn mutate(&self, exprs: Vec<(&str, Expr)>) -> Result<Table> {
        let mut out = self.clone();
        for (name, expr) in exprs {
            let values: Vec<Value> = (0..out.nrows())
                .into_par_iter()
                .map(|i| expr(&out.row(i)))
                .collect::<Result<_>>()?;
            out = out.with_column(name, values)?;
        }
        Ok(out)
    }

    /// `mutate` keeping only the computed columns, in call order.
    pub fn transmute(&self, exprs: Vec<(&str, Expr)>) -> Result<Table> {
        let names: Vec<Selector> = exprs
            .iter()
            .map(|(name, _)| Selector::name(*name))
            .collect();
        self.mutate(exprs)?.select(&names)
    }

    /// Stable multi-key sort. Nulls sort last under both directions.
    pub fn arrange(&self, keys: &[(&str, SortOrder)]) -> Result<Table> {
        let resolved: Vec<(usize, SortOrder)> = keys
            .iter()
            .map(|(name, order)| Ok((self.schema().index_of(name)?, *order)))
            .collect::<Result<_>>()?;
        let mut indices: Vec<usize> = (0..self.nrows()).collect();
        indices.sort_by(|&a, &b| {
            for &(col, order) in &resolved {
                let va = self.value(a, col);
                let vb = self.value(b, col);
                let ord = match (va.is_null(), vb.is_null()) {
                    (true, true) => Ordering::Equal,
                    (true, false) => Ordering::Greater,
                    (false, true) => Ordering::Less,
                    (false, false) => {
                        let ord = va.cmp(vb);
                        match order {
                            SortOrder::Asc => ord,
                            SortOrder::Desc => ord.reverse(),
                        }
                    }
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });
        Ok(self.take_rows(&indices))
    }

    /// First occurrence of each distinct key tuple, in first-seen order.
    /// An empty column list means all columns.
    pub fn distinct(&self, columns: &[&str]) -> Result<Table> {
        let indices: Vec<usize> = if columns.is_empty() {
            (0..self.ncols()).collect()
        } else {
            columns
                .iter()
                .map(|name| self.schema().index_of(name))
                .collect::<Result<_>>()?
        };
        let mut seen: FxHashSet<Vec<Value>> = FxHashSet::default();
        let mut kept = Vec::new();
        for row in 0..self.nrows() {
            let key: Vec<Value> = indices.iter().map(|&c| self.value(row, c).clone()).collect();
            if seen.insert(key) {
                kept.push(row);
            }
        }
        Ok(self.take_rows(&kept))
    }
}
