//! Null propagation along row order

use crate::error::Result;
use crate::model::{Table, Value};

/// Which neighbor a null cell copies from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillDirection {
    /// Carry the last non-null value down.
    Forward,
    /// Carry the next non-null value up.
    Backward,
    /// Forward first, then backward over the remaining leading nulls.
    Both,
}

fn fill_forward(values: &mut [Value]) {
    let mut last: Option<Value> = None;
    for v in values.iter_mut() {
        if v.is_null() {
            if let Some(carry) = &last {
                *v = carry.clone();
            }
        } else {
            last = Some(v.clone());
        }
    }
}

fn fill_backward(values: &mut [Value]) {
    let mut next: Option<Value> = None;
    for v in values.iter_mut().rev() {
        if v.is_null() {
            if let Some(carry) = &next {
                *v = carry.clone();
            }
        } else {
            next = Some(v.clone());
        }
    }
}

/// Replaces nulls in the named columns with the nearest non-null value in
/// row order. A column with no non-null value at all is returned as-is.
/// Other columns and the row order are untouched.
pub fn fill(table: &Table, columns: &[&str], direction: FillDirection) -> Result<Table> {
    let targets: Vec<usize> = columns
        .iter()
        .map(|name| table.schema().index_of(name))
        .collect::<Result<_>>()?;
    let mut cols: Vec<Vec<Value>> = table.columns().iter().map(|c| c.as_ref().clone()).collect();
    for &idx in &targets {
        match direction {
            FillDirection::Forward => fill_forward(&mut cols[idx]),
            FillDirection::Backward => fill_backward(&mut cols[idx]),
            FillDirection::Both => {
                fill_forward(&mut cols[idx]);
                fill_backward(&mut cols[idx]);
            }
        }
    }
    Table::new(table.schema().clone(), cols)
}
