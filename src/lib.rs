//! reframe - In-memory relational table engine
//!
//! A columnar [`Table`] with a small pipeline vocabulary: select / rename /
//! relocate, filter / mutate / transmute, group_by + summarise, and the
//! reshape family (expand / complete / fill / full_seq, pivots). Every
//! operation returns a new table and fails loudly with a typed [`Error`];
//! inputs are never mutated.

pub mod error;
pub mod group;
pub mod join;
pub mod model;
pub mod reader;
pub mod render;
pub mod reshape;
pub mod transform;

pub use error::{Error, Result};
pub use group::{Across, Agg, AggOp, GroupKey, GroupView, GroupedTable};
pub use join::left_join;
pub use model::{
    Anchor, ColumnSpec, DType, Record, RowView, Schema, Selector, Table, TypeSelector, Value,
};
pub use reshape::{
    complete, expand, fill, full_seq, pivot_longer, pivot_wider, ExpandSpec, FillDirection, Step,
};
pub use transform::{Expr, SortOrder};
