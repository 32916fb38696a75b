//! Data model: values, column types, schema, selectors, and the table

mod dtype;
mod schema;
mod selector;
mod table;
mod value;

pub use dtype::DType;
pub use schema::{ColumnSpec, Schema};
pub use selector::{Anchor, Selector, TypeSelector};
pub use table::{Record, RowView, Table};
pub use value::Value;

pub(crate) use table::infer_dtype;
