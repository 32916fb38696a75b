//! Reshaping: expand, complete, fill, full_seq, and pivots

mod complete;
mod expand;
mod fill;
mod pivot;
mod seq;

pub use complete::complete;
pub use expand::{expand, ExpandSpec};
pub use fill::{fill, FillDirection};
pub use pivot::{pivot_longer, pivot_wider};
pub use seq::{full_seq, Step};
