//! Ingestion from external formats

mod csv;
mod json;

pub use csv::{read_csv_path, read_csv_str, CsvOptions};
pub use json::read_json_records;
