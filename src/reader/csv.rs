//! Delimited-text ingestion

use std::path::Path;

use log::debug;

use crate::error::Result;
use crate::model::{Schema, Table, Value};

/// Parsing knobs for CSV input.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    pub delimiter: u8,
    /// Tokens (compared case-insensitively, after trimming) read as null.
    pub null_tokens: Vec<String>,
    /// Declared schema; when absent, column types are inferred by
    /// widening and a column mixing incompatible types is an error.
    pub schema: Option<Schema>,
    /// Read every non-null cell as a string, skipping type detection.
    pub all_strings: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions {
            delimiter: b',',
            null_tokens: Value::DEFAULT_NULL_TOKENS
                .iter()
                .map(|t| t.to_string())
                .collect(),
            schema: None,
            all_strings: false,
        }
    }
}

fn parse_cell(raw: &str, options: &CsvOptions) -> Value {
    let trimmed = raw.trim();
    if options
        .null_tokens
        .iter()
        .any(|t| trimmed.eq_ignore_ascii_case(t))
    {
        return Value::Null;
    }
    if options.all_strings {
        return Value::Str(trimmed.to_string());
    }
    Value::parse_typed(trimmed)
}

fn read_from<R: std::io::Read>(reader: R, options: &CsvOptions) -> Result<Table> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .from_reader(reader);
    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        rows.push(record.iter().map(|cell| parse_cell(cell, options)).collect());
    }
    debug!("read {} csv rows with {} columns", rows.len(), headers.len());
    match &options.schema {
        Some(schema) => Table::from_rows(schema.clone(), rows),
        None => {
            let names: Vec<&str> = headers.iter().map(String::as_str).collect();
            Table::infer_from_rows(&names, rows)
        }
    }
}

/// Reads a table from CSV text. The first row is the header.
pub fn read_csv_str(data: &str, options: &CsvOptions) -> Result<Table> {
    read_from(data.as_bytes(), options)
}

/// Reads a table from a CSV file.
pub fn read_csv_path(path: impl AsRef<Path>, options: &CsvOptions) -> Result<Table> {
    let file = std::fs::File::open(path)?;
    read_from(file, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::model::{ColumnSpec, DType};
    use std::io::Write;

    #[test]
    fn test_types_inferred_per_column() {
        let data = "id,score,label,when\n1,0.5,a,2024-01-01\n2,,b,2024-01-02\n";
        let t = read_csv_str(data, &CsvOptions::default()).unwrap();
        assert_eq!(t.schema().dtype_of("id").unwrap(), &DType::Int);
        assert_eq!(t.schema().dtype_of("score").unwrap(), &DType::Float);
        assert_eq!(t.schema().dtype_of("label").unwrap(), &DType::Str);
        assert_eq!(t.schema().dtype_of("when").unwrap(), &DType::Timestamp);
        assert_eq!(t.column("score").unwrap()[1], Value::Null);
    }

    #[test]
    fn test_int_column_widens_to_float() {
        let data = "x\n1\n2.5\n";
        let t = read_csv_str(data, &CsvOptions::default()).unwrap();
        assert_eq!(t.schema().dtype_of("x").unwrap(), &DType::Float);
        assert_eq!(
            t.column("x").unwrap(),
            &[Value::Float(1.0), Value::Float(2.5)]
        );
    }

    #[test]
    fn test_mixed_column_fails_loudly() {
        let data = "x\n1\nbanana\n";
        assert!(matches!(
            read_csv_str(data, &CsvOptions::default()),
            Err(Error::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_all_strings_escape_hatch() {
        let data = "x\n1\nbanana\n";
        let options = CsvOptions {
            all_strings: true,
            ..CsvOptions::default()
        };
        let t = read_csv_str(data, &options).unwrap();
        assert_eq!(t.schema().dtype_of("x").unwrap(), &DType::Str);
        assert_eq!(t.column("x").unwrap()[0], Value::from("1"));
    }

    #[test]
    fn test_custom_delimiter_and_null_tokens() {
        let data = "a;b\n-;2\n1;-\n";
        let options = CsvOptions {
            delimiter: b';',
            null_tokens: vec!["-".to_string()],
            ..CsvOptions::default()
        };
        let t = read_csv_str(data, &options).unwrap();
        assert_eq!(t.column("a").unwrap(), &[Value::Null, Value::Int(1)]);
        assert_eq!(t.column("b").unwrap(), &[Value::Int(2), Value::Null]);
    }

    #[test]
    fn test_explicit_schema_overrides_inference() {
        let schema = Schema::new(vec![
            ColumnSpec::new("id", DType::Float),
            ColumnSpec::new("label", DType::Str),
        ])
        .unwrap();
        let data = "id,label\n1,a\n2,b\n";
        let options = CsvOptions {
            schema: Some(schema),
            ..CsvOptions::default()
        };
        let t = read_csv_str(data, &options).unwrap();
        assert_eq!(
            t.column("id").unwrap(),
            &[Value::Float(1.0), Value::Float(2.0)]
        );
    }

    #[test]
    fn test_read_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "x,y").unwrap();
        writeln!(file, "1,true").unwrap();
        writeln!(file, "2,false").unwrap();
        let t = read_csv_path(file.path(), &CsvOptions::default()).unwrap();
        assert_eq!(t.nrows(), 2);
        assert_eq!(t.schema().dtype_of("y").unwrap(), &DType::Bool);
    }

    #[test]
    fn test_ragged_record_is_a_csv_error() {
        let data = "a,b\n1,2\n3\n";
        assert!(matches!(
            read_csv_str(data, &CsvOptions::default()),
            Err(Error::Csv(_))
        ));
    }
}
