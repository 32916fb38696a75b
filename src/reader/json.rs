//! JSON record ingestion

use log::debug;

use crate::error::{Error, Result};
use crate::model::{Record, Schema, Table, Value};

fn convert(value: serde_json::Value) -> Result<Value> {
    match value {
        serde_json::Value::Null => Ok(Value::Null),
        serde_json::Value::Bool(b) => Ok(Value::Bool(b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Int(i))
            } else if let Some(f) = n.as_f64() {
                Ok(Value::Float(f))
            } else {
                Err(Error::type_mismatch("representable number", n.to_string()))
            }
        }
        serde_json::Value::String(s) => Ok(Value::Str(s)),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => Err(
            Error::schema_mismatch("nested json values are not supported"),
        ),
    }
}

/// Reads a table from a JSON array of flat objects. Key order of the
/// first object fixes column order when no schema is given; JSON strings
/// stay strings (no timestamp sniffing).
pub fn read_json_records(data: &str, schema: Option<Schema>) -> Result<Table> {
    let parsed: serde_json::Value = serde_json::from_str(data)?;
    let serde_json::Value::Array(items) = parsed else {
        return Err(Error::schema_mismatch(
            "expected a json array of objects",
        ));
    };
    let mut records: Vec<Record> = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        let serde_json::Value::Object(map) = item else {
            return Err(Error::schema_mismatch(format!(
                "json element {i} is not an object"
            )));
        };
        let mut record = Record::new();
        for (key, value) in map {
            record.insert(key, convert(value)?);
        }
        records.push(record);
    }
    debug!("read {} json records", records.len());
    Table::from_records(records, schema)
}
