//! Display and export

use std::fmt;
use std::io;

use tabled::builder::Builder;
use tabled::settings::Style;

use crate::error::Result;
use crate::model::{Table, Value};

/// Rows shown by the `Display` impl before truncating.
const PREVIEW_ROWS: usize = 20;

/// Renders up to `limit` rows as a bordered text table.
pub fn to_display_string(table: &Table, limit: usize) -> String {
    let mut builder = Builder::default();
    builder.push_record(table.schema().names());
    let shown = table.nrows().min(limit);
    for row in 0..shown {
        builder.push_record(table.row_values(row).iter().map(Value::to_string));
    }
    let mut rendered = builder.build();
    rendered.with(Style::sharp());
    let mut text = rendered.to_string();
    if table.nrows() > shown {
        text.push_str(&format!("\n({} more rows)", table.nrows() - shown));
    }
    text
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", to_display_string(self, PREVIEW_ROWS))
    }
}

/// Serializes the table as a JSON array of objects, one per row, keys in
/// column order.
pub fn to_json(table: &Table) -> Result<String> {
    let mut records = Vec::with_capacity(table.nrows());
    for row in 0..table.nrows() {
        let mut object = serde_json::Map::new();
        for (col, name) in table.schema().names().enumerate() {
            object.insert(name.to_string(), serde_json::to_value(table.value(row, col))?);
        }
        records.push(serde_json::Value::Object(object));
    }
    Ok(serde_json::to_string(&serde_json::Value::Array(records))?)
}

/// Cell text that survives a round trip through the CSV reader: nulls
/// become empty cells and floats keep a decimal point.
fn csv_cell(value: &Value) -> String {
    match value {
        Value::Float(x) if x.is_finite() => format!("{x:?}"),
        other => other.to_string(),
    }
}

/// Writes the table as CSV with a header row.
pub fn write_csv<W: io::Write>(table: &Table, writer: W) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(table.schema().names())?;
    for row in 0..table.nrows() {
        out.write_record(table.row_values(row).iter().map(csv_cell))?;
    }
    out.flush()?;
    Ok(())
}
