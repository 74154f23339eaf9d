//! Output encodings: JSON-safe values and CSV bytes.

use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::dataset::Row;

/// Converts any serializable value into a JSON tree in which every
/// not-a-number or infinite float, at any depth, has become `null`.
pub fn to_json_safe<T: Serialize + ?Sized>(value: &T) -> Result<JsonValue, serde_json::Error> {
    serde_json::to_value(value)
}

/// One row as a JSON object keyed by column name. Later duplicate column
/// names overwrite earlier ones, as a record mapping would.
pub fn row_to_json(headers: &[String], row: &Row) -> Result<JsonValue, serde_json::Error> {
    let mut object = Map::with_capacity(headers.len());
    for (name, cell) in headers.iter().zip(row) {
        object.insert(name.clone(), to_json_safe(cell)?);
    }
    Ok(JsonValue::Object(object))
}

/// UTF-8 CSV with a header row, columns in dataset order (including `area_norm`).
pub fn to_csv(headers: &[String], rows: &[&Row]) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(Vec::new());
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row.iter().map(|cell| cell.as_display().into_owned()))?;
    }
    writer
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))
}
