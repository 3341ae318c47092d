//! Row → `events` record mapping

use calamine::Data;
use serde::Serialize;
use serde_json::{Map, Value};

use super::error::ImportError;
use super::sheet::{Row, cell_kind, cell_to_value};

pub const RECORDING_ID: &str = "recording_id";
pub const EVENT_TYPE_ID: &str = "event_type_id";
pub const TIMESTAMP: &str = "timestamp";
pub const OFFSET_MS: &str = "offset_ms";
pub const METADATA: &str = "metadata";

/// One record for the `events` table
///
/// The scalar fields carry the cell values as they are; the backend's
/// column types decide whether they are acceptable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    pub recording_id: Value,
    pub event_type_id: Value,
    pub timestamp: Value,
    pub offset_ms: Value,
    pub metadata: Value,
}

impl EventRecord {
    pub fn from_row(row: &Row<'_>) -> Result<Self, ImportError> {
        Ok(Self {
            recording_id: cell_to_value(row.get(RECORDING_ID)?),
            event_type_id: cell_to_value(row.get(EVENT_TYPE_ID)?),
            timestamp: cell_to_value(row.get(TIMESTAMP)?),
            offset_ms: cell_to_value(row.get(OFFSET_MS)?),
            metadata: parse_metadata(row)?,
        })
    }
}

/// Text that spreadsheet tooling conventionally reads as "no value"
/// (pandas' default `na_values`); matched exactly, without trimming
const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// JSON text in the `metadata` cell; `{}` when the column or value is absent
fn parse_metadata(row: &Row<'_>) -> Result<Value, ImportError> {
    let cell = match row.try_get(METADATA) {
        None | Some(Data::Empty) | Some(Data::Error(_)) => return Ok(empty_object()),
        Some(cell) => cell,
    };

    match cell {
        Data::String(text) if NA_TOKENS.contains(&text.as_str()) => Ok(empty_object()),
        Data::String(text) => {
            serde_json::from_str(text).map_err(|source| ImportError::InvalidMetadata {
                row: row.number(),
                source,
            })
        }
        other => Err(ImportError::MetadataNotText {
            row: row.number(),
            kind: cell_kind(other),
        }),
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}
