//! Read the event sheet from a workbook
//!
//! Only the first worksheet is used. Its first row holds the column names;
//! every following row with at least one non-empty cell is a data row.

use calamine::{Data, Reader, open_workbook_auto};
use chrono::NaiveDateTime;
use log::debug;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::path::Path;

use super::error::ImportError;

static EMPTY_CELL: Data = Data::Empty;

/// Header plus data rows of one worksheet
#[derive(Debug, Clone)]
pub struct Sheet {
    headers: Vec<String>,
    columns: HashMap<String, usize>,
    /// (1-based spreadsheet row number, cells)
    rows: Vec<(usize, Vec<Data>)>,
}

/// One data row, looked up by column name
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    number: usize,
    cells: &'a [Data],
    columns: &'a HashMap<String, usize>,
}

impl Sheet {
    /// Open a workbook (xlsx, xlsm, xlsb, xls or ods) and read its first worksheet
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ImportError> {
        let path = path.as_ref();
        let mut workbook = open_workbook_auto(path).map_err(|source| ImportError::Workbook {
            path: path.to_path_buf(),
            source,
        })?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| ImportError::EmptyWorkbook {
                path: path.to_path_buf(),
            })?
            .map_err(|source| ImportError::Workbook {
                path: path.to_path_buf(),
                source,
            })?;

        // The range starts at the first used cell, which is not always A1
        let header_row = range.start().map(|(row, _)| row as usize + 1).unwrap_or(1);
        let rows: Vec<Vec<Data>> = range.rows().map(|r| r.to_vec()).collect();

        let sheet = Self::from_rows(rows, header_row);
        debug!(
            "Read {} data rows from {} (columns: {:?})",
            sheet.len(),
            path.display(),
            sheet.headers()
        );
        Ok(sheet)
    }

    /// Build a sheet from raw cells; the first row is the header and sits at
    /// spreadsheet row `header_row`
    pub fn from_rows(rows: Vec<Vec<Data>>, header_row: usize) -> Self {
        let mut rows = rows.into_iter();

        let headers: Vec<String> = rows
            .next()
            .map(|cells| cells.iter().map(header_name).collect())
            .unwrap_or_default();

        // First occurrence wins for repeated column names
        let mut columns = HashMap::new();
        for (idx, name) in headers.iter().enumerate() {
            if !name.is_empty() {
                columns.entry(name.clone()).or_insert(idx);
            }
        }

        let rows = rows
            .enumerate()
            .filter(|(_, cells)| !cells.iter().all(is_empty_cell))
            .map(|(idx, cells)| (header_row + 1 + idx, cells))
            .collect();

        Self {
            headers,
            columns,
            rows,
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Data rows in file order
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> + '_ {
        self.rows.iter().map(|(number, cells)| Row {
            number: *number,
            cells,
            columns: &self.columns,
        })
    }
}

impl<'a> Row<'a> {
    /// 1-based spreadsheet row number
    pub fn number(&self) -> usize {
        self.number
    }

    /// Cell under `column`, or `None` if the sheet has no such column
    pub fn try_get(&self, column: &str) -> Option<&'a Data> {
        let idx = *self.columns.get(column)?;
        Some(self.cells.get(idx).unwrap_or(&EMPTY_CELL))
    }

    /// Cell under `column`; a missing column is an error
    pub fn get(&self, column: &str) -> Result<&'a Data, ImportError> {
        self.try_get(column).ok_or_else(|| ImportError::MissingColumn {
            column: column.to_string(),
            row: self.number,
        })
    }
}

fn header_name(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::String(s) => s.trim().to_string(),
        other => match cell_to_value(other) {
            Value::String(s) => s,
            value => value.to_string(),
        },
    }
}

/// Cell with no value at all (empty or an error)
pub fn is_empty_cell(cell: &Data) -> bool {
    matches!(cell, Data::Empty | Data::Error(_))
}

/// Short name of a cell's kind, for diagnostics
pub fn cell_kind(cell: &Data) -> &'static str {
    match cell {
        Data::Empty => "an empty cell",
        Data::String(_) => "text",
        Data::Int(_) | Data::Float(_) => "a number",
        Data::Bool(_) => "a boolean",
        Data::DateTime(_) | Data::DateTimeIso(_) => "a date",
        Data::DurationIso(_) => "a duration",
        Data::Error(_) => "an error cell",
    }
}

/// Convert a cell to JSON without interpreting its contents
pub fn cell_to_value(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        Data::Int(i) => json!(*i),
        Data::Float(f) => {
            // Spreadsheets store every number as a float; keep whole ones integral
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 {
                json!(*f as i64)
            } else {
                json!(*f)
            }
        }
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) => Value::String(iso_datetime(&naive)),
            None => json!(dt.as_f64()),
        },
        Data::DateTimeIso(s) => Value::String(s.clone()),
        Data::DurationIso(s) => Value::String(s.clone()),
    }
}

/// `YYYY-MM-DDTHH:MM:SS`, with a fraction only when the time has one
fn iso_datetime(naive: &NaiveDateTime) -> String {
    naive.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}
