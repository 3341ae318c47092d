//! Sequential row-by-row import
//!
//! Each row becomes one insert, awaited before the next row is read. The
//! first failure stops the run; rows inserted before it stay inserted.

use anyhow::{Context, Result};
use log::{debug, info, warn};

use super::record::{EventRecord, METADATA};
use super::sheet::Sheet;
use crate::api::TableClient;

/// Outcome of a completed import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: usize,
}

/// Inserts every row of a sheet into one table
pub struct Importer<C> {
    client: C,
    table: String,
}

impl<C: TableClient> Importer<C> {
    pub fn new(client: C, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    pub async fn run(&self, sheet: &Sheet) -> Result<ImportSummary> {
        if sheet.is_empty() {
            warn!("Sheet has no data rows, nothing to import");
            return Ok(ImportSummary::default());
        }

        if !sheet.has_column(METADATA) {
            debug!("No '{}' column, records get empty metadata", METADATA);
        }

        info!("Importing {} rows into '{}'", sheet.len(), self.table);

        let mut summary = ImportSummary::default();
        for row in sheet.rows() {
            let record = EventRecord::from_row(&row)?;
            let body = serde_json::to_value(&record)
                .with_context(|| format!("Failed to encode row {}", row.number()))?;

            debug!("Row {}: {}", row.number(), body);

            let stored = self
                .client
                .insert(&self.table, &body)
                .await
                .with_context(|| {
                    format!("Failed to insert row {} into '{}'", row.number(), self.table)
                })?;
            debug!("Row {} stored: {}", row.number(), stored);

            summary.inserted += 1;
        }

        info!("Inserted {} rows into '{}'", summary.inserted, self.table);
        Ok(summary)
    }
}
