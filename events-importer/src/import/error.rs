use std::path::PathBuf;
use thiserror::Error;

/// Failures while turning spreadsheet rows into event records
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read workbook {}", path.display())]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("workbook {} has no worksheets", path.display())]
    EmptyWorkbook { path: PathBuf },

    #[error("row {row}: missing column '{column}'")]
    MissingColumn { column: String, row: usize },

    #[error("row {row}: metadata is not valid JSON")]
    InvalidMetadata {
        row: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("row {row}: metadata must be JSON text, found {kind}")]
    MetadataNotText { row: usize, kind: &'static str },
}
