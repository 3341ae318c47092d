//! Spreadsheet → `events` table import

pub mod error;
pub mod importer;
pub mod record;
pub mod sheet;

pub use importer::Importer;
pub use sheet::Sheet;
