//! Command-line arguments

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "events-importer",
    version,
    about = "Import XLSX events to Supabase",
    long_about = "Reads the first worksheet of a spreadsheet and inserts every row into the \
                  Supabase `events` table, one request per row, in file order.\n\n\
                  Connection settings come from VITE_SUPABASE_URL and \
                  VITE_SUPABASE_PUBLISHABLE_KEY (a .env file is honoured). \
                  Set RUST_LOG=debug to see each inserted record."
)]
pub struct Cli {
    /// Path to the XLSX file
    pub xlsx_path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_path() {
        let cli = Cli::try_parse_from(["events-importer", "data/events.xlsx"]).unwrap();
        assert_eq!(cli.xlsx_path, PathBuf::from("data/events.xlsx"));
    }

    #[test]
    fn test_path_is_required() {
        assert!(Cli::try_parse_from(["events-importer"]).is_err());
    }

    #[test]
    fn test_no_flags_accepted() {
        assert!(Cli::try_parse_from(["events-importer", "--batch", "a.xlsx"]).is_err());
        assert!(Cli::try_parse_from(["events-importer", "a.xlsx", "b.xlsx"]).is_err());
    }

    #[test]
    fn test_command_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
