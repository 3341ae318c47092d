//! Supabase REST endpoint constants

/// PostgREST mount point under the project URL
pub const REST_PATH: &str = "rest/v1";

/// Table the importer writes to
pub const EVENTS_TABLE: &str = "events";

pub mod headers {
    pub const API_KEY: &str = "apikey";
    pub const PREFER: &str = "Prefer";
    /// Ask PostgREST to echo the inserted rows back
    pub const RETURN_REPRESENTATION: &str = "return=representation";
}
