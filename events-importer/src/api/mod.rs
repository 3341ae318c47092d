//! Supabase REST API access

pub mod client;
pub mod constants;

pub use client::{SupabaseClient, TableClient};
pub use constants::EVENTS_TABLE;
