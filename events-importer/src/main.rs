mod api;
mod cli;
mod config;
mod import;

use anyhow::Result;
use clap::Parser;
use colored::*;
use log::info;

use api::{EVENTS_TABLE, SupabaseClient};
use cli::Cli;
use config::Config;
use import::{Importer, Sheet};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    config::load_dotenv();
    let config = Config::from_env()?;
    info!("Using Supabase project at {}", config.url);

    let client = SupabaseClient::new(&config)?;
    let sheet = Sheet::open(&cli.xlsx_path)?;

    let importer = Importer::new(client, EVENTS_TABLE);
    let summary = importer.run(&sheet).await?;

    println!(
        "{} Imported {} events from {}",
        "✓".bright_green().bold(),
        summary.inserted.to_string().bright_white().bold(),
        cli.xlsx_path.display().to_string().cyan()
    );

    Ok(())
}
