//! leafdex CLI — builds a structured medicines dataset from a public
//! leaflet site.
//!
//! Discovers the catalog on the index page, extracts every item under
//! bounded concurrency, repairs flattened text, and writes one JSON result.

mod commands;
mod progress;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
