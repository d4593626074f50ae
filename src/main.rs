mod cli;
mod download;
mod error;
mod parquet;
mod plot;
mod points;
mod reading;

use std::env;

use anyhow::{Error, Result};
use clap::Parser;
use cli::{command, Cli};
use download::HttpFetcher;
use tracing::Level;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_dir = env::current_dir()?;

    match command::temperature(&HttpFetcher::new(), cli.year, &cli.country, &output_dir).await {
        Ok(filename) => {
            println!("File saved to `{}`", filename.display());

            if let Err(e) = plot::visualise(&filename, &cli.country, cli.year) {
                tracing::error!("Error visualising data: {}", e);
            }
        }
        Err(e) => tracing::error!("Error fetching and processing data: {:#}", Error::from(e)),
    }

    Ok(())
}
