use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use tracing::info;

use crate::{
    cli::create_spinner,
    download::{archive_url, gunzip, Fetch, INVENTORY_URL},
    error::{Error, Result},
    parquet,
    points::join_stations,
    reading::{average_temperatures, parse_inventory},
};

use super::{cached_artifact, make_parquet_file_name};

/// Builds the average temperature artifact for `country_code` in `year` and
/// returns its path. An existing artifact is returned without fetching.
pub async fn temperature<F: Fetch>(fetcher: &F, year: i32, country_code: &str, output_dir: &Path) -> Result<PathBuf> {
    if let Some(path) = cached_artifact(output_dir, country_code, year) {
        info!(
            "Data for {} in {} already exists. Skipping data fetch.",
            country_code, year
        );
        return Ok(path);
    }

    let inventory = fetcher.fetch(INVENTORY_URL).await?;
    let stations = parse_inventory(&String::from_utf8_lossy(&inventory), country_code);
    if stations.is_empty() {
        return Err(Error::EmptyResult(format!("no stations found for {}", country_code)));
    }

    let archive = fetcher.fetch(&archive_url(year)).await?;
    let station_ids: HashSet<String> = stations.iter().map(|s| s.id.clone()).collect();

    let bar = create_spinner(format!("Averaging {} observations...", year));
    let averages = average_temperatures(gunzip(&archive), &station_ids);
    bar.finish_and_clear();
    let averages = averages?;

    if averages.is_empty() {
        return Err(Error::EmptyResult(format!(
            "no temperature observations for {} stations in {}",
            country_code, year
        )));
    }

    let points = join_stations(&averages, &stations)?;

    let parquet_file_name = make_parquet_file_name(output_dir, country_code, year);
    parquet::save_points(&points, &parquet_file_name)?;
    info!("Saved {} stations to {}", points.len(), parquet_file_name.display());

    Ok(parquet_file_name)
}

// -- Tests -------------------------------------------------------------------
