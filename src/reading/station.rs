//! Station inventory parsing.
//!
//! See "GHCN daily readme.txt Section IV" for format.

use tracing::{debug, info};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Station {
    pub fn from_line(line: &str) -> Result<Self> {
        let id = field(line, 0, 11)?.trim_end().to_string();
        let latitude = parse_f64(field(line, 12, 20)?, line)?;
        let longitude = parse_f64(field(line, 21, 30)?, line)?;

        Ok(Station {
            id,
            latitude,
            longitude,
        })
    }
}

/// Returns the stations in `inventory` belonging to `country_code`, in input order.
///
/// Lines that cannot be parsed are dropped.
pub fn parse_inventory(inventory: &str, country_code: &str) -> Vec<Station> {
    let mut stations = Vec::new();
    let mut dropped = 0;

    for line in inventory.lines() {
        if line.get(0..2) != Some(country_code) {
            continue;
        }

        match Station::from_line(line) {
            Ok(station) => stations.push(station),
            Err(e) => {
                debug!("Skipping station line: {}", e);
                dropped += 1;
            }
        }
    }

    info!(
        "Found {} stations in {} ({} malformed lines dropped)",
        stations.len(),
        country_code,
        dropped
    );

    stations
}

fn field(line: &str, start: usize, end: usize) -> Result<&str> {
    line.get(start..end)
        .ok_or_else(|| Error::Parse(format!("line too short for columns {}-{}: `{}`", start + 1, end, line)))
}

fn parse_f64(s: &str, line: &str) -> Result<f64> {
    s.trim()
        .parse::<f64>()
        .map_err(|_| Error::Parse(format!("`{}` is not a coordinate in `{}`", s.trim(), line)))
}

// -- Tests -------------------------------------------------------------------
