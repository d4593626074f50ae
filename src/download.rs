//! Downloads the station inventory and the yearly observation archive.

use std::io::Read;

use flate2::read::MultiGzDecoder;
use futures::StreamExt;
use tracing::debug;

use crate::{
    cli::{create_spinner, set_byte_progress_style},
    error::{Error, Result},
};

pub const INVENTORY_URL: &str = "https://www.ncei.noaa.gov/pub/data/ghcn/daily/ghcnd-stations.txt";

/// Returns the URL of the compressed daily observations for `year`.
pub fn archive_url(year: i32) -> String {
    format!("https://www.ncei.noaa.gov/pub/data/ghcn/daily/by_year/{}.csv.gz", year)
}

/// Something that can retrieve the raw bytes behind a URL.
pub trait Fetch {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Fetches over HTTP, showing download progress.
#[derive(Debug, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let file_name = url.rsplit('/').next().unwrap_or(url);
        let bar = create_spinner(format!("Downloading {}", file_name));

        let response = self.client.get(url).send().await.map_err(|source| {
            bar.abandon_with_message(format!("Failed to download {}", file_name));
            Error::Fetch {
                url: url.to_string(),
                source,
            }
        })?;

        if !response.status().is_success() {
            bar.abandon_with_message(format!("Failed to download {}", file_name));
            return Err(Error::FetchStatus {
                url: url.to_string(),
                status: response.status(),
            });
        }

        let total_size = response.content_length().unwrap_or(0);
        if total_size > 0 {
            set_byte_progress_style(&bar, total_size);
        }

        let mut body = Vec::with_capacity(total_size as usize);
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|source| Error::Fetch {
                url: url.to_string(),
                source,
            })?;
            body.extend_from_slice(&chunk);
            bar.set_position(body.len() as u64);
        }

        bar.finish_with_message(format!("Downloaded {}", file_name));
        debug!(url, bytes = body.len(), "download complete");

        Ok(body)
    }
}

/// Wraps gzip-compressed bytes in a decompressing reader.
///
/// The yearly archives can be made of several concatenated gzip members, so
/// every member is read rather than only the first.
pub fn gunzip(bytes: &[u8]) -> impl Read + '_ {
    MultiGzDecoder::new(bytes)
}

// -- Tests -------------------------------------------------------------------
