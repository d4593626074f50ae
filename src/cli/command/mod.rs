pub mod temperature;

use std::path::{Path, PathBuf};

pub use temperature::temperature;

/// Artifact path for a country and year. Country codes are two characters
/// and years are integers, so distinct pairs never share a name.
pub fn make_parquet_file_name(output_dir: &Path, country_code: &str, year: i32) -> PathBuf {
    output_dir.join(format!("{}_temperature_{}_processed.parquet", country_code, year))
}

/// Returns the artifact path if a previous run already produced it.
pub fn cached_artifact(output_dir: &Path, country_code: &str, year: i32) -> Option<PathBuf> {
    let path = make_parquet_file_name(output_dir, country_code, year);
    path.exists().then_some(path)
}

// -- Tests -------------------------------------------------------------------
