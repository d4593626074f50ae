//! Handles serialising and saving data to disk in the _parquet_ file format.

pub mod points;

pub use points::{load_points, save_points};
