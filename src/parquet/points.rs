//! Save and load the plottable points artifact.

use std::{fs::File, path::Path, sync::Arc};

use arrow::{
    array::{Array, ArrayRef, AsArray, Float64Array, StringArray},
    datatypes::{DataType, Field, Float64Type, Schema, SchemaRef},
    record_batch::RecordBatch,
};
use parquet::{
    arrow::{arrow_reader::ParquetRecordBatchReaderBuilder, ArrowWriter},
    basic::{Compression, ZstdLevel},
    file::properties::WriterProperties,
};
use tempfile::NamedTempFile;

use crate::{
    error::{Error, Result},
    points::PlottablePoint,
};

fn schema() -> Schema {
    Schema::new(vec![
        Field::new("ID", DataType::Utf8, false),
        Field::new("VALUE", DataType::Float64, false),
        Field::new("LAT", DataType::Float64, false),
        Field::new("LON", DataType::Float64, false),
        Field::new("SIZE", DataType::Float64, false),
    ])
}

/// Writes `points` to `file_path`.
///
/// The file is written next to its destination and renamed into place, so
/// a failed write never leaves a partial artifact behind.
pub fn save_points(points: &[PlottablePoint], file_path: &Path) -> Result<()> {
    let dir = match file_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let tmp = NamedTempFile::new_in(dir)?;

    let schema = Arc::new(schema());
    let props = WriterProperties::builder()
        .set_compression(Compression::ZSTD(ZstdLevel::default()))
        .build();

    let mut writer = ArrowWriter::try_new(tmp.reopen()?, schema.clone(), Some(props))?;

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(points.iter().map(|p| p.id.as_str()))),
        Arc::new(Float64Array::from_iter_values(points.iter().map(|p| p.value))),
        Arc::new(Float64Array::from_iter_values(points.iter().map(|p| p.latitude))),
        Arc::new(Float64Array::from_iter_values(points.iter().map(|p| p.longitude))),
        Arc::new(Float64Array::from_iter_values(points.iter().map(|p| p.size))),
    ];

    let batch = points_batch(schema, columns)?;
    writer.write(&batch)?;
    writer.close()?;

    tmp.persist(file_path).map_err(|e| e.error)?;

    Ok(())
}

fn points_batch(schema: SchemaRef, columns: Vec<ArrayRef>) -> Result<RecordBatch> {
    RecordBatch::try_new(schema, columns).map_err(Error::Artifact)
}

/// Reads the points back from `file_path`. Any problem with the file is
/// reported as a visualisation error.
pub fn load_points(file_path: &Path) -> Result<Vec<PlottablePoint>> {
    let file = File::open(file_path).map_err(|e| Error::visualization(file_path, e))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .and_then(|builder| builder.build())
        .map_err(|e| Error::visualization(file_path, e))?;

    let mut points = Vec::new();

    for batch in reader {
        let batch = batch.map_err(|e| Error::visualization(file_path, e))?;
        points.extend(points_from_batch(&batch).map_err(|reason| Error::visualization(file_path, reason))?);
    }

    Ok(points)
}

fn points_from_batch(batch: &RecordBatch) -> std::result::Result<Vec<PlottablePoint>, String> {
    let ids = batch
        .column_by_name("ID")
        .and_then(|c| c.as_string_opt::<i32>())
        .ok_or("missing text column `ID`")?;
    let values = float_column(batch, "VALUE")?;
    let lats = float_column(batch, "LAT")?;
    let lons = float_column(batch, "LON")?;
    let sizes = float_column(batch, "SIZE")?;

    Ok((0..batch.num_rows())
        .map(|i| PlottablePoint {
            id: ids.value(i).to_string(),
            latitude: lats.value(i),
            longitude: lons.value(i),
            value: values.value(i),
            size: sizes.value(i),
        })
        .collect())
}

fn float_column<'a>(batch: &'a RecordBatch, name: &str) -> std::result::Result<&'a Float64Array, String> {
    let column = batch
        .column_by_name(name)
        .and_then(|c| c.as_primitive_opt::<Float64Type>())
        .ok_or_else(|| format!("missing numeric column `{}`", name))?;

    if column.null_count() > 0 {
        return Err(format!("column `{}` has missing values", name));
    }

    Ok(column)
}

// -- Tests -------------------------------------------------------------------
