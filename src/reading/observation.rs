//! Filters the yearly observation archive and averages temperatures per station.
//!
//! The archive is a headerless CSV with the columns
//! `ID,DATE,ELEMENT,VALUE,MFLAG,QFLAG,SFLAG,OBS_TIME`. Only the first four are
//! read. Filtering and unit conversion work on whole record batches with the
//! arrow compute kernels.

use std::{
    collections::{HashMap, HashSet},
    io::Read,
    sync::Arc,
};

use arrow::{
    array::{Array, ArrayRef, AsArray, BooleanArray, Date32Array, Float64Array, StringArray},
    compute::{self, kernels::{boolean, cmp, numeric, partition::partition}},
    csv::ReaderBuilder,
    datatypes::{DataType, Field, Float64Type, Schema, SchemaRef},
    record_batch::RecordBatch,
};
use chrono::{Datelike, NaiveDate};
use tracing::{debug, info};

use crate::{
    error::Result,
    reading::element::TEMPERATURE_ELEMENTS,
};

const BATCH_SIZE: usize = 64 * 1024;

pub const ID: usize = 0;
pub const DATE: usize = 1;
pub const ELEMENT: usize = 2;
pub const VALUE: usize = 3;

/// Schema of the raw archive. VALUE is read as text so that a bad cell only
/// drops its own row.
pub fn archive_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("ID", DataType::Utf8, true),
        Field::new("DATE", DataType::Utf8, true),
        Field::new("ELEMENT", DataType::Utf8, true),
        Field::new("VALUE", DataType::Utf8, true),
        Field::new("MFLAG", DataType::Utf8, true),
        Field::new("QFLAG", DataType::Utf8, true),
        Field::new("SFLAG", DataType::Utf8, true),
        Field::new("OBS_TIME", DataType::Utf8, true),
    ]))
}

/// Schema of the filtered temperature batches. VALUE is in degrees Celsius.
pub fn temperature_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("ID", DataType::Utf8, false),
        Field::new("DATE", DataType::Date32, false),
        Field::new("ELEMENT", DataType::Utf8, false),
        Field::new("VALUE", DataType::Float64, false),
    ]))
}

/// Reads the decompressed archive and returns the mean temperature in degrees
/// Celsius of every station in `stations` that has at least one reading.
pub fn average_temperatures<R: Read>(archive: R, stations: &HashSet<String>) -> Result<HashMap<String, f64>> {
    let reader = ReaderBuilder::new(archive_schema())
        .with_header(false)
        .with_batch_size(BATCH_SIZE)
        .with_projection(vec![ID, DATE, ELEMENT, VALUE])
        .build(archive)?;

    let mut totals: HashMap<String, (f64, u32)> = HashMap::new();
    let mut rows_read = 0;
    let mut rows_kept = 0;

    for batch in reader {
        let batch = batch?;
        rows_read += batch.num_rows();

        let temperatures = filter_temperatures(&batch, stations)?;
        rows_kept += temperatures.num_rows();
        accumulate(&temperatures, &mut totals)?;
    }

    info!("Kept {} of {} observations", rows_kept, rows_read);

    Ok(totals
        .into_iter()
        .map(|(id, (sum, count))| (id, sum / count as f64))
        .collect())
}

/// Keeps the temperature rows of the given stations, converting VALUE from
/// tenths of a degree to degrees and DATE to a calendar date. Rows whose
/// VALUE is not an integer or whose DATE is not `YYYYMMDD` are dropped.
pub fn filter_temperatures(batch: &RecordBatch, stations: &HashSet<String>) -> Result<RecordBatch> {
    let ids = batch.column(ID).as_string::<i32>();
    let elements = batch.column(ELEMENT);

    let in_stations: BooleanArray = ids.iter().map(|id| id.map(|id| stations.contains(id))).collect();

    let mut is_temperature = cmp::eq(elements, &StringArray::new_scalar(TEMPERATURE_ELEMENTS[0].code()))?;
    for element in &TEMPERATURE_ELEMENTS[1..] {
        let matches = cmp::eq(elements, &StringArray::new_scalar(element.code()))?;
        is_temperature = boolean::or(&is_temperature, &matches)?;
    }

    let selected = compute::filter_record_batch(batch, &boolean::and(&in_stations, &is_temperature)?)?;

    let dates: ArrayRef = Arc::new(parse_dates(selected.column(DATE).as_string::<i32>()));
    let raw = compute::cast(&compute::cast(selected.column(VALUE), &DataType::Int64)?, &DataType::Float64)?;
    let celsius = numeric::div(&raw, &Float64Array::new_scalar(10.0))?;

    let valid = boolean::and(&compute::is_not_null(&dates)?, &compute::is_not_null(&celsius)?)?;
    let dropped = valid.len() - valid.true_count();
    if dropped > 0 {
        debug!("Dropped {} rows with an unreadable DATE or VALUE", dropped);
    }

    let columns = [selected.column(ID).clone(), dates, selected.column(ELEMENT).clone(), celsius]
        .iter()
        .map(|column| compute::filter(column.as_ref(), &valid))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(RecordBatch::try_new(temperature_schema(), columns)?)
}

fn parse_dates(dates: &StringArray) -> Date32Array {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)
        .map(|d| d.num_days_from_ce())
        .unwrap_or_default();

    dates
        .iter()
        .map(|date| {
            date.and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y%m%d").ok())
                .map(|d| d.num_days_from_ce() - epoch)
        })
        .collect()
}

/// Adds each station's sum and count of readings in `temperatures` to
/// `totals`. The batch is sorted by ID so every station is one contiguous run.
fn accumulate(temperatures: &RecordBatch, totals: &mut HashMap<String, (f64, u32)>) -> Result<()> {
    if temperatures.num_rows() == 0 {
        return Ok(());
    }

    let order = compute::sort_to_indices(temperatures.column(ID), None, None)?;
    let sorted = compute::take_record_batch(temperatures, &order)?;

    let ids = sorted.column(ID).as_string::<i32>();
    let values = sorted.column(VALUE).as_primitive::<Float64Type>();

    for run in partition(&[sorted.column(ID).clone()])?.ranges() {
        let readings = values.slice(run.start, run.len());
        let entry = totals.entry(ids.value(run.start).to_string()).or_insert((0.0, 0));
        entry.0 += compute::sum(&readings).unwrap_or_default();
        entry.1 += readings.len() as u32;
    }

    Ok(())
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn station_set(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    fn raw_batch(rows: &[(&str, &str, &str, &str)]) -> RecordBatch {
        let column = |i: usize| -> ArrayRef {
            Arc::new(StringArray::from(
                rows.iter()
                    .map(|r| match i {
                        0 => r.0,
                        1 => r.1,
                        2 => r.2,
                        _ => r.3,
                    })
                    .collect::<Vec<_>>(),
            ))
        };

        let schema = Arc::new(archive_schema().project(&[ID, DATE, ELEMENT, VALUE]).unwrap());
        RecordBatch::try_new(schema, vec![column(0), column(1), column(2), column(3)]).unwrap()
    }

    #[test]
    fn should_keep_only_temperature_rows_of_requested_stations() {
        let batch = raw_batch(&[
            ("NOE00105480", "20200101", "TMAX", "21"),
            ("NOE00105480", "20200101", "PRCP", "30"),
            ("NOE00105480", "20200101", "TMIN", "-35"),
            ("NOE00105480", "20200101", "TAVG", "-7"),
            ("SE000097400", "20200101", "TMAX", "40"),
            ("NOE00105480", "20200101", "SNWD", "100"),
        ]);

        let filtered = filter_temperatures(&batch, &station_set(&["NOE00105480"])).unwrap();

        assert_eq!(filtered.num_rows(), 3);
        let ids = filtered.column(ID).as_string::<i32>();
        let elements = filtered.column(ELEMENT).as_string::<i32>();
        for i in 0..filtered.num_rows() {
            assert_eq!(ids.value(i), "NOE00105480");
            assert!(["TMAX", "TMIN", "TAVG"].contains(&elements.value(i)));
        }
    }

    #[test]
    fn should_convert_tenths_to_degrees() {
        let batch = raw_batch(&[
            ("NOE00105480", "20200101", "TMAX", "21"),
            ("NOE00105480", "20200102", "TMIN", "-35"),
            ("NOE00105480", "20200103", "TAVG", "0"),
        ]);

        let filtered = filter_temperatures(&batch, &station_set(&["NOE00105480"])).unwrap();
        let values = filtered.column(VALUE).as_primitive::<Float64Type>();

        assert_eq!(values.value(0), 21.0 / 10.0);
        assert_eq!(values.value(1), -35.0 / 10.0);
        assert_eq!(values.value(2), 0.0);
    }

    #[test]
    fn should_parse_dates() {
        let batch = raw_batch(&[("NOE00105480", "20200102", "TMAX", "21")]);

        let filtered = filter_temperatures(&batch, &station_set(&["NOE00105480"])).unwrap();
        let dates = filtered.column(DATE).as_primitive::<arrow::datatypes::Date32Type>();

        assert_eq!(dates.value_as_date(0), NaiveDate::from_ymd_opt(2020, 1, 2));
        assert_eq!(filtered.schema(), temperature_schema());
    }

    #[test]
    fn should_drop_rows_with_bad_date_or_value() {
        let batch = raw_batch(&[
            ("NOE00105480", "2020-01-01", "TMAX", "21"),
            ("NOE00105480", "20201301", "TMAX", "21"),
            ("NOE00105480", "20200101", "TMAX", "warm"),
            ("NOE00105480", "20200101", "TMAX", "25"),
        ]);

        let filtered = filter_temperatures(&batch, &station_set(&["NOE00105480"])).unwrap();
        let values = filtered.column(VALUE).as_primitive::<Float64Type>();

        assert_eq!(filtered.num_rows(), 1);
        assert_eq!(values.value(0), 2.5);
    }

    #[test]
    fn should_average_per_station() {
        let archive = "\
NOE00105480,20200101,TMAX,21,,,E,
NOE00105480,20200102,TMAX,25,,,E,
NOE00105480,20200103,TMAX,23,,,E,
NOM00001001,20200101,TMIN,-50,,,E,
NOM00001001,20200101,TMAX,-10,,,E,
NOM00001001,20200101,PRCP,99,,,E,
SE000097400,20200101,TMAX,40,,,E,
";
        let averages = average_temperatures(
            archive.as_bytes(),
            &station_set(&["NOE00105480", "NOM00001001", "NO000000000"]),
        )
        .unwrap();

        assert_eq!(averages.len(), 2);
        assert!((averages["NOE00105480"] - 2.3).abs() < 1e-12);
        assert!((averages["NOM00001001"] - -3.0).abs() < 1e-12);
        assert!(!averages.contains_key("NO000000000"));
        assert!(!averages.contains_key("SE000097400"));
    }

    #[test]
    fn should_accumulate_interleaved_stations_across_batches() {
        let stations = station_set(&["NOE00105480", "NOM00001001"]);
        let first = filter_temperatures(
            &raw_batch(&[
                ("NOM00001001", "20200101", "TMAX", "-10"),
                ("NOE00105480", "20200101", "TMAX", "20"),
                ("NOM00001001", "20200102", "TMAX", "-30"),
                ("NOE00105480", "20200102", "TMIN", "40"),
            ]),
            &stations,
        )
        .unwrap();
        let second = filter_temperatures(&raw_batch(&[("NOE00105480", "20200103", "TAVG", "60")]), &stations).unwrap();

        let mut totals = HashMap::new();
        accumulate(&first, &mut totals).unwrap();
        accumulate(&second, &mut totals).unwrap();
        accumulate(&filter_temperatures(&raw_batch(&[]), &stations).unwrap(), &mut totals).unwrap();

        assert_eq!(totals.len(), 2);
        let (sum, count) = totals["NOE00105480"];
        assert_eq!(count, 3);
        assert!((sum - 12.0).abs() < 1e-12);
        let (sum, count) = totals["NOM00001001"];
        assert_eq!(count, 2);
        assert!((sum - -4.0).abs() < 1e-12);
    }

    #[test]
    fn should_return_empty_map_without_matches() {
        let archive = "SE000097400,20200101,TMAX,40,,,E,\n";
        let averages = average_temperatures(archive.as_bytes(), &station_set(&["NOE00105480"])).unwrap();

        assert!(averages.is_empty());
    }

    #[test]
    fn should_fail_on_wrong_column_count() {
        let archive = "NOE00105480;20200101;TMAX;21\n";
        let result = average_temperatures(archive.as_bytes(), &station_set(&["NOE00105480"]));

        assert!(matches!(result, Err(crate::error::Error::Archive(_))));
    }
}
