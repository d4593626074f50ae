//! Joins station averages back to station coordinates and scales marker sizes.

use std::collections::HashMap;

use crate::{
    error::{Error, Result},
    reading::Station,
};

/// Largest marker size on the map.
pub const MAX_MARKER_SIZE: f64 = 15.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PlottablePoint {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Mean temperature in degrees Celsius.
    pub value: f64,
    /// Marker size in `0.0..=MAX_MARKER_SIZE`.
    pub size: f64,
}

/// Inner join of `averages` and `stations` on station id, in station order.
///
/// Stations without an average are left out. Fails when nothing joins or
/// when every average is zero, since the sizes could not be scaled.
pub fn join_stations(averages: &HashMap<String, f64>, stations: &[Station]) -> Result<Vec<PlottablePoint>> {
    let mut points: Vec<PlottablePoint> = stations
        .iter()
        .filter_map(|station| {
            averages.get(&station.id).map(|value| PlottablePoint {
                id: station.id.clone(),
                latitude: station.latitude,
                longitude: station.longitude,
                value: *value,
                size: value.abs(),
            })
        })
        .collect();

    scale_sizes(&mut points)?;

    Ok(points)
}

// Scale |value| so that the largest maps to MAX_MARKER_SIZE
fn scale_sizes(points: &mut [PlottablePoint]) -> Result<()> {
    if points.is_empty() {
        return Err(Error::EmptyResult(
            "no station has both coordinates and observations".to_string(),
        ));
    }

    let max_size = points.iter().map(|p| p.size).fold(0.0, f64::max);
    if max_size == 0.0 || !max_size.is_finite() {
        return Err(Error::EmptyResult(format!(
            "cannot scale marker sizes by a maximum of {}",
            max_size
        )));
    }

    for point in points.iter_mut() {
        point.size = point.size / max_size * MAX_MARKER_SIZE;
    }

    Ok(())
}

// -- Tests -------------------------------------------------------------------

#[cfg(test)]
mod test {

    use super::*;

    fn station(id: &str, latitude: f64, longitude: f64) -> Station {
        Station {
            id: id.to_string(),
            latitude,
            longitude,
        }
    }

    fn averages(values: &[(&str, f64)]) -> HashMap<String, f64> {
        values.iter().map(|(id, v)| (id.to_string(), *v)).collect()
    }

    #[test]
    fn should_join_in_station_order() {
        let stations = vec![
            station("NO0station0", 1.0, 2.0),
            station("NO0station1", 3.0, 4.0),
            station("NO0station2", 5.0, 6.0),
        ];
        let averages = averages(&[("NO0station2", 4.0), ("NO0station0", -2.0), ("XXX", 9.0)]);

        let points = join_stations(&averages, &stations).unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].id, "NO0station0");
        assert_eq!((points[0].latitude, points[0].longitude), (1.0, 2.0));
        assert_eq!(points[0].value, -2.0);
        assert_eq!(points[1].id, "NO0station2");
        assert_eq!((points[1].latitude, points[1].longitude), (5.0, 6.0));
    }

    #[test]
    fn should_scale_sizes_by_absolute_maximum() {
        let stations = vec![station("A", 0.0, 0.0), station("B", 0.0, 0.0), station("C", 0.0, 0.0)];
        let averages = averages(&[("A", 1.0), ("B", -2.0), ("C", 4.0)]);

        let points = join_stations(&averages, &stations).unwrap();
        let sizes: Vec<f64> = points.iter().map(|p| p.size).collect();

        assert_eq!(sizes, vec![3.75, 7.5, 15.0]);
    }

    #[test]
    fn should_map_negative_maximum_to_full_size() {
        let stations = vec![station("A", 0.0, 0.0), station("B", 0.0, 0.0)];
        let averages = averages(&[("A", -8.0), ("B", 2.0)]);

        let points = join_stations(&averages, &stations).unwrap();

        assert_eq!(points[0].size, MAX_MARKER_SIZE);
        assert_eq!(points[1].size, 3.75);
    }

    #[test]
    fn should_fail_on_empty_join() {
        let stations = vec![station("A", 0.0, 0.0)];
        let averages = averages(&[("B", 1.0)]);

        let result = join_stations(&averages, &stations);

        assert!(matches!(result, Err(Error::EmptyResult(_))));
    }

    #[test]
    fn should_fail_when_all_values_are_zero() {
        let stations = vec![station("A", 0.0, 0.0), station("B", 0.0, 0.0)];
        let averages = averages(&[("A", 0.0), ("B", -0.0)]);

        let result = join_stations(&averages, &stations);

        assert!(matches!(result, Err(Error::EmptyResult(_))));
    }
}
