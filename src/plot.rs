//! Renders the points artifact as a scatter map.

use std::{
    fs, io,
    path::{Path, PathBuf},
    process::Command,
};

use plotly::{
    common::{ColorBar, ColorScale, ColorScaleElement, Marker, Mode, Title},
    layout::{Center, Mapbox, MapboxStyle},
    Layout, Plot, ScatterMapbox,
};
use tracing::info;

use crate::{
    error::{Error, Result},
    parquet::load_points,
    points::{PlottablePoint, MAX_MARKER_SIZE},
};

const ZOOM: u8 = 4;

// cmocean "thermal"
const THERMAL: [(f64, &str); 6] = [
    (0.0, "rgb(4,35,51)"),
    (0.2, "rgb(42,56,146)"),
    (0.4, "rgb(124,77,140)"),
    (0.6, "rgb(194,90,109)"),
    (0.8, "rgb(248,128,66)"),
    (1.0, "rgb(232,250,91)"),
];

/// Loads the artifact at `file_path`, writes the map to an HTML file beside
/// it and opens it in the browser. Returns the HTML path.
///
/// A page that cannot be written or a browser that cannot be started is
/// reported as a visualisation error; the HTML file is kept in the latter case.
pub fn visualise(file_path: &Path, country_code: &str, year: i32) -> Result<PathBuf> {
    render(file_path, country_code, year, |page| run(browser_command(page)))
}

fn render<F>(file_path: &Path, country_code: &str, year: i32, open: F) -> Result<PathBuf>
where
    F: FnOnce(&Path) -> io::Result<()>,
{
    let points = load_points(file_path)?;
    if points.is_empty() {
        return Err(Error::visualization(file_path, "artifact has no rows"));
    }

    let plot = make_plot(&points, country_code, year);
    let html_path = file_path.with_file_name(format!("{}_temperature_{}.html", country_code, year));
    fs::write(&html_path, plot.to_html()).map_err(|e| Error::visualization(&html_path, e))?;
    info!("Map written to {}", html_path.display());

    open(&html_path).map_err(|e| Error::visualization(&html_path, format!("cannot open browser: {}", e)))?;

    Ok(html_path)
}

#[cfg(target_os = "macos")]
fn browser_command(page: &Path) -> Command {
    let mut command = Command::new("open");
    command.arg(page);
    command
}

#[cfg(target_os = "windows")]
fn browser_command(page: &Path) -> Command {
    let mut command = Command::new("cmd");
    command.args(["/C", "start", ""]).arg(page);
    command
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn browser_command(page: &Path) -> Command {
    let mut command = Command::new("xdg-open");
    command.arg(page);
    command
}

fn run(mut command: Command) -> io::Result<()> {
    let status = command.status()?;
    if status.success() {
        Ok(())
    } else {
        Err(io::Error::new(io::ErrorKind::Other, format!("{:?} exited with {}", command.get_program(), status)))
    }
}

pub fn make_plot(points: &[PlottablePoint], country_code: &str, year: i32) -> Plot {
    let lats: Vec<f64> = points.iter().map(|p| p.latitude).collect();
    let lons: Vec<f64> = points.iter().map(|p| p.longitude).collect();
    let values: Vec<f64> = points.iter().map(|p| p.value).collect();
    let ids: Vec<&str> = points.iter().map(|p| p.id.as_str()).collect();

    let trace = ScatterMapbox::new(lats, lons)
        .mode(Mode::Markers)
        .text_array(ids)
        .marker(
            Marker::new()
                .size_array(marker_sizes(points))
                .color_array(values)
                .color_scale(thermal_scale())
                .show_scale(true)
                .color_bar(ColorBar::new().title(Title::with_text("Temperature (°C)"))),
        );

    let layout = Layout::new()
        .title(Title::with_text(title(country_code, year)))
        .mapbox(
            Mapbox::new()
                .style(MapboxStyle::CartoPositron)
                .center(centre(points))
                .zoom(ZOOM),
        );

    let mut plot = Plot::new();
    plot.add_trace(trace);
    plot.set_layout(layout);

    plot
}

pub fn title(country_code: &str, year: i32) -> String {
    format!("Average Temperature in {} ({})", country_code, year)
}

// Marker sizes are whole pixels, capped at the artifact's maximum
fn marker_sizes(points: &[PlottablePoint]) -> Vec<usize> {
    points
        .iter()
        .map(|p| p.size.clamp(0.0, MAX_MARKER_SIZE).round() as usize)
        .collect()
}

fn centre(points: &[PlottablePoint]) -> Center {
    let n = points.len().max(1) as f64;
    let lat = points.iter().map(|p| p.latitude).sum::<f64>() / n;
    let lon = points.iter().map(|p| p.longitude).sum::<f64>() / n;

    Center::new(lat, lon)
}

fn thermal_scale() -> ColorScale {
    ColorScale::Vector(
        THERMAL
            .iter()
            .map(|(stop, colour)| ColorScaleElement(*stop, colour.to_string()))
            .collect(),
    )
}

// -- Tests -------------------------------------------------------------------
