//! GHCN daily element codes.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Represents the type of measurement. See the
/// [GHCN daily readme](https://www.ncei.noaa.gov/pub/data/ghcn/daily/readme.txt)
/// section III for the other elements, which are not read.
pub enum Element {
    Tmax,
    Tmin,
    Tavg,
}

/// Elements that carry a temperature in tenths of a degree Celsius.
pub const TEMPERATURE_ELEMENTS: [Element; 3] = [Element::Tmax, Element::Tmin, Element::Tavg];

impl Element {
    pub fn code(&self) -> &'static str {
        match self {
            Element::Tmax => "TMAX",
            Element::Tmin => "TMIN",
            Element::Tavg => "TAVG",
        }
    }
}
