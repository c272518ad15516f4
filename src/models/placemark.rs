//! Placemark records produced by the KML parser.

use serde::{Deserialize, Serialize};

/// A geographic point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    /// Latitude, degrees north
    pub lat: f64,
    /// Longitude, degrees east
    pub lon: f64,
}

impl LatLng {
    /// Creates a new point.
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Returns true if both components are finite and within range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// Placemark coordinate as written in the source file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude, degrees north
    pub latitude: f64,
    /// Longitude, degrees east
    pub longitude: f64,
    /// Altitude in meters, if the source tuple had a third component
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
}

impl Coordinates {
    /// Returns the horizontal position.
    #[must_use]
    pub const fn lat_lng(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }
}

/// One placemark from a data file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placemark {
    /// Display name (parser supplies a positional default when missing)
    pub name: String,
    /// Free-text description, possibly empty
    pub description: String,
    /// Position, absent when the source had no usable coordinate
    pub coordinates: Option<Coordinates>,
}

impl Placemark {
    /// Creates a placemark at the given position with an empty description.
    pub fn at(name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            coordinates: Some(Coordinates {
                latitude: lat,
                longitude: lon,
                altitude: None,
            }),
        }
    }

    /// Returns the horizontal position, if any.
    #[must_use]
    pub fn position(&self) -> Option<LatLng> {
        self.coordinates.as_ref().map(Coordinates::lat_lng)
    }
}
