//! Deep links between the list page and the map.
//!
//! A link is `map.html?lat=..&lon=..&zoom=..&file=..&placemark=..`. The
//! coordinate is mandatory; `file` and `placemark` together request an exact
//! match.

use serde::Serialize;
use url::form_urlencoded;

use crate::constants::{FOCUS_ZOOM, MAP_PAGE};
use crate::models::LatLng;

/// A target location requested by a deep link.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeepLink {
    /// Target latitude
    pub lat: f64,
    /// Target longitude
    pub lon: f64,
    /// Requested zoom; the focus zoom is used when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom: Option<u8>,
    /// Data file id for an exact match
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Placemark name for an exact match
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placemark: Option<String>,
}

impl DeepLink {
    /// Creates a coordinate-only link.
    #[must_use]
    pub const fn at(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            zoom: None,
            file: None,
            placemark: None,
        }
    }

    /// Sets the requested zoom.
    #[must_use]
    pub const fn with_zoom(mut self, zoom: u8) -> Self {
        self.zoom = Some(zoom);
        self
    }

    /// Names the marker for an exact match.
    #[must_use]
    pub fn with_target(mut self, file: impl Into<String>, placemark: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self.placemark = Some(placemark.into());
        self
    }

    /// Parses a full URL, a relative `map.html?...` link or a bare query.
    ///
    /// Returns `None` unless both `lat` and `lon` are finite numbers. A
    /// `zoom` that is not an integer in range is ignored. Empty `file` or
    /// `placemark` values count as absent.
    ///
    /// # Examples
    ///
    /// ```
    /// use hazardmap::services::DeepLink;
    ///
    /// let link = DeepLink::parse("map.html?lat=41.77&lon=140.73&zoom=17").unwrap();
    /// assert_eq!(link.zoom, Some(17));
    /// assert!(!link.has_exact_target());
    /// assert!(DeepLink::parse("map.html?lat=north&lon=140.73").is_none());
    /// ```
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        let input = input.split_once('#').map_or(input, |(before, _)| before);
        let query = input.split_once('?').map_or(input, |(_, q)| q);

        let mut lat = None;
        let mut lon = None;
        let mut zoom = None;
        let mut file = None;
        let mut placemark = None;

        // First occurrence of a key wins
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match &*key {
                "lat" if lat.is_none() => lat = Some(value.trim().parse::<f64>().ok()),
                "lon" if lon.is_none() => lon = Some(value.trim().parse::<f64>().ok()),
                "zoom" if zoom.is_none() => zoom = Some(value.trim().parse::<u8>().ok()),
                "file" if file.is_none() => file = Some(value.into_owned()),
                "placemark" if placemark.is_none() => placemark = Some(value.into_owned()),
                _ => {}
            }
        }

        let lat = lat.flatten().filter(|v| v.is_finite())?;
        let lon = lon.flatten().filter(|v| v.is_finite())?;

        Some(Self {
            lat,
            lon,
            zoom: zoom.flatten(),
            file: file.filter(|f| !f.is_empty()),
            placemark: placemark.filter(|p| !p.is_empty()),
        })
    }

    /// Renders the link the list page produces for a placemark.
    #[must_use]
    pub fn to_link(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query
            .append_pair("lat", &self.lat.to_string())
            .append_pair("lon", &self.lon.to_string())
            .append_pair("zoom", &self.zoom_or(FOCUS_ZOOM).to_string());
        if let Some(file) = &self.file {
            query.append_pair("file", file);
        }
        if let Some(placemark) = &self.placemark {
            query.append_pair("placemark", placemark);
        }
        format!("{MAP_PAGE}?{}", query.finish())
    }

    /// True only when both the file and the placemark name are present.
    #[must_use]
    pub fn has_exact_target(&self) -> bool {
        self.file.as_deref().is_some_and(|f| !f.is_empty())
            && self.placemark.as_deref().is_some_and(|p| !p.is_empty())
    }

    /// The requested coordinate.
    #[must_use]
    pub const fn target(&self) -> LatLng {
        LatLng::new(self.lat, self.lon)
    }

    /// The requested zoom, or `default` when the link carries none.
    #[must_use]
    pub fn zoom_or(&self, default: u8) -> u8 {
        self.zoom.unwrap_or(default)
    }
}
