//! Map widget abstraction.
//!
//! The core drives the map through [`MapWidget`] only: attaching and
//! detaching whole layers, moving the view and opening a marker popup.
//! Rendering is someone else's problem; [`HeadlessMap`] records the calls.

pub mod headless;

pub use headless::HeadlessMap;

use crate::models::{LatLng, LayerId, MarkerLayer, MarkerRef};

/// Mean Earth radius in meters (IUGG).
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// The operations the visibility core needs from a map.
pub trait MapWidget {
    /// Puts a layer's markers on the map.
    fn attach(&mut self, layer: &MarkerLayer);

    /// Removes a layer's markers from the map.
    fn detach(&mut self, layer: LayerId);

    /// Returns true if the layer is currently attached.
    fn is_attached(&self, layer: LayerId) -> bool;

    /// Current zoom level.
    fn current_zoom(&self) -> u8;

    /// Changes the zoom, keeping the center.
    fn set_zoom(&mut self, zoom: u8);

    /// Centers the view on `center` at `zoom`.
    fn set_view(&mut self, center: LatLng, zoom: u8);

    /// Opens the popup of a single marker.
    fn open_popup(&mut self, marker: MarkerRef);

    /// Great-circle distance between two points, in meters.
    fn distance(&self, a: LatLng, b: LatLng) -> f64 {
        haversine_m(a, b)
    }
}

/// Haversine distance in meters on a spherical Earth.
#[must_use]
pub fn haversine_m(a: LatLng, b: LatLng) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}
