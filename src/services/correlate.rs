//! Correlation resolver: finds the marker a deep link points at and
//! activates it (moves the view and opens its popup).
//!
//! Only layers currently attached to the map are searched, so a marker on a
//! hidden layer is never activated.

use serde::Serialize;
use tracing::{debug, info};

use crate::map::MapWidget;
use crate::models::{Coordinates, LatLng, MarkerLayer};
use crate::services::deep_link::DeepLink;
use crate::services::store::VisibilityStore;

/// A marker that was found and activated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Activation {
    /// File the marker belongs to
    pub file_id: String,
    /// Placemark name
    pub placemark: String,
    /// Placemark coordinate, absent for placemarks without one
    pub coordinates: Option<Coordinates>,
    /// Distance from the query point, for nearest matches
    pub distance_m: Option<f64>,
    /// Map zoom after activation
    pub zoom: u8,
}

/// How `resolve` found its marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Identical (file, placemark name) pair
    Exact,
    /// Closest marker within the radius
    Nearest,
}

/// Moves the view to the marker (raising zoom to at least `focus_zoom`) and
/// opens its popup. A marker without a coordinate only gets its popup.
fn activate<M: MapWidget>(
    map: &mut M,
    layer: &MarkerLayer,
    index: usize,
    distance_m: Option<f64>,
    focus_zoom: u8,
) -> Option<Activation> {
    let placemark = layer.markers().get(index)?;
    if let Some(pos) = placemark.position() {
        let zoom = map.current_zoom().max(focus_zoom);
        map.set_view(pos, zoom);
    }
    map.open_popup(layer.marker_ref(index));

    Some(Activation {
        file_id: layer.file_id().to_string(),
        placemark: placemark.name.clone(),
        coordinates: placemark.coordinates,
        distance_m,
        zoom: map.current_zoom(),
    })
}

/// Activates the first placemark named `placemark` in `file_id`'s layer.
///
/// Returns `None` if the file is unknown, not loaded, not attached, or has
/// no placemark with that exact name.
pub fn find_exact<M: MapWidget>(
    store: &VisibilityStore,
    map: &mut M,
    file_id: &str,
    placemark: &str,
    focus_zoom: u8,
) -> Option<Activation> {
    let layer = store.file(file_id)?.layer()?;
    if !map.is_attached(layer.id()) {
        debug!(file = file_id, "exact lookup skipped: layer not attached");
        return None;
    }

    let index = layer.markers().iter().position(|p| p.name == placemark)?;
    activate(map, layer, index, None, focus_zoom)
}

/// Activates the marker closest to `target` across every attached layer,
/// provided it lies within `max_meters`.
pub fn find_nearest<M: MapWidget>(
    store: &VisibilityStore,
    map: &mut M,
    target: LatLng,
    max_meters: f64,
    focus_zoom: u8,
) -> Option<Activation> {
    let mut best: Option<(&MarkerLayer, usize, f64)> = None;

    for layer in store.files().filter_map(|e| e.layer()) {
        if !map.is_attached(layer.id()) {
            continue;
        }
        for (index, placemark) in layer.markers().iter().enumerate() {
            let Some(pos) = placemark.position() else {
                continue;
            };
            let d = map.distance(target, pos);
            // Strict comparison: the first of equally distant markers wins
            if best.map_or(true, |(_, _, best_d)| d < best_d) {
                best = Some((layer, index, d));
            }
        }
    }

    let (layer, index, distance) = best?;
    if distance > max_meters {
        debug!(distance, max_meters, "nearest marker outside radius");
        return None;
    }
    activate(map, layer, index, Some(distance), focus_zoom)
}

/// Resolves a deep link: exact match first when the link names both a file
/// and a placemark, nearest within `radius_m` otherwise or as fallback.
pub fn resolve<M: MapWidget>(
    store: &VisibilityStore,
    map: &mut M,
    link: &DeepLink,
    radius_m: f64,
    focus_zoom: u8,
) -> Option<(MatchKind, Activation)> {
    if let (true, Some(file), Some(name)) = (
        link.has_exact_target(),
        link.file.as_deref(),
        link.placemark.as_deref(),
    ) {
        if let Some(found) = find_exact(store, map, file, name, focus_zoom) {
            info!(file, placemark = name, "activated exact match");
            return Some((MatchKind::Exact, found));
        }
        debug!(file, placemark = name, "no exact match, trying nearest");
    }

    let found = find_nearest(store, map, link.target(), radius_m, focus_zoom);
    match &found {
        Some(a) => info!(
            file = %a.file_id,
            placemark = %a.placemark,
            distance_m = a.distance_m.unwrap_or_default(),
            "activated nearest marker"
        ),
        None => info!(lat = link.lat, lon = link.lon, radius_m, "no marker found"),
    }
    found.map(|a| (MatchKind::Nearest, a))
}
