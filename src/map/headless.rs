//! In-memory map used by the CLI and tests.

use std::collections::HashSet;

use tracing::trace;

use super::MapWidget;
use crate::constants::{DEFAULT_CENTER, DEFAULT_ZOOM};
use crate::models::{LatLng, LayerId, MarkerLayer, MarkerRef};

/// A map with no rendering that tracks attached layers, view and popup.
#[derive(Debug, Clone)]
pub struct HeadlessMap {
    attached: HashSet<LayerId>,
    center: LatLng,
    zoom: u8,
    popup: Option<MarkerRef>,
    attach_calls: usize,
    detach_calls: usize,
}

impl Default for HeadlessMap {
    fn default() -> Self {
        Self::new(LatLng::new(DEFAULT_CENTER.0, DEFAULT_CENTER.1), DEFAULT_ZOOM)
    }
}

impl HeadlessMap {
    /// Creates a map with the given initial view.
    #[must_use]
    pub fn new(center: LatLng, zoom: u8) -> Self {
        Self {
            attached: HashSet::new(),
            center,
            zoom,
            popup: None,
            attach_calls: 0,
            detach_calls: 0,
        }
    }

    /// Current view center.
    #[must_use]
    pub const fn center(&self) -> LatLng {
        self.center
    }

    /// The open popup, if any.
    #[must_use]
    pub const fn popup(&self) -> Option<MarkerRef> {
        self.popup
    }

    /// Number of attached layers.
    #[must_use]
    pub fn attached_count(&self) -> usize {
        self.attached.len()
    }

    /// Total `attach` calls made so far.
    #[must_use]
    pub const fn attach_calls(&self) -> usize {
        self.attach_calls
    }

    /// Total `detach` calls made so far.
    #[must_use]
    pub const fn detach_calls(&self) -> usize {
        self.detach_calls
    }
}

impl MapWidget for HeadlessMap {
    fn attach(&mut self, layer: &MarkerLayer) {
        trace!(layer = %layer.id(), file = layer.file_id(), "attach");
        self.attach_calls += 1;
        self.attached.insert(layer.id());
    }

    fn detach(&mut self, layer: LayerId) {
        trace!(layer = %layer, "detach");
        self.detach_calls += 1;
        self.attached.remove(&layer);
        if self.popup.is_some_and(|p| p.layer == layer) {
            self.popup = None;
        }
    }

    fn is_attached(&self, layer: LayerId) -> bool {
        self.attached.contains(&layer)
    }

    fn current_zoom(&self) -> u8 {
        self.zoom
    }

    fn set_zoom(&mut self, zoom: u8) {
        self.zoom = zoom;
    }

    fn set_view(&mut self, center: LatLng, zoom: u8) {
        self.center = center;
        self.zoom = zoom;
    }

    fn open_popup(&mut self, marker: MarkerRef) {
        self.popup = Some(marker);
    }
}
