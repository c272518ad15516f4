//! Marker layers built from a loaded data file.

use crate::models::{Placemark, RgbColor};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque identity of a marker layer, stable for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerId(Uuid);

impl LayerId {
    /// Generates a new unique layer id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Visual style shared by every marker of a layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerStyle {
    /// Material Symbols icon name
    pub icon: String,
    /// Marker background color
    pub color: RgbColor,
}

/// Reference to a single marker: its layer and its position in source order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerRef {
    /// Owning layer
    pub layer: LayerId,
    /// Index into the layer's markers
    pub index: usize,
}

/// The map-side representation of one data file: its placemarks as markers.
///
/// A layer is exclusively owned by its file entry in the visibility store;
/// the map widget only ever sees it by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerLayer {
    id: LayerId,
    file_id: String,
    style: MarkerStyle,
    markers: Vec<Placemark>,
}

impl MarkerLayer {
    /// Builds a layer for `file_id` from parsed placemarks.
    pub fn new(file_id: impl Into<String>, style: MarkerStyle, markers: Vec<Placemark>) -> Self {
        Self {
            id: LayerId::generate(),
            file_id: file_id.into(),
            style,
            markers,
        }
    }

    /// Returns the layer id.
    #[must_use]
    pub const fn id(&self) -> LayerId {
        self.id
    }

    /// Returns the source file id.
    #[must_use]
    pub fn file_id(&self) -> &str {
        &self.file_id
    }

    /// Returns the marker style.
    #[must_use]
    pub const fn style(&self) -> &MarkerStyle {
        &self.style
    }

    /// Returns the markers in source order.
    #[must_use]
    pub fn markers(&self) -> &[Placemark] {
        &self.markers
    }

    /// Returns a reference to the marker at `index`.
    #[must_use]
    pub const fn marker_ref(&self, index: usize) -> MarkerRef {
        MarkerRef {
            layer: self.id,
            index,
        }
    }
}
