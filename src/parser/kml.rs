//! KML placemark extraction.
//!
//! Only the parts of KML the map uses are read: each `<Placemark>`'s first
//! `<name>`, first `<description>` and the first tuple of its first
//! `<coordinates>` element. Styles, folders and geometry types are ignored.

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;
use tracing::debug;

use crate::models::{Coordinates, Placemark};

/// Errors raised while parsing a KML document.
#[derive(Debug, Error)]
pub enum KmlError {
    /// The document is not well-formed XML.
    #[error("XML parse error at byte {position}: {source}")]
    Xml {
        /// Byte offset where the reader stopped
        position: usize,
        /// Underlying reader error
        #[source]
        source: quick_xml::Error,
    },
    /// The document is XML but structurally unusable.
    #[error("malformed KML: {0}")]
    Malformed(String),
}

/// Placemark child element whose text is being collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Description,
    Coordinates,
}

impl Field {
    fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"name" => Some(Self::Name),
            b"description" => Some(Self::Description),
            b"coordinates" => Some(Self::Coordinates),
            _ => None,
        }
    }
}

/// Fields gathered for the placemark currently open.
#[derive(Debug, Default)]
struct PlacemarkDraft {
    name: Option<String>,
    description: Option<String>,
    coordinates: Option<String>,
}

impl PlacemarkDraft {
    fn slot(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Name => &mut self.name,
            Field::Description => &mut self.description,
            Field::Coordinates => &mut self.coordinates,
        }
    }

    fn finish(self, ordinal: usize) -> Placemark {
        let name = self
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("Placemark {ordinal}"));
        let description = self
            .description
            .map(|d| d.trim().to_string())
            .unwrap_or_default();
        let coordinates = self.coordinates.as_deref().and_then(parse_coordinates);

        Placemark {
            name,
            description,
            coordinates,
        }
    }
}

/// Parses KML text into placemarks in document order.
///
/// `source_id` is only used for diagnostics.
///
/// # Examples
///
/// ```
/// use hazardmap::parser::parse_kml;
///
/// let kml = r#"<kml><Document><Placemark>
///   <name>Heliport</name>
///   <Point><coordinates>140.7288,41.7688,0</coordinates></Point>
/// </Placemark></Document></kml>"#;
///
/// let placemarks = parse_kml(kml, "ヘリ離発着").unwrap();
/// assert_eq!(placemarks[0].name, "Heliport");
/// assert_eq!(placemarks[0].coordinates.unwrap().latitude, 41.7688);
/// ```
pub fn parse_kml(text: &str, source_id: &str) -> Result<Vec<Placemark>, KmlError> {
    let mut reader = Reader::from_str(text);
    reader.trim_text(true);

    let mut placemarks = Vec::new();
    let mut draft: Option<PlacemarkDraft> = None;
    // Field being captured and the element depth it was opened at.
    let mut capture: Option<(Field, usize)> = None;
    let mut depth = 0usize;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                depth += 1;
                let tag = e.local_name();
                if tag.as_ref() == b"Placemark" {
                    if draft.is_some() {
                        return Err(KmlError::Malformed("nested <Placemark>".to_string()));
                    }
                    draft = Some(PlacemarkDraft::default());
                } else if let (Some(d), None) = (draft.as_mut(), capture) {
                    if let Some(field) = Field::from_tag(tag.as_ref()) {
                        let slot = d.slot(field);
                        if slot.is_none() {
                            *slot = Some(String::new());
                            capture = Some((field, depth));
                        }
                    }
                }
            }
            Ok(Event::Empty(ref e)) => {
                if e.local_name().as_ref() == b"Placemark" {
                    if draft.is_some() {
                        return Err(KmlError::Malformed("nested <Placemark>".to_string()));
                    }
                    // Still a placemark: unnamed and without a coordinate
                    let ordinal = placemarks.len() + 1;
                    placemarks.push(PlacemarkDraft::default().finish(ordinal));
                } else if let (Some(d), None) = (draft.as_mut(), capture) {
                    if let Some(field) = Field::from_tag(e.local_name().as_ref()) {
                        d.slot(field).get_or_insert_with(String::new);
                    }
                }
            }
            Ok(Event::Text(ref e)) => {
                if let (Some(d), Some((field, _))) = (draft.as_mut(), capture) {
                    let text = e.unescape().map_err(|source| KmlError::Xml {
                        position: reader.buffer_position(),
                        source,
                    })?;
                    append_text(d.slot(field), &text);
                }
            }
            Ok(Event::CData(ref e)) => {
                if let (Some(d), Some((field, _))) = (draft.as_mut(), capture) {
                    append_text(d.slot(field), &String::from_utf8_lossy(e));
                }
            }
            Ok(Event::End(ref e)) => {
                if matches!(capture, Some((_, open_depth)) if open_depth == depth) {
                    capture = None;
                }
                if e.local_name().as_ref() == b"Placemark" {
                    if let Some(d) = draft.take() {
                        placemarks.push(d.finish(placemarks.len() + 1));
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(source) => {
                return Err(KmlError::Xml {
                    position: reader.buffer_position(),
                    source,
                })
            }
            _ => {}
        }
        buf.clear();
    }

    if draft.is_some() {
        return Err(KmlError::Malformed(
            "document ended inside a <Placemark>".to_string(),
        ));
    }

    debug!(source = source_id, count = placemarks.len(), "parsed KML");
    Ok(placemarks)
}

/// Adjacent text and CDATA pieces concatenate with nothing in between.
fn append_text(slot: &mut Option<String>, text: &str) {
    if let Some(s) = slot {
        s.push_str(text);
    }
}

/// Parses the first `lon,lat[,alt]` tuple of a coordinates string.
///
/// Returns `None` when the tuple has fewer than two components or a
/// longitude/latitude that is not a number.
fn parse_coordinates(raw: &str) -> Option<Coordinates> {
    let first = raw.split_whitespace().next()?;
    let mut parts = first.split(',');

    let longitude = parts.next()?.trim().parse::<f64>().ok()?;
    let latitude = parts.next()?.trim().parse::<f64>().ok()?;
    let altitude = parts
        .next()
        .filter(|p| !p.trim().is_empty())
        .and_then(|p| p.trim().parse::<f64>().ok());

    if !longitude.is_finite() || !latitude.is_finite() {
        return None;
    }

    Some(Coordinates {
        latitude,
        longitude,
        altitude,
    })
}
