pub mod geojson;
pub mod iso6709;
pub mod wkt;

use std::fmt;
use std::str::FromStr;

use crs::{CrsId, CrsRegistry, CrsTag, DetectError, detect_geometry};
use foundation::{AxisOrder, CrsGeometry, RawGeometry, ShapeKind};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Supported coordinate text formats, in upload trial order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Format {
    GeoJson,
    Iso6709,
    Wkt,
}

impl Format {
    pub const ALL: [Format; 3] = [Format::GeoJson, Format::Iso6709, Format::Wkt];

    pub fn name(self) -> &'static str {
        match self {
            Format::GeoJson => "GeoJSON",
            Format::Iso6709 => "ISO 6709",
            Format::Wkt => "WKT",
        }
    }

    pub fn axis_order(self) -> AxisOrder {
        match self {
            Format::Iso6709 => AxisOrder::NorthFirst,
            Format::GeoJson | Format::Wkt => AxisOrder::EastFirst,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace([' ', '-', '_'], "").as_str() {
            "geojson" | "json" => Ok(Format::GeoJson),
            "iso6709" | "iso" => Ok(Format::Iso6709),
            "wkt" => Ok(Format::Wkt),
            other => Err(format!("unknown format: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    Empty,
    /// A single value that is not a plain decimal number.
    InvalidNumber { text: String },
    Malformed { format: Format, reason: String },
    /// Upload tried every format; one error per attempt, in trial order.
    NoFormatMatched(Vec<ParseError>),
}

impl ParseError {
    pub(crate) fn malformed(format: Format, reason: impl Into<String>) -> Self {
        ParseError::Malformed {
            format,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Empty => write!(f, "no coordinates in input"),
            ParseError::InvalidNumber { text } => write!(f, "not a decimal number: {text:?}"),
            ParseError::Malformed { format, reason } => write!(f, "invalid {format}: {reason}"),
            ParseError::NoFormatMatched(attempts) => {
                write!(f, "input matches no supported format")?;
                for attempt in attempts {
                    write!(f, "; {attempt}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug, Clone, PartialEq)]
pub enum SerializeError {
    /// The format has no way to write this shape faithfully.
    Unrepresentable {
        format: Format,
        kind: ShapeKind,
        reason: &'static str,
    },
}

impl fmt::Display for SerializeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerializeError::Unrepresentable {
                format,
                kind,
                reason,
            } => write!(f, "cannot write {kind:?} as {format}: {reason}"),
        }
    }
}

impl std::error::Error for SerializeError {}

/// Parser output: raw geometries plus any explicit CRS reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedText {
    pub format: Format,
    pub geometries: Vec<RawGeometry>,
    pub crs_tag: Option<CrsTag>,
}

/// Raw geometry with CRS and source format resolved. Never re-inferred.
#[derive(Debug, Clone, PartialEq)]
pub struct Detected {
    pub format: Format,
    pub crs: CrsId,
    pub geometry: RawGeometry,
}

impl ParsedText {
    /// Resolve one CRS for the whole text; geometries may not disagree.
    pub fn detect(self, registry: &CrsRegistry) -> Result<Vec<Detected>, DetectError> {
        let mut resolved: Option<CrsId> = None;
        for geometry in &self.geometries {
            let crs = detect_geometry(registry, geometry, self.crs_tag.as_ref())?;
            match resolved {
                Some(first) if first != crs => {
                    return Err(DetectError::Inconsistent { first, other: crs });
                }
                _ => resolved = Some(crs),
            }
        }
        let crs = resolved.ok_or(DetectError::Empty)?;
        debug!(format = %self.format, %crs, count = self.geometries.len(), "detected input");
        let format = self.format;
        Ok(self
            .geometries
            .into_iter()
            .map(|geometry| Detected {
                format,
                crs,
                geometry,
            })
            .collect())
    }
}

pub fn parse(text: &str, format: Format, registry: &CrsRegistry) -> Result<ParsedText, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    let parsed = match format {
        Format::GeoJson => geojson::parse(text, registry)?,
        Format::Iso6709 => iso6709::parse(text, registry)?,
        Format::Wkt => wkt::parse(text)?,
    };
    if parsed.geometries.is_empty() {
        return Err(ParseError::Empty);
    }
    Ok(parsed)
}

/// Try each format in [`Format::ALL`] order; the first that parses wins.
pub fn parse_any(text: &str, registry: &CrsRegistry) -> Result<ParsedText, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::Empty);
    }
    let mut attempts = Vec::with_capacity(Format::ALL.len());
    for format in Format::ALL {
        match parse(text, format, registry) {
            Ok(parsed) => return Ok(parsed),
            Err(e) => {
                debug!(%format, error = %e, "format attempt failed");
                attempts.push(e);
            }
        }
    }
    Err(ParseError::NoFormatMatched(attempts))
}

/// Write geometries whose vertices are (north, east) values in `crs`.
///
/// Fails rather than write text that would parse back as a different shape.
pub fn serialize(
    geometries: &[CrsGeometry],
    format: Format,
    crs: CrsId,
) -> Result<String, SerializeError> {
    match format {
        Format::GeoJson => Ok(geojson::serialize(geometries, crs)),
        Format::Iso6709 => iso6709::serialize(geometries, crs),
        Format::Wkt => Ok(wkt::serialize(geometries)),
    }
}

/// Plain decimal text for a coordinate value; never exponent notation.
pub(crate) fn format_number(v: f64) -> String {
    format!("{v}")
}

/// Close check on raw rings: the first vertex repeated as the last.
pub(crate) fn ring_is_closed(ring: &[foundation::RawPair]) -> bool {
    match (ring.first(), ring.last()) {
        (Some(a), Some(b)) => a.to_coord() == b.to_coord(),
        _ => false,
    }
}

/// Build the shape a list of vertices denotes in the line-based formats:
/// one vertex is a point, a closed run of four or more is a polygon.
pub(crate) fn shape_from_vertices(
    vertices: Vec<foundation::RawPair>,
) -> Option<RawGeometry> {
    match vertices.len() {
        0 => None,
        1 => vertices.into_iter().next().map(foundation::Shape::Point),
        n if n >= 4 && ring_is_closed(&vertices) => {
            Some(foundation::Shape::Polygon(vec![vertices]))
        }
        _ => Some(foundation::Shape::LineString(vertices)),
    }
}
