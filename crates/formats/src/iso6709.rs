//! ISO 6709-style coordinate strings: `<lat>:<lng>/` per vertex.
//!
//! One geometry per line. A `CRSEPSG:<code>` override may follow the last
//! slash or stand alone on its own line; both forms apply to the whole text.

use crs::{CrsId, CrsRegistry, CrsTag};
use foundation::{AxisOrder, CrsGeometry, RawPair, RawToken, Shape};

use crate::{Format, ParseError, ParsedText, SerializeError, format_number, shape_from_vertices};

const TAG_PREFIX: &str = "CRSEPSG:";

pub fn parse(text: &str, registry: &CrsRegistry) -> Result<ParsedText, ParseError> {
    let mut geometries = Vec::new();
    let mut crs_tag: Option<CrsTag> = None;

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        let (coords, tag) = split_tag(line.trim())
            .map_err(|reason| malformed(format!("line {line_no}: {reason}")))?;

        if let Some(raw) = tag {
            let tag = registry.recognize_tag(raw);
            if let Some(existing) = &crs_tag
                && existing.crs != tag.crs
            {
                return Err(malformed(format!(
                    "line {line_no}: conflicting CRS override {raw}"
                )));
            }
            crs_tag = Some(tag);
        }

        if coords.is_empty() {
            continue;
        }
        let vertices = parse_vertices(coords)
            .map_err(|reason| malformed(format!("line {line_no}: {reason}")))?;
        let shape = shape_from_vertices(vertices)
            .ok_or_else(|| malformed(format!("line {line_no}: no coordinates")))?;
        geometries.push(shape);
    }

    Ok(ParsedText {
        format: Format::Iso6709,
        geometries,
        crs_tag,
    })
}

fn malformed(reason: impl Into<String>) -> ParseError {
    ParseError::malformed(Format::Iso6709, reason)
}

/// Split a trimmed line into its coordinate part and an optional override token.
fn split_tag(line: &str) -> Result<(&str, Option<&str>), String> {
    let upper = line.to_ascii_uppercase();
    let Some(pos) = upper.find(TAG_PREFIX) else {
        return Ok((line, None));
    };
    let coords = line[..pos].trim_end();
    if !coords.is_empty() && !coords.ends_with('/') {
        return Err("CRS override must follow a '/'".to_string());
    }
    let tag = line[pos..].trim();
    let code = &tag[TAG_PREFIX.len()..];
    if code.is_empty() || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("malformed CRS override: {tag}"));
    }
    Ok((coords, Some(tag)))
}

fn parse_vertices(coords: &str) -> Result<Vec<RawPair>, String> {
    let Some(body) = coords.strip_suffix('/') else {
        return Err("each coordinate must end with '/'".to_string());
    };
    body.split('/')
        .map(|vertex| {
            let vertex = vertex.trim();
            let (lat, lng) = vertex
                .split_once(':')
                .ok_or_else(|| format!("expected <lat>:<lng>, got {vertex:?}"))?;
            let lat = RawToken::parse(lat).ok_or_else(|| format!("invalid number {lat:?}"))?;
            let lng = RawToken::parse(lng).ok_or_else(|| format!("invalid number {lng:?}"))?;
            Ok(RawPair::new(lat, lng, AxisOrder::NorthFirst))
        })
        .collect()
}

/// One line per geometry; grids get a trailing override line.
///
/// A line holds one vertex run, so polygon holes cannot be written, and a
/// closed run of four or more vertices always reads back as a polygon.
pub fn serialize(geometries: &[CrsGeometry], crs: CrsId) -> Result<String, SerializeError> {
    let mut lines = geometries
        .iter()
        .map(|g| match g {
            Shape::Point(c) => Ok(vertex(c)),
            Shape::LineString(cs) if cs.len() >= 4 && cs.first() == cs.last() => {
                Err(unrepresentable(g, "a closed line reads back as a polygon"))
            }
            Shape::LineString(cs) => Ok(cs.iter().map(vertex).collect()),
            Shape::Polygon(rings) if rings.len() > 1 => {
                Err(unrepresentable(g, "polygon holes have no notation"))
            }
            Shape::Polygon(rings) => Ok(rings
                .first()
                .map(|ring| ring.iter().map(vertex).collect())
                .unwrap_or_default()),
        })
        .collect::<Result<Vec<String>, _>>()?;
    if crs.is_grid() {
        lines.push(crs.iso6709_tag());
    }
    Ok(lines.join("\n"))
}

fn unrepresentable(g: &CrsGeometry, reason: &'static str) -> SerializeError {
    SerializeError::Unrepresentable {
        format: Format::Iso6709,
        kind: g.kind(),
        reason,
    }
}

fn vertex(c: &foundation::Coord) -> String {
    format!("{}:{}/", format_number(c.north), format_number(c.east))
}
