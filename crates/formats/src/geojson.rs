//! GeoJSON reader/writer.
//!
//! Accepts a `FeatureCollection`, a `Feature` or a bare geometry. Positions are
//! longitude/easting first. An explicit CRS is read from the legacy top-level
//! `crs.properties.name` member; without it the CRS is inferred from magnitude.

use crs::{CrsId, CrsRegistry, CrsTag};
use foundation::{AxisOrder, CrsGeometry, RawGeometry, RawPair, RawToken, Shape};
use serde_json::{Map, Value};

use crate::{Format, ParseError, ParsedText, ring_is_closed};

pub fn parse(payload: &str, registry: &CrsRegistry) -> Result<ParsedText, ParseError> {
    let value: Value = serde_json::from_str(payload)
        .map_err(|e| malformed(format!("JSON parse error: {e}")))?;
    let obj = value
        .as_object()
        .ok_or_else(|| malformed("top level must be an object"))?;

    let crs_tag = parse_crs_member(obj, registry)?;
    let ty = type_of(obj)?;

    let mut geometries = Vec::new();
    match ty {
        "FeatureCollection" => {
            let features = obj
                .get("features")
                .and_then(|v| v.as_array())
                .ok_or_else(|| malformed("FeatureCollection missing features"))?;
            for (index, feature) in features.iter().enumerate() {
                parse_feature(feature, &mut geometries)
                    .map_err(|reason| malformed(format!("feature {index}: {reason}")))?;
            }
        }
        "Feature" => parse_feature(&value, &mut geometries).map_err(malformed)?,
        _ => parse_geometry(&value, &mut geometries).map_err(malformed)?,
    }

    Ok(ParsedText {
        format: Format::GeoJson,
        geometries,
        crs_tag,
    })
}

fn malformed(reason: impl Into<String>) -> ParseError {
    ParseError::malformed(Format::GeoJson, reason)
}

fn type_of(obj: &Map<String, Value>) -> Result<&str, ParseError> {
    obj.get("type")
        .and_then(|v| v.as_str())
        .ok_or_else(|| malformed("object missing type"))
}

fn parse_crs_member(
    obj: &Map<String, Value>,
    registry: &CrsRegistry,
) -> Result<Option<CrsTag>, ParseError> {
    let Some(crs) = obj.get("crs") else {
        return Ok(None);
    };
    if crs.is_null() {
        return Ok(None);
    }
    let name = crs
        .get("properties")
        .and_then(|p| p.get("name"))
        .and_then(|n| n.as_str())
        .ok_or_else(|| malformed("crs member missing properties.name"))?;
    Ok(Some(registry.recognize_tag(name)))
}

fn parse_feature(value: &Value, out: &mut Vec<RawGeometry>) -> Result<(), String> {
    let obj = value
        .as_object()
        .ok_or("feature must be an object".to_string())?;
    let ty = obj
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or("feature missing type".to_string())?;
    if ty != "Feature" {
        return Err(format!("unexpected feature type: {ty}"));
    }
    let geometry = obj
        .get("geometry")
        .filter(|g| !g.is_null())
        .ok_or("feature missing geometry".to_string())?;
    parse_geometry(geometry, out)
}

/// Append the geometry's parts; multi-geometries are flattened.
fn parse_geometry(value: &Value, out: &mut Vec<RawGeometry>) -> Result<(), String> {
    let obj = value
        .as_object()
        .ok_or("geometry must be an object".to_string())?;
    let ty = obj
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or("geometry missing type".to_string())?;

    if ty == "GeometryCollection" {
        let members = obj
            .get("geometries")
            .and_then(|v| v.as_array())
            .ok_or("GeometryCollection missing geometries".to_string())?;
        for member in members {
            parse_geometry(member, out)?;
        }
        return Ok(());
    }

    let coords = obj
        .get("coordinates")
        .ok_or("geometry missing coordinates".to_string())?;

    match ty {
        "Point" => out.push(Shape::Point(parse_position(coords)?)),
        "MultiPoint" => out.extend(parse_positions(coords)?.into_iter().map(Shape::Point)),
        "LineString" => out.push(Shape::LineString(parse_line(coords)?)),
        "MultiLineString" => {
            for line in as_array(coords, "MultiLineString")? {
                out.push(Shape::LineString(parse_line(line)?));
            }
        }
        "Polygon" => out.push(Shape::Polygon(parse_polygon(coords)?)),
        "MultiPolygon" => {
            for poly in as_array(coords, "MultiPolygon")? {
                out.push(Shape::Polygon(parse_polygon(poly)?));
            }
        }
        other => return Err(format!("unsupported geometry type: {other}")),
    }
    Ok(())
}

fn as_array<'a>(value: &'a Value, what: &str) -> Result<&'a Vec<Value>, String> {
    value
        .as_array()
        .ok_or_else(|| format!("{what} coordinates must be an array"))
}

fn parse_position(coords: &Value) -> Result<RawPair, String> {
    let arr = as_array(coords, "position")?;
    // A third value (altitude) is tolerated and ignored.
    if !(2..=3).contains(&arr.len()) {
        return Err(format!("position must have 2 values, got {}", arr.len()));
    }
    let token = |v: &Value| {
        v.as_f64()
            .map(RawToken::from_number)
            .ok_or_else(|| format!("coordinate must be a number, got {v}"))
    };
    Ok(RawPair::new(
        token(&arr[0])?,
        token(&arr[1])?,
        AxisOrder::EastFirst,
    ))
}

fn parse_positions(coords: &Value) -> Result<Vec<RawPair>, String> {
    as_array(coords, "position list")?
        .iter()
        .map(parse_position)
        .collect()
}

fn parse_line(coords: &Value) -> Result<Vec<RawPair>, String> {
    let line = parse_positions(coords)?;
    if line.len() < 2 {
        return Err("LineString needs at least 2 positions".to_string());
    }
    Ok(line)
}

fn parse_polygon(coords: &Value) -> Result<Vec<Vec<RawPair>>, String> {
    let rings = as_array(coords, "Polygon")?;
    if rings.is_empty() {
        return Err("Polygon needs an exterior ring".to_string());
    }
    let mut out = Vec::with_capacity(rings.len());
    for ring in rings {
        let ring = parse_positions(ring)?;
        if ring.len() < 4 || !ring_is_closed(&ring) {
            return Err("Polygon rings must be closed with at least 4 positions".to_string());
        }
        out.push(ring);
    }
    Ok(out)
}

/// Emit a FeatureCollection; grid systems carry a `crs` member.
pub fn serialize(geometries: &[CrsGeometry], crs: CrsId) -> String {
    let mut root = Map::new();
    root.insert(
        "type".to_string(),
        Value::String("FeatureCollection".to_string()),
    );
    if crs.is_grid() {
        let mut props = Map::new();
        props.insert("name".to_string(), Value::String(crs.urn()));
        let mut member = Map::new();
        member.insert("type".to_string(), Value::String("name".to_string()));
        member.insert("properties".to_string(), Value::Object(props));
        root.insert("crs".to_string(), Value::Object(member));
    }

    let features = geometries
        .iter()
        .map(|g| {
            let mut fobj = Map::new();
            fobj.insert("type".to_string(), Value::String("Feature".to_string()));
            fobj.insert("properties".to_string(), Value::Object(Map::new()));
            fobj.insert("geometry".to_string(), geometry_to_value(g));
            Value::Object(fobj)
        })
        .collect();
    root.insert("features".to_string(), Value::Array(features));

    Value::Object(root).to_string()
}

fn geometry_to_value(geom: &CrsGeometry) -> Value {
    let (ty, coords) = match geom {
        Shape::Point(c) => ("Point", position(c)),
        Shape::LineString(cs) => ("LineString", Value::Array(cs.iter().map(position).collect())),
        Shape::Polygon(rings) => (
            "Polygon",
            Value::Array(
                rings
                    .iter()
                    .map(|ring| Value::Array(ring.iter().map(position).collect()))
                    .collect(),
            ),
        ),
    };
    let mut obj = Map::new();
    obj.insert("type".to_string(), Value::String(ty.to_string()));
    obj.insert("coordinates".to_string(), coords);
    Value::Object(obj)
}

fn position(c: &foundation::Coord) -> Value {
    Value::Array(vec![number(c.east), number(c.north)])
}

/// Whole values are written as JSON integers so grid output reads `3333333`.
fn number(v: f64) -> Value {
    if v.fract() == 0.0 && v.abs() < 9.0e15 {
        Value::from(v as i64)
    } else {
        Value::from(v)
    }
}
