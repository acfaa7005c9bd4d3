//! Well-known text for the simple geometry types.
//!
//! WKT carries no CRS reference, so detection always falls back to magnitude.
//! Positions are `x y` (east first); a third ordinate is accepted and dropped.
//! Multi-geometries are flattened into their parts, like GeoJSON input.

use foundation::{AxisOrder, Coord, CrsGeometry, RawGeometry, RawPair, RawToken, Shape};

use crate::{Format, ParseError, ParsedText, format_number, ring_is_closed};

pub fn parse(text: &str) -> Result<ParsedText, ParseError> {
    let mut geometries = Vec::new();
    let mut rest = text.trim_start();

    while !rest.is_empty() {
        let keyword_end = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        let keyword = rest[..keyword_end].to_ascii_uppercase();
        if keyword.is_empty() {
            return Err(malformed("expected a geometry keyword"));
        }

        let mut after = rest[keyword_end..].trim_start();
        if let Some(stripped) = after.strip_prefix(['Z', 'z']) {
            after = stripped.trim_start();
        }
        if !after.starts_with('(') {
            return Err(malformed(format!("{keyword} must be followed by '('")));
        }
        let close = matching_paren(after).map_err(malformed)?;
        let body = &after[1..close];
        geometries.extend(build(&keyword, body).map_err(malformed)?);

        rest = after[close + 1..].trim_start();
    }

    Ok(ParsedText {
        format: Format::Wkt,
        geometries,
        crs_tag: None,
    })
}

fn malformed(reason: impl Into<String>) -> ParseError {
    ParseError::malformed(Format::Wkt, reason)
}

fn build(keyword: &str, body: &str) -> Result<Vec<RawGeometry>, String> {
    match keyword {
        "POINT" => Ok(vec![Shape::Point(position(body)?)]),
        "LINESTRING" => Ok(vec![Shape::LineString(line(body)?)]),
        "POLYGON" => Ok(vec![Shape::Polygon(polygon(body)?)]),
        "MULTIPOINT" => split_top_level(body)?
            .into_iter()
            .map(|part| {
                // Both `MULTIPOINT(1 2, 3 4)` and `MULTIPOINT((1 2), (3 4))` occur.
                let part = part.trim();
                let inner = if part.starts_with('(') {
                    strip_parens(part)?
                } else {
                    part
                };
                position(inner).map(Shape::Point)
            })
            .collect(),
        "MULTILINESTRING" => split_top_level(body)?
            .into_iter()
            .map(|part| line(strip_parens(part)?).map(Shape::LineString))
            .collect(),
        "MULTIPOLYGON" => split_top_level(body)?
            .into_iter()
            .map(|part| polygon(strip_parens(part)?).map(Shape::Polygon))
            .collect(),
        other => Err(format!("unsupported geometry type {other}")),
    }
}

fn position(text: &str) -> Result<RawPair, String> {
    let parts: Vec<&str> = text.split_whitespace().collect();
    if !(2..=3).contains(&parts.len()) {
        return Err(format!("position must have 2 or 3 numbers, got {:?}", text.trim()));
    }
    let token = |s: &str| RawToken::parse(s).ok_or_else(|| format!("invalid number {s:?}"));
    Ok(RawPair::new(
        token(parts[0])?,
        token(parts[1])?,
        AxisOrder::EastFirst,
    ))
}

fn positions(body: &str) -> Result<Vec<RawPair>, String> {
    split_top_level(body)?.into_iter().map(position).collect()
}

fn line(body: &str) -> Result<Vec<RawPair>, String> {
    let vertices = positions(body)?;
    if vertices.len() < 2 {
        return Err("LINESTRING needs at least 2 positions".to_string());
    }
    Ok(vertices)
}

fn polygon(body: &str) -> Result<Vec<Vec<RawPair>>, String> {
    split_top_level(body)?
        .into_iter()
        .map(|part| {
            let ring = positions(strip_parens(part)?)?;
            if ring.len() < 4 || !ring_is_closed(&ring) {
                return Err("polygon rings must be closed with at least 4 positions".to_string());
            }
            Ok(ring)
        })
        .collect()
}

/// Byte index of the `)` closing the `(` that starts `text`.
fn matching_paren(text: &str) -> Result<usize, String> {
    let mut depth = 0usize;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| "unbalanced parentheses".to_string())?;
                if depth == 0 {
                    return Ok(i);
                }
            }
            _ => {}
        }
    }
    Err("unbalanced parentheses".to_string())
}

fn strip_parens(text: &str) -> Result<&str, String> {
    let text = text.trim();
    text.strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .ok_or_else(|| format!("expected parenthesised list, got {text:?}"))
}

/// Split on commas that are not nested inside parentheses.
fn split_top_level(body: &str) -> Result<Vec<&str>, String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in body.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| "unbalanced parentheses".to_string())?;
            }
            ',' if depth == 0 => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&body[start..]);
    if parts.iter().any(|p| p.trim().is_empty()) {
        return Err("empty list element".to_string());
    }
    Ok(parts)
}

/// One geometry per line, `x y` order.
pub fn serialize(geometries: &[CrsGeometry]) -> String {
    geometries
        .iter()
        .map(|g| match g {
            Shape::Point(c) => format!("POINT({})", pos(c)),
            Shape::LineString(cs) => format!("LINESTRING({})", list(cs)),
            Shape::Polygon(rings) => {
                let rings: Vec<String> = rings.iter().map(|r| format!("({})", list(r))).collect();
                format!("POLYGON({})", rings.join(", "))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn pos(c: &Coord) -> String {
    format!("{} {}", format_number(c.east), format_number(c.north))
}

fn list(cs: &[Coord]) -> String {
    cs.iter().map(pos).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::{parse, serialize};
    use crate::ParseError;
    use foundation::{Coord, Shape, ShapeKind};
    use pretty_assertions::assert_eq;

    #[test]
    fn reads_simple_types_case_insensitively() {
        let parsed = parse(
            "point (25.5 60.5)\nLINESTRING(24 60, 25 61)\nPolygon((24 60, 25 60, 25 61, 24 60))",
        )
        .expect("parse");
        let kinds: Vec<ShapeKind> = parsed.geometries.iter().map(|g| g.kind()).collect();
        assert_eq!(
            kinds,
            [ShapeKind::Point, ShapeKind::LineString, ShapeKind::Polygon]
        );
        assert_eq!(parsed.crs_tag, None);
        let Shape::Point(p) = &parsed.geometries[0] else {
            panic!("expected point");
        };
        // x is east.
        assert_eq!(p.to_coord(), Coord::new(60.5, 25.5));
    }

    #[test]
    fn keeps_polygon_holes_and_flattens_multi_types() {
        let parsed = parse(
            "POLYGON((0 0, 10 0, 10 10, 0 10, 0 0), (2 2, 2 4, 4 4, 2 2))\n\
             MULTIPOINT((1 2), (3 4))\n\
             MULTIPOINT(1 2, 3 4)\n\
             MULTIPOLYGON(((0 0, 1 0, 1 1, 0 0)), ((5 5, 6 5, 6 6, 5 5)))",
        )
        .expect("parse");
        assert_eq!(parsed.geometries.len(), 7);
        let Shape::Polygon(rings) = &parsed.geometries[0] else {
            panic!("expected polygon");
        };
        assert_eq!(rings.len(), 2);
    }

    #[test]
    fn accepts_a_third_ordinate() {
        let parsed = parse("POINT Z (25.5 60.5 12)").expect("parse");
        assert_eq!(parsed.geometries.len(), 1);
    }

    #[test]
    fn rejects_malformed_text() {
        for bad in [
            "POINT(25.5)",
            "POINT(25.5 60.5",
            "POINT EMPTY",
            "CIRCLE(1 2)",
            "LINESTRING(1 2)",
            "POLYGON((0 0, 1 0, 1 1, 0 1))",
            "POINT(1,5 2)",
            "60.5:25.5/",
        ] {
            assert!(
                matches!(parse(bad), Err(ParseError::Malformed { .. })),
                "{bad:?} should fail"
            );
        }
    }

    #[test]
    fn writes_east_first() {
        let geometries = [
            Shape::Point(Coord::new(6_666_666.0, 3_333_333.0)),
            Shape::LineString(vec![Coord::new(60.0, 24.0), Coord::new(61.0, 25.5)]),
        ];
        assert_eq!(
            serialize(&geometries),
            "POINT(3333333 6666666)\nLINESTRING(24 60, 25.5 61)"
        );
    }
}
