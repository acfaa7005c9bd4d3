//! Canonical ring orientation.
//!
//! Orientation is measured in lat-lng axis space (x = latitude,
//! y = longitude). Canonical exterior rings are clockwise there, which is
//! counter-clockwise in GeoJSON lon/lat order. Holes run the other way.

use std::fmt;

use foundation::math::StableF64;
use foundation::{GeoPoint, Geometry, Shape};

/// Rings with less doubled area than this (square degrees) count as flat.
pub const AREA_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
pub enum RingError {
    TooFewVertices { distinct: usize },
    ZeroArea,
    /// A polygon with no rings at all.
    MissingExterior,
}

impl fmt::Display for RingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RingError::TooFewVertices { distinct } => {
                write!(f, "ring has {distinct} distinct vertices, need at least 3")
            }
            RingError::ZeroArea => write!(f, "ring encloses no area"),
            RingError::MissingExterior => write!(f, "polygon has no exterior ring"),
        }
    }
}

impl std::error::Error for RingError {}

/// Shoelace sum `Σ (x₂ − x₁)(y₂ + y₁)` with x = latitude, y = longitude.
///
/// Positive means clockwise. The closing edge is included whether or not the
/// ring repeats its first vertex.
pub fn signed_area(ring: &[GeoPoint]) -> f64 {
    if ring.len() < 2 {
        return 0.0;
    }
    ring.iter()
        .zip(ring.iter().cycle().skip(1))
        .map(|(a, b)| (b.lat_deg - a.lat_deg) * (b.lon_deg + a.lon_deg))
        .sum()
}

pub fn is_clockwise(ring: &[GeoPoint]) -> bool {
    signed_area(ring) > 0.0
}

/// Close the ring and put it in canonical orientation, keeping its start vertex.
pub fn normalize_ring(ring: &[GeoPoint]) -> Result<Vec<GeoPoint>, RingError> {
    let open = open_ring(ring);

    let distinct = distinct_vertices(open);
    if distinct < 3 {
        return Err(RingError::TooFewVertices { distinct });
    }

    let area = signed_area(open);
    if area.abs() <= AREA_EPSILON {
        return Err(RingError::ZeroArea);
    }

    let mut closed = Vec::with_capacity(open.len() + 1);
    closed.extend_from_slice(open);
    closed.push(open[0]);
    if area < 0.0 {
        closed.reverse();
    }
    Ok(closed)
}

/// Exterior ring canonical, every hole opposite.
pub fn normalize_polygon(rings: &[Vec<GeoPoint>]) -> Result<Vec<Vec<GeoPoint>>, RingError> {
    if rings.is_empty() {
        return Err(RingError::MissingExterior);
    }
    rings
        .iter()
        .enumerate()
        .map(|(i, ring)| {
            let mut ring = normalize_ring(ring)?;
            if i > 0 {
                ring.reverse();
            }
            Ok(ring)
        })
        .collect()
}

/// Points and lines pass through untouched.
pub fn normalize_geometry(geometry: &Geometry) -> Result<Geometry, RingError> {
    match geometry {
        Shape::Polygon(rings) => normalize_polygon(rings).map(Shape::Polygon),
        other => Ok(other.clone()),
    }
}

fn open_ring(ring: &[GeoPoint]) -> &[GeoPoint] {
    match ring {
        [first, .., last] if first == last => &ring[..ring.len() - 1],
        _ => ring,
    }
}

fn distinct_vertices(ring: &[GeoPoint]) -> usize {
    let mut keys: Vec<(StableF64, StableF64)> = ring
        .iter()
        .map(|p| (StableF64(p.lat_deg), StableF64(p.lon_deg)))
        .collect();
    keys.sort();
    keys.dedup();
    keys.len()
}
