use serde::{Deserialize, Serialize};

use crate::coord::GeoPoint;

/// Axis-aligned planar box, used for extents in projected (metre) space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb2 {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Aabb2 {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Aabb2 { min, max }
    }

    pub fn from_points(points: impl IntoIterator<Item = [f64; 2]>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut out = Aabb2::new(first, first);
        for p in iter {
            out.extend(p);
        }
        Some(out)
    }

    pub fn extend(&mut self, p: [f64; 2]) {
        self.min = [self.min[0].min(p[0]), self.min[1].min(p[1])];
        self.max = [self.max[0].max(p[0]), self.max[1].max(p[1])];
    }

    pub fn width(&self) -> f64 {
        self.max[0] - self.min[0]
    }

    pub fn height(&self) -> f64 {
        self.max[1] - self.min[1]
    }

    pub fn center(&self) -> [f64; 2] {
        [
            (self.min[0] + self.max[0]) / 2.0,
            (self.min[1] + self.max[1]) / 2.0,
        ]
    }
}

/// WGS84 bounds in degrees (Leaflet `LatLngBounds`).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LatLngBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl LatLngBounds {
    pub fn from_point(p: GeoPoint) -> Self {
        Self {
            south: p.lat_deg,
            west: p.lon_deg,
            north: p.lat_deg,
            east: p.lon_deg,
        }
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a GeoPoint>) -> Option<Self> {
        let mut iter = points.into_iter();
        let mut out = Self::from_point(*iter.next()?);
        for p in iter {
            out.extend(*p);
        }
        Some(out)
    }

    pub fn extend(&mut self, p: GeoPoint) {
        self.south = self.south.min(p.lat_deg);
        self.west = self.west.min(p.lon_deg);
        self.north = self.north.max(p.lat_deg);
        self.east = self.east.max(p.lon_deg);
    }

    pub fn union(self, other: Self) -> Self {
        Self {
            south: self.south.min(other.south),
            west: self.west.min(other.west),
            north: self.north.max(other.north),
            east: self.east.max(other.east),
        }
    }

    pub fn contains(&self, other: &Self) -> bool {
        other.south >= self.south
            && other.west >= self.west
            && other.north <= self.north
            && other.east <= self.east
    }

    /// Contains `other` and is larger than it on at least one side.
    pub fn strictly_contains(&self, other: &Self) -> bool {
        self.contains(other) && self != other
    }

    pub fn corners(&self) -> [GeoPoint; 4] {
        [
            GeoPoint::new(self.west, self.south),
            GeoPoint::new(self.east, self.south),
            GeoPoint::new(self.east, self.north),
            GeoPoint::new(self.west, self.north),
        ]
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.west + self.east) / 2.0,
            (self.south + self.north) / 2.0,
        )
    }

    /// Grow each side by `ratio` of the span (Leaflet `LatLngBounds.pad`).
    pub fn pad(self, ratio: f64) -> Self {
        let dlat = (self.north - self.south) * ratio;
        let dlon = (self.east - self.west) * ratio;
        Self {
            south: self.south - dlat,
            west: self.west - dlon,
            north: self.north + dlat,
            east: self.east + dlon,
        }
    }
}
