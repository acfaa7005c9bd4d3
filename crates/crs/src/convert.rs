use std::fmt;

use foundation::math::{round_degrees, round_grid_units};
use foundation::{Coord, CrsGeometry, GeoPoint, Geometry};
use proj4rs::transform::transform;

use crate::registry::{CrsDescriptor, CrsId, CrsRegistry};

#[derive(Debug, Clone, PartialEq)]
pub enum ConvertError {
    /// The value has no meaningful position in `crs`.
    OutOfDomain { crs: CrsId, north: f64, east: f64 },
    Projection {
        from: CrsId,
        to: CrsId,
        reason: String,
    },
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertError::OutOfDomain { crs, north, east } => {
                write!(f, "{north}:{east} is outside the valid area of {crs}")
            }
            ConvertError::Projection { from, to, reason } => {
                write!(f, "projection from {from} to {to} failed: {reason}")
            }
        }
    }
}

impl std::error::Error for ConvertError {}

/// Pure numeric transform between registry CRSs.
///
/// Interface order is always (north, east) of the source CRS to (north, east)
/// of the target CRS; latitude counts as north. Results are rounded to six
/// decimals for degrees and whole units for grids.
#[derive(Debug, Copy, Clone)]
pub struct Converter<'r> {
    registry: &'r CrsRegistry,
}

impl<'r> Converter<'r> {
    pub fn new(registry: &'r CrsRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r CrsRegistry {
        self.registry
    }

    pub fn convert(&self, c: Coord, from: CrsId, to: CrsId) -> Result<Coord, ConvertError> {
        let src = self.registry.get(from);
        let dst = self.registry.get(to);
        check_domain(src, c)?;

        let out = if from == to {
            c
        } else {
            project(src, dst, c)?
        };

        check_domain(dst, out)?;
        Ok(round_for(dst, out))
    }

    pub fn convert_ring(
        &self,
        ring: &[Coord],
        from: CrsId,
        to: CrsId,
    ) -> Result<Vec<Coord>, ConvertError> {
        ring.iter().map(|c| self.convert(*c, from, to)).collect()
    }

    pub fn convert_shape(
        &self,
        shape: &CrsGeometry,
        from: CrsId,
        to: CrsId,
    ) -> Result<CrsGeometry, ConvertError> {
        shape.try_map(|c| self.convert(*c, from, to))
    }

    pub fn to_wgs84(&self, c: Coord, from: CrsId) -> Result<GeoPoint, ConvertError> {
        self.convert(c, from, CrsId::Wgs84).map(GeoPoint::from_coord)
    }

    pub fn from_wgs84(&self, p: GeoPoint, to: CrsId) -> Result<Coord, ConvertError> {
        self.convert(p.to_coord(), CrsId::Wgs84, to)
    }

    /// Drawing-model geometry into `to`, vertex by vertex.
    pub fn geometry_to(&self, geometry: &Geometry, to: CrsId) -> Result<CrsGeometry, ConvertError> {
        geometry.try_map(|p| self.from_wgs84(*p, to))
    }

    /// CRS geometry into the drawing model.
    pub fn geometry_to_wgs84(
        &self,
        shape: &CrsGeometry,
        from: CrsId,
    ) -> Result<Geometry, ConvertError> {
        shape.try_map(|c| self.to_wgs84(*c, from))
    }
}

fn check_domain(descriptor: &CrsDescriptor, c: Coord) -> Result<(), ConvertError> {
    if descriptor.in_domain(c) {
        Ok(())
    } else {
        Err(ConvertError::OutOfDomain {
            crs: descriptor.id,
            north: c.north,
            east: c.east,
        })
    }
}

fn project(src: &CrsDescriptor, dst: &CrsDescriptor, c: Coord) -> Result<Coord, ConvertError> {
    // proj4rs works in (x, y) with geographic values in radians.
    let mut point = if src.is_geographic() {
        (c.east.to_radians(), c.north.to_radians(), 0.0)
    } else {
        (c.east, c.north, 0.0)
    };
    transform(src.proj(), dst.proj(), &mut point).map_err(|e| ConvertError::Projection {
        from: src.id,
        to: dst.id,
        reason: format!("{e:?}"),
    })?;

    Ok(if dst.is_geographic() {
        Coord::new(point.1.to_degrees(), point.0.to_degrees())
    } else {
        Coord::new(point.1, point.0)
    })
}

fn round_for(descriptor: &CrsDescriptor, c: Coord) -> Coord {
    if descriptor.is_geographic() {
        Coord::new(round_degrees(c.north), round_degrees(c.east))
    } else {
        Coord::new(round_grid_units(c.north), round_grid_units(c.east))
    }
}
