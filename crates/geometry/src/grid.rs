//! Imprecise grid input becomes the cell it denotes.
//!
//! A grid value written with N digits fewer than the system's full precision
//! stands for every position in `[v·10^N, (v+1)·10^N)` on that axis. The
//! resolver turns such input into the cell polygon; exact input stays a point.

use std::fmt;

use crs::{ConvertError, Converter, CrsId, GridAxis, pad_to_full};
use foundation::{Coord, Feature, GeoPoint, RawPair, RawToken, Shape};
use tracing::debug;

use crate::winding::{RingError, normalize_ring};

#[derive(Debug, Clone, PartialEq)]
pub enum ResolveError {
    Conversion(ConvertError),
    Ring(RingError),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::Conversion(e) => write!(f, "{e}"),
            ResolveError::Ring(e) => write!(f, "grid cell: {e}"),
        }
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResolveError::Conversion(e) => Some(e),
            ResolveError::Ring(e) => Some(e),
        }
    }
}

impl From<ConvertError> for ResolveError {
    fn from(e: ConvertError) -> Self {
        ResolveError::Conversion(e)
    }
}

impl From<RingError> for ResolveError {
    fn from(e: RingError) -> Self {
        ResolveError::Ring(e)
    }
}

/// Lower edge and extent of the interval a grid token denotes on one axis.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AxisSpan {
    pub start: f64,
    pub size: f64,
}

impl AxisSpan {
    pub fn of(axis: &GridAxis, token: &RawToken) -> Self {
        let digits = token.integer_digits();
        let missing = axis.full_digits.saturating_sub(digits);
        Self {
            start: pad_to_full(token.value(), digits, axis.full_digits),
            size: 10f64.powi(missing as i32),
        }
    }

    pub fn is_exact(&self) -> bool {
        self.size <= 1.0
    }
}

/// Turn a detected pair into a drawing-model feature.
///
/// Degrees and grid values with a full-precision northing give a point. Short
/// grid values give the closed, canonically wound cell ring. `verbatim` is stored as-is.
pub fn resolve(
    converter: &Converter<'_>,
    pair: &RawPair,
    crs: CrsId,
    verbatim: Option<&str>,
) -> Result<Feature, ResolveError> {
    let geometry = match &converter.registry().get(crs).grid {
        None => Shape::Point(converter.to_wgs84(pair.to_coord(), crs)?),
        Some(grid) if grid.is_exact(pair.north()) => {
            Shape::Point(converter.to_wgs84(pair.to_coord(), crs)?)
        }
        Some(grid) => {
            let north = AxisSpan::of(&grid.north, pair.north());
            let east = AxisSpan::of(&grid.east, pair.east());
            if north.is_exact() && east.is_exact() {
                Shape::Point(converter.to_wgs84(pair.to_coord(), crs)?)
            } else {
                debug!(
                    %crs,
                    north = north.start,
                    east = east.start,
                    cell_north = north.size,
                    cell_east = east.size,
                    "expanding short grid value to cell"
                );
                Shape::Polygon(vec![cell_ring(converter, crs, north, east)?])
            }
        }
    };

    let feature = Feature::new(geometry);
    Ok(match verbatim {
        Some(text) => feature.with_verbatim(text),
        None => feature,
    })
}

fn cell_ring(
    converter: &Converter<'_>,
    crs: CrsId,
    north: AxisSpan,
    east: AxisSpan,
) -> Result<Vec<GeoPoint>, ResolveError> {
    let (n0, e0) = (north.start, east.start);
    let (n1, e1) = (n0 + north.size, e0 + east.size);
    let corners = [
        Coord::new(n0, e0),
        Coord::new(n0, e1),
        Coord::new(n1, e1),
        Coord::new(n1, e0),
    ];
    let ring = corners
        .into_iter()
        .map(|c| converter.to_wgs84(c, crs))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(normalize_ring(&ring)?)
}
