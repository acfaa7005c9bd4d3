//! CRS inference from explicit tags or from the magnitude of raw values.
//!
//! Detection depends only on the raw tokens and the tag. Full-precision grid
//! values are told apart by magnitude alone. Short values are told apart by
//! digit counts: YKJ writes both axes with the same number of digits,
//! ETRS-TM35FIN writes the easting with one digit fewer than the northing.

use std::fmt;

use foundation::{RawGeometry, RawPair, RawToken};
use tracing::debug;

use crate::registry::{CrsDescriptor, CrsId, CrsRegistry, CrsTag, GridAxis, GridConvention};

/// Shortest grid input accepted (a 10 km cell for 7-digit axes).
pub const MIN_GRID_DIGITS: usize = 3;

const MAX_LAT_DIGITS: usize = 2;
const MAX_LON_DIGITS: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub enum DetectError {
    /// An explicit tag names a system the registry does not support.
    UnsupportedCrs { tag: String },
    /// Values fall outside every known CRS's plausible range.
    OutOfRange { north: String, east: String },
    /// Vertices of one geometry classify as different systems.
    Inconsistent { first: CrsId, other: CrsId },
    Empty,
}

impl fmt::Display for DetectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectError::UnsupportedCrs { tag } => write!(f, "unsupported CRS: {tag}"),
            DetectError::OutOfRange { north, east } => {
                write!(f, "no known CRS matches coordinates {north}:{east}")
            }
            DetectError::Inconsistent { first, other } => {
                write!(f, "vertices mix coordinate systems ({first} and {other})")
            }
            DetectError::Empty => write!(f, "no coordinates to detect"),
        }
    }
}

impl std::error::Error for DetectError {}

/// Classify one raw pair. An explicit tag wins without looking at magnitude.
pub fn detect(
    registry: &CrsRegistry,
    pair: &RawPair,
    tag: Option<&CrsTag>,
) -> Result<CrsId, DetectError> {
    if let Some(tag) = tag {
        return explicit(tag);
    }
    let found = registry
        .iter()
        .find(|d| accepts_magnitude(d, pair))
        .map(|d| d.id);
    debug!(
        north = pair.north().text(),
        east = pair.east().text(),
        crs = ?found,
        "magnitude detection"
    );
    found.ok_or_else(|| DetectError::OutOfRange {
        north: pair.north().text().to_string(),
        east: pair.east().text().to_string(),
    })
}

/// Classify a whole geometry; every vertex must agree.
pub fn detect_geometry(
    registry: &CrsRegistry,
    geometry: &RawGeometry,
    tag: Option<&CrsTag>,
) -> Result<CrsId, DetectError> {
    if let Some(tag) = tag {
        return explicit(tag);
    }
    let mut vertices = geometry.vertices();
    let first = detect(registry, vertices.next().ok_or(DetectError::Empty)?, None)?;
    for pair in vertices {
        let other = detect(registry, pair, None)?;
        if other != first {
            return Err(DetectError::Inconsistent { first, other });
        }
    }
    Ok(first)
}

fn explicit(tag: &CrsTag) -> Result<CrsId, DetectError> {
    tag.crs.ok_or_else(|| DetectError::UnsupportedCrs {
        tag: tag.raw.clone(),
    })
}

/// Whether the pair's magnitude and digit counts fit this CRS.
pub fn accepts_magnitude(descriptor: &CrsDescriptor, pair: &RawPair) -> bool {
    match &descriptor.grid {
        None => accepts_degrees(pair),
        Some(grid) => accepts_grid(grid, pair),
    }
}

fn accepts_degrees(pair: &RawPair) -> bool {
    let (lat, lon) = (pair.north(), pair.east());
    lat.integer_digits() <= MAX_LAT_DIGITS
        && lat.value().abs() <= 90.0
        && lon.integer_digits() <= MAX_LON_DIGITS
        && lon.value().abs() <= 180.0
}

fn accepts_grid(grid: &GridConvention, pair: &RawPair) -> bool {
    let (north, east) = (pair.north(), pair.east());
    if grid.is_exact(north) {
        return within(north.value(), grid.north.plausible)
            && within(east.value(), grid.east.plausible);
    }
    let skew = north.integer_digits() as isize - east.integer_digits() as isize;
    skew == grid.digit_skew() && axis_accepts(&grid.north, north) && axis_accepts(&grid.east, east)
}

fn axis_accepts(axis: &GridAxis, token: &RawToken) -> bool {
    let digits = token.integer_digits();
    if digits < MIN_GRID_DIGITS || digits > axis.full_digits {
        return false;
    }
    // Decimals only make sense once the unit digit is present.
    if token.has_fraction() && digits != axis.full_digits {
        return false;
    }
    within(pad_to_full(token.value().abs(), digits, axis.full_digits), axis.plausible)
}

fn within(v: f64, (lo, hi): (f64, f64)) -> bool {
    v >= lo && v < hi
}

/// Scale a short grid value up to full digit count (`666` -> `6660000`).
pub fn pad_to_full(value: f64, digits: usize, full_digits: usize) -> f64 {
    let missing = full_digits.saturating_sub(digits);
    value * 10f64.powi(missing as i32)
}

#[cfg(test)]
mod tests {
    use super::{DetectError, detect, detect_geometry, pad_to_full};
    use crate::registry::{CrsId, CrsRegistry};
    use foundation::{AxisOrder, RawPair, RawToken, Shape};

    fn pair(north: &str, east: &str) -> RawPair {
        RawPair::parse_north_east(north, east).expect("pair")
    }

    fn detect_pair(north: &str, east: &str) -> Result<CrsId, DetectError> {
        let registry = CrsRegistry::new().expect("registry");
        detect(&registry, &pair(north, east), None)
    }

    #[test]
    fn classifies_by_magnitude() {
        assert_eq!(detect_pair("6666666", "3333333"), Ok(CrsId::Ykj));
        assert_eq!(detect_pair("6666666", "333333"), Ok(CrsId::EtrsTm35Fin));
        assert_eq!(detect_pair("60.5", "25.5"), Ok(CrsId::Wgs84));
        assert_eq!(detect_pair("-33.9", "-151.2"), Ok(CrsId::Wgs84));
        assert!(matches!(
            detect_pair("1231231231", "123092834"),
            Err(DetectError::OutOfRange { .. })
        ));
    }

    #[test]
    fn short_grid_values_keep_their_system() {
        assert_eq!(detect_pair("666666", "333333"), Ok(CrsId::Ykj));
        assert_eq!(detect_pair("666", "333"), Ok(CrsId::Ykj));
        assert_eq!(detect_pair("666666", "33333"), Ok(CrsId::EtrsTm35Fin));
        assert_eq!(detect_pair("6666666.5", "3333333.25"), Ok(CrsId::Ykj));
        // Two digits read as degrees; decimals on a partial grid value are rejected.
        assert_eq!(detect_pair("66", "33"), Ok(CrsId::Wgs84));
        assert!(detect_pair("666666.5", "333333").is_err());
    }

    #[test]
    fn full_precision_eastings_are_read_by_value() {
        // Western Åland: a five-digit ETRS-TM35FIN easting.
        assert_eq!(detect_pair("6710726", "66259"), Ok(CrsId::EtrsTm35Fin));
        assert_eq!(detect_pair("6700000", "65000"), Ok(CrsId::EtrsTm35Fin));
        assert_eq!(detect_pair("6700000.5", "65000.25"), Ok(CrsId::EtrsTm35Fin));
        // Below the plausible easting, whatever the digit count.
        assert!(detect_pair("6700000", "9999").is_err());
        assert!(detect_pair("6666666", "333").is_err());
    }

    #[test]
    fn grid_values_outside_finland_are_rejected() {
        // Right digit counts but south of the grid's plausible northing.
        assert!(detect_pair("5000000", "3333333").is_err());
        // YKJ easting must start near the 3 500 000 false easting.
        assert!(detect_pair("6666666", "4333333").is_err());
    }

    #[test]
    fn detection_ignores_axis_order_of_the_source() {
        let registry = CrsRegistry::new().expect("registry");
        let east_first = RawPair::new(
            RawToken::parse("333333").expect("token"),
            RawToken::parse("6666666").expect("token"),
            AxisOrder::EastFirst,
        );
        assert_eq!(detect(&registry, &east_first, None), Ok(CrsId::EtrsTm35Fin));
    }

    #[test]
    fn explicit_tag_wins_over_magnitude() {
        let registry = CrsRegistry::new().expect("registry");
        let tag = registry.recognize_tag("EPSG:3067");
        assert_eq!(
            detect(&registry, &pair("6666666", "3333333"), Some(&tag)),
            Ok(CrsId::EtrsTm35Fin)
        );

        let unknown = registry.recognize_tag("EPSG:3857");
        assert_eq!(
            detect(&registry, &pair("60.5", "25.5"), Some(&unknown)),
            Err(DetectError::UnsupportedCrs {
                tag: "EPSG:3857".to_string()
            })
        );
    }

    #[test]
    fn geometry_vertices_must_agree() {
        let registry = CrsRegistry::new().expect("registry");
        let line = Shape::LineString(vec![pair("6666666", "3333333"), pair("6666700", "3333400")]);
        assert_eq!(detect_geometry(&registry, &line, None), Ok(CrsId::Ykj));

        let mixed = Shape::LineString(vec![pair("6666666", "3333333"), pair("60.1", "24.1")]);
        assert_eq!(
            detect_geometry(&registry, &mixed, None),
            Err(DetectError::Inconsistent {
                first: CrsId::Ykj,
                other: CrsId::Wgs84
            })
        );
    }

    #[test]
    fn pads_short_values() {
        assert_eq!(pad_to_full(666.0, 3, 7), 6_660_000.0);
        assert_eq!(pad_to_full(6_666_666.0, 7, 7), 6_666_666.0);
    }
}
