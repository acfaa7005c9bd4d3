//! Copy-out: drawing-model geometry as text in any system and format.

use crs::{Converter, CrsId};
use formats::{Format, serialize};
use foundation::{CrsGeometry, Geometry};
use tracing::debug;

use crate::Failure;

pub fn copy(
    converter: &Converter<'_>,
    geometry: &Geometry,
    crs: CrsId,
    format: Format,
) -> Result<String, Failure> {
    copy_all(converter, std::slice::from_ref(geometry), crs, format)
}

/// Several geometries in one text, one per line (one collection for GeoJSON).
pub fn copy_all(
    converter: &Converter<'_>,
    geometries: &[Geometry],
    crs: CrsId,
    format: Format,
) -> Result<String, Failure> {
    let converted = geometries
        .iter()
        .map(|g| converter.geometry_to(g, crs))
        .collect::<Result<Vec<CrsGeometry>, _>>()?;
    debug!(%crs, %format, count = converted.len(), "copying geometries");
    Ok(serialize(&converted, format, crs)?)
}
