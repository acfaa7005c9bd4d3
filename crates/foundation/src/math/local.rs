use super::{Ecef, Geodetic, ecef_to_geodetic, geodetic_to_ecef};
use crate::coord::GeoPoint;

/// Local East-North-Up coordinates (meters).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Enu {
    pub east: f64,
    pub north: f64,
    pub up: f64,
}

impl Enu {
    pub fn new(east: f64, north: f64, up: f64) -> Self {
        Self { east, north, up }
    }
}

pub fn ecef_to_enu(point: Ecef, origin: Geodetic) -> Enu {
    let origin_ecef = geodetic_to_ecef(origin);
    let dx = point.x - origin_ecef.x;
    let dy = point.y - origin_ecef.y;
    let dz = point.z - origin_ecef.z;

    let sin_lat = origin.lat_rad.sin();
    let cos_lat = origin.lat_rad.cos();
    let sin_lon = origin.lon_rad.sin();
    let cos_lon = origin.lon_rad.cos();

    let east = -sin_lon * dx + cos_lon * dy;
    let north = -sin_lat * cos_lon * dx - sin_lat * sin_lon * dy + cos_lat * dz;
    let up = cos_lat * cos_lon * dx + cos_lat * sin_lon * dy + sin_lat * dz;

    Enu::new(east, north, up)
}

pub fn enu_to_ecef(enu: Enu, origin: Geodetic) -> Ecef {
    let origin_ecef = geodetic_to_ecef(origin);

    let sin_lat = origin.lat_rad.sin();
    let cos_lat = origin.lat_rad.cos();
    let sin_lon = origin.lon_rad.sin();
    let cos_lon = origin.lon_rad.cos();

    let dx = -sin_lon * enu.east - sin_lat * cos_lon * enu.north + cos_lat * cos_lon * enu.up;
    let dy = cos_lon * enu.east - sin_lat * sin_lon * enu.north + cos_lat * sin_lon * enu.up;
    let dz = cos_lat * enu.north + sin_lat * enu.up;

    Ecef::new(origin_ecef.x + dx, origin_ecef.y + dy, origin_ecef.z + dz)
}

/// Point reached by moving `east_m`/`north_m` in the tangent plane at `origin`.
///
/// Used for programmatic shapes (circles) whose size is given in metres. The
/// tangent-plane approximation is fine for the sub-100 km radii drawn on a map.
pub fn offset_geo_point(origin: GeoPoint, east_m: f64, north_m: f64) -> GeoPoint {
    let origin = Geodetic::from_geo_point(origin);
    let ecef = enu_to_ecef(Enu::new(east_m, north_m, 0.0), origin);
    ecef_to_geodetic(ecef).to_geo_point()
}

/// Tangent-plane offset of `point` as seen from `origin`.
pub fn enu_offset(origin: GeoPoint, point: GeoPoint) -> Enu {
    let ecef = geodetic_to_ecef(Geodetic::from_geo_point(point));
    ecef_to_enu(ecef, Geodetic::from_geo_point(origin))
}
