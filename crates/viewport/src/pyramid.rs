use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};
use std::fmt;
use std::fs;
use std::path::Path;

use crs::{ConvertError, Converter, CrsId};
use foundation::{Aabb2, Coord, GeoPoint};
use serde::{Deserialize, Serialize};

pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Latitude where the square web-mercator world ends.
pub const WEB_MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_59;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TilePyramid {
    /// ETRS-TM35FIN tile matrix.
    National,
    /// Web-mercator tiles.
    Global,
}

impl TilePyramid {
    pub fn name(self) -> &'static str {
        match self {
            TilePyramid::National => "national",
            TilePyramid::Global => "global",
        }
    }
}

impl fmt::Display for TilePyramid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for TilePyramid {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "national" => Ok(TilePyramid::National),
            "global" => Ok(TilePyramid::Global),
            other => Err(format!("unknown tile pyramid: {other}")),
        }
    }
}

/// Planar space in which a pyramid's resolutions are measured.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanarProjection {
    Crs(CrsId),
    WebMercator,
}

impl PlanarProjection {
    /// Drawing-model position to planar `[x, y]` metres.
    pub fn project(&self, converter: &Converter<'_>, p: GeoPoint) -> Result<[f64; 2], ConvertError> {
        match self {
            PlanarProjection::Crs(crs) => {
                let c = converter.from_wgs84(p, *crs)?;
                Ok([c.east, c.north])
            }
            PlanarProjection::WebMercator => {
                let lat = p
                    .lat_deg
                    .clamp(-WEB_MERCATOR_MAX_LAT, WEB_MERCATOR_MAX_LAT);
                let x = EARTH_RADIUS * p.lon_deg.to_radians();
                let y = EARTH_RADIUS * (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
                Ok([x, y])
            }
        }
    }

    pub fn unproject(&self, converter: &Converter<'_>, xy: [f64; 2]) -> Result<GeoPoint, ConvertError> {
        match self {
            PlanarProjection::Crs(crs) => converter.to_wgs84(Coord::new(xy[1], xy[0]), *crs),
            PlanarProjection::WebMercator => {
                let lon = (xy[0] / EARTH_RADIUS).to_degrees();
                let lat = (2.0 * (xy[1] / EARTH_RADIUS).exp().atan() - FRAC_PI_2).to_degrees();
                Ok(GeoPoint::new(lon, lat))
            }
        }
    }

    /// Planar area in which [`unproject`](Self::unproject) is defined.
    pub fn extent(&self, converter: &Converter<'_>) -> Aabb2 {
        match self {
            PlanarProjection::Crs(crs) => match &converter.registry().get(*crs).grid {
                Some(grid) => Aabb2::new(
                    [grid.east.domain.0, grid.north.domain.0],
                    [grid.east.domain.1, grid.north.domain.1],
                ),
                None => Aabb2::new([-180.0, -90.0], [180.0, 90.0]),
            },
            PlanarProjection::WebMercator => {
                let world = PI * EARTH_RADIUS;
                Aabb2::new([-world, -world], [world, world])
            }
        }
    }

    /// Pull a planar position onto the nearest point of [`extent`](Self::extent).
    pub fn clamp(&self, converter: &Converter<'_>, [x, y]: [f64; 2]) -> [f64; 2] {
        let e = self.extent(converter);
        [x.clamp(e.min[0], e.max[0]), y.clamp(e.min[1], e.max[1])]
    }
}

/// Zoom parameters of one tile pyramid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PyramidConfig {
    /// `real = normalized + offset`.
    pub offset: i32,
    /// `None` lets real zoom go negative.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_real_zoom: Option<i32>,
    pub max_real_zoom: i32,
    /// Metres per pixel at real zoom 0; halves with each level.
    pub base_resolution: f64,
    pub projection: PlanarProjection,
}

impl PyramidConfig {
    pub fn national() -> Self {
        Self {
            offset: 0,
            min_real_zoom: Some(0),
            max_real_zoom: 15,
            base_resolution: 8192.0,
            projection: PlanarProjection::Crs(CrsId::EtrsTm35Fin),
        }
    }

    pub fn global() -> Self {
        Self {
            offset: 3,
            min_real_zoom: None,
            max_real_zoom: 19,
            base_resolution: 156_543.033_928_040_97,
            projection: PlanarProjection::WebMercator,
        }
    }

    pub fn clamp_real(&self, real: i32) -> i32 {
        let real = real.min(self.max_real_zoom);
        match self.min_real_zoom {
            Some(min) => real.max(min),
            None => real,
        }
    }

    pub fn contains_real(&self, real: i32) -> bool {
        self.clamp_real(real) == real
    }

    pub fn resolution(&self, real: i32) -> f64 {
        self.base_resolution / 2f64.powi(real)
    }

    fn validate(&self, pyramid: TilePyramid) -> Result<(), PyramidConfigError> {
        let invalid = |reason: String| PyramidConfigError::Invalid { pyramid, reason };
        if !(self.base_resolution.is_finite() && self.base_resolution > 0.0) {
            return Err(invalid(format!(
                "base_resolution must be positive, got {}",
                self.base_resolution
            )));
        }
        if let Some(min) = self.min_real_zoom
            && min > self.max_real_zoom
        {
            return Err(invalid(format!(
                "min_real_zoom {min} exceeds max_real_zoom {}",
                self.max_real_zoom
            )));
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum PyramidConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid { pyramid: TilePyramid, reason: String },
}

impl fmt::Display for PyramidConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PyramidConfigError::Io(err) => write!(f, "I/O error: {err}"),
            PyramidConfigError::Parse(err) => write!(f, "Pyramid config parse error: {err}"),
            PyramidConfigError::Invalid { pyramid, reason } => {
                write!(f, "Invalid {pyramid} pyramid config: {reason}")
            }
        }
    }
}

impl std::error::Error for PyramidConfigError {}

/// Both pyramids the widget can switch between.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PyramidSet {
    #[serde(default = "PyramidConfig::national")]
    pub national: PyramidConfig,
    #[serde(default = "PyramidConfig::global")]
    pub global: PyramidConfig,
}

impl Default for PyramidSet {
    fn default() -> Self {
        Self {
            national: PyramidConfig::national(),
            global: PyramidConfig::global(),
        }
    }
}

impl PyramidSet {
    pub fn get(&self, pyramid: TilePyramid) -> &PyramidConfig {
        match pyramid {
            TilePyramid::National => &self.national,
            TilePyramid::Global => &self.global,
        }
    }

    /// Missing pyramids keep their defaults.
    pub fn from_json(payload: &str) -> Result<Self, PyramidConfigError> {
        let set: PyramidSet = serde_json::from_str(payload).map_err(PyramidConfigError::Parse)?;
        set.national.validate(TilePyramid::National)?;
        set.global.validate(TilePyramid::Global)?;
        Ok(set)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, PyramidConfigError> {
        let payload = fs::read_to_string(path).map_err(PyramidConfigError::Io)?;
        Self::from_json(&payload)
    }
}
