//! Supported coordinate reference systems.
//!
//! The registry is built once at startup and handed out by reference. It owns
//! the parsed projection definitions so no caller ever re-parses a proj
//! string, and it is never mutated after construction.

use std::fmt;
use std::str::FromStr;

use foundation::{Coord, RawToken};
use proj4rs::Proj;
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CrsId {
    Wgs84,
    /// Finnish uniform grid, EPSG:2393.
    Ykj,
    /// Finnish UTM-based grid, EPSG:3067.
    EtrsTm35Fin,
}

impl CrsId {
    pub const ALL: [CrsId; 3] = [CrsId::Wgs84, CrsId::Ykj, CrsId::EtrsTm35Fin];

    pub fn epsg(self) -> u32 {
        match self {
            CrsId::Wgs84 => 4326,
            CrsId::Ykj => 2393,
            CrsId::EtrsTm35Fin => 3067,
        }
    }

    pub fn from_epsg(code: u32) -> Option<Self> {
        CrsId::ALL.into_iter().find(|c| c.epsg() == code)
    }

    pub fn name(self) -> &'static str {
        match self {
            CrsId::Wgs84 => "WGS84",
            CrsId::Ykj => "YKJ",
            CrsId::EtrsTm35Fin => "ETRS-TM35FIN",
        }
    }

    pub fn is_grid(self) -> bool {
        !matches!(self, CrsId::Wgs84)
    }

    /// URN form used in GeoJSON `crs.properties.name`.
    pub fn urn(self) -> String {
        format!("urn:ogc:def:crs:EPSG::{}", self.epsg())
    }

    /// Override token used after an ISO 6709 coordinate.
    pub fn iso6709_tag(self) -> String {
        format!("CRSEPSG:{}", self.epsg())
    }

    fn index(self) -> usize {
        match self {
            CrsId::Wgs84 => 0,
            CrsId::Ykj => 1,
            CrsId::EtrsTm35Fin => 2,
        }
    }
}

impl fmt::Display for CrsId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCrs(pub String);

impl fmt::Display for UnknownCrs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown CRS: {}", self.0)
    }
}

impl std::error::Error for UnknownCrs {}

impl FromStr for CrsId {
    type Err = UnknownCrs;

    /// Accepts display names (`ykj`, `etrs-tm35fin`, `wgs84`) and EPSG forms.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let by_name = CrsId::ALL
            .into_iter()
            .find(|c| c.name() == upper || c.name().replace('-', "") == upper);
        by_name
            .or_else(|| parse_epsg_code(&upper).and_then(CrsId::from_epsg))
            .ok_or_else(|| UnknownCrs(s.to_string()))
    }
}

/// One grid axis: how many integer digits mean full (1 unit) precision, the
/// range a value must fall into to be recognised as this grid, and the range
/// in which the projection is defined for conversion.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GridAxis {
    pub full_digits: usize,
    pub plausible: (f64, f64),
    pub domain: (f64, f64),
}

/// Digit conventions for a national grid, northing then easting.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GridConvention {
    pub north: GridAxis,
    pub east: GridAxis,
}

impl GridConvention {
    /// How many more digits the northing carries than the easting at full precision.
    pub fn digit_skew(&self) -> isize {
        self.north.full_digits as isize - self.east.full_digits as isize
    }

    /// A northing written with every digit makes the pair exact; the easting
    /// is then read by value, whatever its digit count (ETRS-TM35FIN eastings
    /// below 100 000 have five digits).
    pub fn is_exact(&self, north: &RawToken) -> bool {
        north.integer_digits() >= self.north.full_digits
    }
}

/// Geographic bounds used as the WGS84 conversion domain.
const WGS84_LAT_RANGE: (f64, f64) = (-90.0, 90.0);
const WGS84_LON_RANGE: (f64, f64) = (-180.0, 180.0);

pub struct CrsDescriptor {
    pub id: CrsId,
    pub proj_definition: &'static str,
    /// Textual forms recognised as an explicit reference to this CRS.
    pub tags: &'static [&'static str],
    /// `None` for degree-based systems; their input is always exact.
    pub grid: Option<GridConvention>,
    proj: Proj,
}

impl fmt::Debug for CrsDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrsDescriptor")
            .field("id", &self.id)
            .field("proj_definition", &self.proj_definition)
            .field("tags", &self.tags)
            .field("grid", &self.grid)
            .finish_non_exhaustive()
    }
}

impl CrsDescriptor {
    pub fn proj(&self) -> &Proj {
        &self.proj
    }

    pub fn is_geographic(&self) -> bool {
        self.grid.is_none()
    }

    /// Whether `c` (north, east) lies where this CRS's projection is usable.
    pub fn in_domain(&self, c: Coord) -> bool {
        if !c.is_finite() {
            return false;
        }
        let within = |v: f64, (lo, hi): (f64, f64)| v >= lo && v <= hi;
        match &self.grid {
            None => within(c.north, WGS84_LAT_RANGE) && within(c.east, WGS84_LON_RANGE),
            Some(g) => within(c.north, g.north.domain) && within(c.east, g.east.domain),
        }
    }
}

struct Definition {
    id: CrsId,
    proj: &'static str,
    tags: &'static [&'static str],
    grid: Option<GridConvention>,
}

// Plausible ranges follow the EPSG areas of use for Finland (mainland plus
// Åland and territorial waters), rounded outwards to whole 100 km / 10 km.
const DEFINITIONS: [Definition; 3] = [
    Definition {
        id: CrsId::Wgs84,
        proj: "+proj=longlat +datum=WGS84 +no_defs",
        tags: &[
            "EPSG:4326",
            "URN:OGC:DEF:CRS:EPSG::4326",
            "URN:OGC:DEF:CRS:OGC:1.3:CRS84",
            "OGC:CRS84",
            "CRSEPSG:4326",
        ],
        grid: None,
    },
    Definition {
        id: CrsId::Ykj,
        proj: "+proj=tmerc +lat_0=0 +lon_0=27 +k=1 +x_0=3500000 +y_0=0 +ellps=intl \
               +towgs84=-96.0617,-82.4278,-121.7535,4.80107,0.34543,-1.37646,1.4964 \
               +units=m +no_defs",
        tags: &["EPSG:2393", "URN:OGC:DEF:CRS:EPSG::2393", "CRSEPSG:2393"],
        grid: Some(GridConvention {
            north: GridAxis {
                full_digits: 7,
                plausible: (6_600_000.0, 7_800_000.0),
                domain: (5_500_000.0, 8_500_000.0),
            },
            east: GridAxis {
                full_digits: 7,
                plausible: (3_000_000.0, 3_800_000.0),
                domain: (2_500_000.0, 4_500_000.0),
            },
        }),
    },
    Definition {
        id: CrsId::EtrsTm35Fin,
        proj: "+proj=utm +zone=35 +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs",
        tags: &["EPSG:3067", "URN:OGC:DEF:CRS:EPSG::3067", "CRSEPSG:3067"],
        grid: Some(GridConvention {
            north: GridAxis {
                full_digits: 7,
                plausible: (6_600_000.0, 7_800_000.0),
                domain: (5_500_000.0, 8_500_000.0),
            },
            east: GridAxis {
                full_digits: 6,
                plausible: (20_000.0, 800_000.0),
                domain: (-500_000.0, 1_500_000.0),
            },
        }),
    },
];

#[derive(Debug)]
pub enum RegistryError {
    InvalidDefinition { crs: CrsId, reason: String },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::InvalidDefinition { crs, reason } => {
                write!(f, "invalid projection definition for {crs}: {reason}")
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// An explicit CRS reference found in input text, resolved against the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrsTag {
    pub raw: String,
    /// `None` when the text names a system this registry does not support.
    pub crs: Option<CrsId>,
}

#[derive(Debug)]
pub struct CrsRegistry {
    descriptors: Vec<CrsDescriptor>,
}

impl CrsRegistry {
    pub fn new() -> Result<Self, RegistryError> {
        let mut descriptors = Vec::with_capacity(DEFINITIONS.len());
        for def in &DEFINITIONS {
            let proj =
                Proj::from_proj_string(def.proj).map_err(|e| RegistryError::InvalidDefinition {
                    crs: def.id,
                    reason: format!("{e:?}"),
                })?;
            descriptors.push(CrsDescriptor {
                id: def.id,
                proj_definition: def.proj,
                tags: def.tags,
                grid: def.grid,
                proj,
            });
        }
        Ok(Self { descriptors })
    }

    pub fn get(&self, id: CrsId) -> &CrsDescriptor {
        &self.descriptors[id.index()]
    }

    /// Descriptors in detection order: WGS84 first, then the grids.
    pub fn iter(&self) -> impl Iterator<Item = &CrsDescriptor> {
        self.descriptors.iter()
    }

    /// Resolve an explicit tag such as `EPSG:3067`, `CRSEPSG:2393` or
    /// `urn:ogc:def:crs:EPSG:6.3:3067`.
    pub fn recognize_tag(&self, raw: &str) -> CrsTag {
        let upper = raw.trim().to_ascii_uppercase();
        let crs = self
            .descriptors
            .iter()
            .find(|d| d.tags.contains(&upper.as_str()))
            .map(|d| d.id)
            .or_else(|| parse_epsg_code(&upper).and_then(CrsId::from_epsg));
        CrsTag {
            raw: raw.trim().to_string(),
            crs,
        }
    }
}

/// Pull the numeric EPSG code out of the common textual forms.
fn parse_epsg_code(upper: &str) -> Option<u32> {
    if let Some(rest) = upper.strip_prefix("URN:OGC:DEF:CRS:EPSG:") {
        // Optional version segment: `EPSG::3067` or `EPSG:6.3:3067`.
        return rest.rsplit(':').next()?.parse().ok();
    }
    upper
        .strip_prefix("CRSEPSG:")
        .or_else(|| upper.strip_prefix("EPSG:"))
        .and_then(|code| code.trim().parse().ok())
}
