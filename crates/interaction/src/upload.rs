//! Bulk coordinate upload: any supported format, any supported system.

use crs::{Converter, CrsId};
use formats::{Detected, Format, parse_any};
use foundation::{Feature, Shape};
use geometry::{normalize_geometry, resolve};
use tracing::{info, warn};

use crate::Failure;

/// Accepted upload, with what was detected for display.
#[derive(Debug, Clone, PartialEq)]
pub struct Uploaded {
    pub format: Format,
    pub crs: CrsId,
    pub features: Vec<Feature>,
}

impl Uploaded {
    pub fn format_name(&self) -> &'static str {
        self.format.name()
    }

    pub fn crs_name(&self) -> &'static str {
        self.crs.name()
    }
}

/// Parse (formats tried in [`Format::ALL`] order), detect, then build features.
///
/// Points go through the grid resolver, so short grid values become cells.
/// Lines and polygons are converted vertex by vertex; polygons are normalized.
pub fn upload(converter: &Converter<'_>, text: &str) -> Result<Uploaded, Failure> {
    let outcome = upload_inner(converter, text);
    match &outcome {
        Ok(uploaded) => info!(
            format = uploaded.format_name(),
            crs = uploaded.crs_name(),
            features = uploaded.features.len(),
            "coordinates uploaded"
        ),
        Err(e) => warn!(kind = ?e.kind(), error = %e, "coordinate upload rejected"),
    }
    outcome
}

fn upload_inner(converter: &Converter<'_>, text: &str) -> Result<Uploaded, Failure> {
    let parsed = parse_any(text, converter.registry())?;
    let format = parsed.format;
    let detected = parsed.detect(converter.registry())?;
    let crs = detected.first().map(|d| d.crs).unwrap_or(CrsId::Wgs84);

    let features = detected
        .iter()
        .map(|d| build_feature(converter, d))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Uploaded {
        format,
        crs,
        features,
    })
}

fn build_feature(converter: &Converter<'_>, detected: &Detected) -> Result<Feature, Failure> {
    let crs = detected.crs;
    match &detected.geometry {
        Shape::Point(pair) => {
            let verbatim = format!("{}:{}", pair.north().text(), pair.east().text());
            Ok(resolve(converter, pair, crs, Some(&verbatim))?)
        }
        shape => {
            let values = shape.map(|p| p.to_coord());
            let geometry = converter.geometry_to_wgs84(&values, crs)?;
            Ok(Feature::new(normalize_geometry(&geometry)?))
        }
    }
}
