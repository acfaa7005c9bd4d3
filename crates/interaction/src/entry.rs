//! Manual coordinate entry: two text fields, north then east.

use crs::{Converter, CrsId, CrsTag, detect};
use foundation::{AxisOrder, Feature, RawPair, RawToken};
use formats::ParseError;
use geometry::resolve;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::Failure;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub north: String,
    pub east: String,
    /// Explicit system chosen by the user; skips magnitude detection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crs: Option<CrsId>,
}

impl Entry {
    pub fn new(north: impl Into<String>, east: impl Into<String>) -> Self {
        Self {
            north: north.into(),
            east: east.into(),
            crs: None,
        }
    }

    pub fn with_crs(mut self, crs: CrsId) -> Self {
        self.crs = Some(crs);
        self
    }

    /// Split pasted text such as `60.5:25.5`, `60.5,25.5` or `60.5 25.5`.
    /// A trailing `/` (ISO 6709 habit) is ignored.
    pub fn from_text(text: &str) -> Option<Self> {
        let text = text.trim();
        let text = text.strip_suffix('/').unwrap_or(text).trim();
        let (north, east) = text
            .split_once(':')
            .or_else(|| text.split_once(','))
            .or_else(|| text.split_once(char::is_whitespace))?;
        let (north, east) = (north.trim(), east.trim());
        if north.is_empty() || east.is_empty() {
            return None;
        }
        Some(Self::new(north, east))
    }

    /// What is stored on the feature as `coordinate_verbatim`.
    pub fn verbatim(&self) -> String {
        format!("{}:{}", self.north.trim(), self.east.trim())
    }

    fn raw_pair(&self) -> Result<RawPair, ParseError> {
        let token = |text: &str| {
            RawToken::parse(text).ok_or_else(|| ParseError::InvalidNumber {
                text: text.trim().to_string(),
            })
        };
        Ok(RawPair::new(
            token(&self.north)?,
            token(&self.east)?,
            AxisOrder::NorthFirst,
        ))
    }
}

/// Accepted entry: the system it was read in and the resulting feature.
#[derive(Debug, Clone, PartialEq)]
pub struct Submitted {
    pub crs: CrsId,
    pub feature: Feature,
}

pub fn submit(converter: &Converter<'_>, entry: &Entry) -> Result<Submitted, Failure> {
    let outcome = submit_inner(converter, entry);
    if let Err(e) = &outcome {
        warn!(entry = %entry.verbatim(), kind = ?e.kind(), error = %e, "coordinate entry rejected");
    }
    outcome
}

fn submit_inner(converter: &Converter<'_>, entry: &Entry) -> Result<Submitted, Failure> {
    let pair = entry.raw_pair()?;
    let tag = entry.crs.map(|crs| CrsTag {
        raw: crs.iso6709_tag(),
        crs: Some(crs),
    });
    let crs = detect(converter.registry(), &pair, tag.as_ref())?;
    let feature = resolve(converter, &pair, crs, Some(&entry.verbatim()))?;
    debug!(%crs, kind = ?feature.geometry.kind(), "coordinate entry accepted");
    Ok(Submitted { crs, feature })
}

/// Whether the submit action may be enabled for the current field contents.
pub fn can_submit(converter: &Converter<'_>, entry: &Entry) -> bool {
    submit_inner(converter, entry).is_ok()
}
