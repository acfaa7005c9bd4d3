//! Real zoom belongs to a tile pyramid; normalized zoom does not.
//!
//! `normalized = real - offset`. Real zoom is clamped to the pyramid's range,
//! normalized zoom is whatever that clamped real zoom maps back to.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::pyramid::{PyramidConfig, PyramidSet, TilePyramid};

pub fn get_normalized(real: i32, config: &PyramidConfig) -> i32 {
    real - config.offset
}

pub fn get_real(normalized: i32, config: &PyramidConfig) -> i32 {
    config.clamp_real(normalized + config.offset)
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoomPair {
    pub real: i32,
    pub normalized: i32,
}

impl ZoomPair {
    pub fn from_real(real: i32, config: &PyramidConfig) -> Self {
        let real = config.clamp_real(real);
        Self {
            real,
            normalized: get_normalized(real, config),
        }
    }

    pub fn from_normalized(normalized: i32, config: &PyramidConfig) -> Self {
        Self::from_real(get_real(normalized, config), config)
    }
}

/// Active pyramid and zoom, owned by the caller.
///
/// Besides the current pair it remembers the normalized zoom last asked for,
/// so a clamp on one pyramid is undone when switching back to the other.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoomState {
    pyramid: TilePyramid,
    zoom: ZoomPair,
    requested_normalized: i32,
}

impl ZoomState {
    pub fn new(pyramid: TilePyramid, normalized: i32, pyramids: &PyramidSet) -> Self {
        Self {
            pyramid,
            zoom: ZoomPair::from_normalized(normalized, pyramids.get(pyramid)),
            requested_normalized: normalized,
        }
    }

    pub fn pyramid(&self) -> TilePyramid {
        self.pyramid
    }

    pub fn zoom(&self) -> ZoomPair {
        self.zoom
    }

    pub fn requested_normalized(&self) -> i32 {
        self.requested_normalized
    }

    /// The map reported a new real zoom on the active pyramid.
    pub fn set_real(&mut self, real: i32, pyramids: &PyramidSet) -> ZoomPair {
        self.zoom = ZoomPair::from_real(real, pyramids.get(self.pyramid));
        self.requested_normalized = self.zoom.normalized;
        self.zoom
    }

    pub fn set_normalized(&mut self, normalized: i32, pyramids: &PyramidSet) -> ZoomPair {
        self.zoom = ZoomPair::from_normalized(normalized, pyramids.get(self.pyramid));
        self.requested_normalized = normalized;
        self.zoom
    }

    /// Keep the requested normalized zoom across the switch, clamping only if
    /// the new pyramid cannot show it.
    pub fn switch_pyramid(&mut self, pyramid: TilePyramid, pyramids: &PyramidSet) -> ZoomPair {
        let config = pyramids.get(pyramid);
        let zoom = ZoomPair::from_normalized(self.requested_normalized, config);
        if zoom.normalized != self.requested_normalized {
            debug!(
                from = %self.pyramid,
                to = %pyramid,
                requested = self.requested_normalized,
                real = zoom.real,
                "zoom clamped by pyramid range"
            );
        }
        self.pyramid = pyramid;
        self.zoom = zoom;
        zoom
    }
}
