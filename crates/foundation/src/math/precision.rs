//! Output precision of converted coordinates: six decimals for degrees,
//! whole metres for grids. Projection noise below that is dropped before a
//! value reaches the drawing model or a serializer.

use core::cmp::Ordering;

/// Decimal places kept for WGS84 degree values (~0.1 m on the ground).
pub const DEGREE_DECIMALS: u32 = 6;

/// Round `v` to `decimals` places, canonicalizing the result.
///
/// Rounding a tiny negative value yields `-0.0`; that is folded into `0.0` so
/// serializers never print `-0`.
pub fn round_to_decimals(v: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    canonical_f64((v * factor).round() / factor)
}

/// Round a degree value to [`DEGREE_DECIMALS`].
#[inline]
pub fn round_degrees(v: f64) -> f64 {
    round_to_decimals(v, DEGREE_DECIMALS)
}

/// Round a grid value to whole units (metres for the national grids).
#[inline]
pub fn round_grid_units(v: f64) -> f64 {
    canonical_f64(v.round())
}

/// Fold `-0.0` into `0.0` and every NaN into one NaN, so rounded output never
/// prints `-0` and equal vertices compare equal.
pub fn canonical_f64(v: f64) -> f64 {
    if v == 0.0 {
        // Handles +0.0 and -0.0.
        0.0
    } else if v.is_nan() {
        f64::NAN
    } else {
        v
    }
}

/// `total_cmp` on canonical values: `-0.0` and `0.0` order as equal.
pub fn stable_total_cmp_f64(a: f64, b: f64) -> Ordering {
    canonical_f64(a).total_cmp(&canonical_f64(b))
}

/// Sortable coordinate value, used to count a ring's distinct vertices with
/// sort + dedup.
#[derive(Debug, Copy, Clone, Default)]
pub struct StableF64(pub f64);

impl PartialEq for StableF64 {
    fn eq(&self, other: &Self) -> bool {
        stable_total_cmp_f64(self.0, other.0) == Ordering::Equal
    }
}

impl Eq for StableF64 {}

impl PartialOrd for StableF64 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StableF64 {
    fn cmp(&self, other: &Self) -> Ordering {
        stable_total_cmp_f64(self.0, other.0)
    }
}
