//! Fit-to-data: the deepest zoom at which every present source is visible.

use crs::{ConvertError, Converter};
use foundation::{Aabb2, GeoPoint, Geometry, LatLngBounds};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::pyramid::PyramidConfig;
use crate::zoom::ZoomPair;

/// A named layer of drawing-model geometry (data, drawing, transects, ...).
#[derive(Debug, Clone, Copy)]
pub struct GeometrySource<'a> {
    pub name: &'a str,
    pub geometries: &'a [Geometry],
}

impl<'a> GeometrySource<'a> {
    pub fn new(name: &'a str, geometries: &'a [Geometry]) -> Self {
        Self { name, geometries }
    }

    pub fn bounds(&self) -> Option<LatLngBounds> {
        LatLngBounds::from_points(self.geometries.iter().flat_map(|g| g.vertices()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitOptions {
    pub width_px: u32,
    pub height_px: u32,
    /// Kept free on every side of the fitted data.
    pub padding_px: u32,
    /// Extra margin as a fraction of the data's span (Leaflet `pad`).
    #[serde(default)]
    pub pad_ratio: f64,
    /// Used when no source has any geometry.
    pub fallback_center: GeoPoint,
    pub fallback_normalized_zoom: i32,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            width_px: 800,
            height_px: 600,
            padding_px: 20,
            pad_ratio: 0.0,
            fallback_center: GeoPoint::new(26.0, 65.0),
            fallback_normalized_zoom: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub center: GeoPoint,
    pub zoom: ZoomPair,
    /// What the map shows at `zoom` around `center`.
    pub bounds: LatLngBounds,
    /// False when the fallback was used.
    pub fitted: bool,
}

/// Union every present source, then pick the largest real zoom whose
/// projected extent fits the map minus padding.
pub fn fit_viewport(
    converter: &Converter<'_>,
    sources: &[GeometrySource<'_>],
    pyramid: &PyramidConfig,
    options: &FitOptions,
) -> Result<Viewport, ConvertError> {
    let union = sources
        .iter()
        .filter_map(GeometrySource::bounds)
        .reduce(LatLngBounds::union);

    let Some(union) = union else {
        debug!("no geometry to fit, using fallback view");
        let zoom = ZoomPair::from_normalized(options.fallback_normalized_zoom, pyramid);
        let center = options.fallback_center;
        let bounds = match visible_bounds(converter, pyramid, options, center, zoom.real) {
            Ok(bounds) => bounds,
            Err(e) => {
                debug!(error = %e, "fallback center outside the pyramid's projection");
                LatLngBounds::from_point(center)
            }
        };
        return Ok(Viewport {
            center,
            zoom,
            bounds,
            fitted: false,
        });
    };

    let union = union.pad(options.pad_ratio);
    let projected = outline(union)
        .into_iter()
        .map(|p| pyramid.projection.project(converter, p))
        .collect::<Result<Vec<_>, _>>()?;
    let extent = Aabb2::from_points(projected).unwrap_or(Aabb2::new([0.0; 2], [0.0; 2]));
    let center = pyramid.projection.unproject(converter, extent.center())?;

    let avail_w = options.width_px.saturating_sub(2 * options.padding_px).max(1) as f64;
    let avail_h = options.height_px.saturating_sub(2 * options.padding_px).max(1) as f64;
    let needed = (extent.width() / avail_w).max(extent.height() / avail_h);
    let real = if needed > 0.0 {
        (pyramid.base_resolution / needed).log2().floor() as i32
    } else {
        pyramid.max_real_zoom
    };
    let zoom = ZoomPair::from_real(real, pyramid);

    debug!(
        sources = sources.len(),
        real = zoom.real,
        normalized = zoom.normalized,
        "fitted viewport"
    );
    let bounds = visible_bounds(converter, pyramid, options, center, zoom.real)?;
    Ok(Viewport {
        center,
        zoom,
        bounds,
        fitted: true,
    })
}

/// Corners plus edge midpoints; grid projections bend parallels.
fn outline(b: LatLngBounds) -> Vec<GeoPoint> {
    let mid = b.center();
    let mut points = b.corners().to_vec();
    points.extend([
        GeoPoint::new(mid.lon_deg, b.south),
        GeoPoint::new(b.east, mid.lat_deg),
        GeoPoint::new(mid.lon_deg, b.north),
        GeoPoint::new(b.west, mid.lat_deg),
    ]);
    points
}

/// The map's planar rectangle at `real` around `center`, cut to where the
/// projection is defined.
fn visible_bounds(
    converter: &Converter<'_>,
    pyramid: &PyramidConfig,
    options: &FitOptions,
    center: GeoPoint,
    real: i32,
) -> Result<LatLngBounds, ConvertError> {
    let [cx, cy] = pyramid.projection.project(converter, center)?;
    let res = pyramid.resolution(real);
    let half_w = options.width_px as f64 * res / 2.0;
    let half_h = options.height_px as f64 * res / 2.0;
    let edge = [
        [cx - half_w, cy - half_h],
        [cx, cy - half_h],
        [cx + half_w, cy - half_h],
        [cx + half_w, cy],
        [cx + half_w, cy + half_h],
        [cx, cy + half_h],
        [cx - half_w, cy + half_h],
        [cx - half_w, cy],
    ];
    let points = edge
        .into_iter()
        .map(|xy| {
            let xy = pyramid.projection.clamp(converter, xy);
            pyramid.projection.unproject(converter, xy)
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(LatLngBounds::from_points(&points).unwrap_or_else(|| LatLngBounds::from_point(center)))
}

#[cfg(test)]
mod tests {
    use super::{FitOptions, GeometrySource, fit_viewport};
    use crate::pyramid::PyramidSet;
    use crate::zoom::ZoomPair;
    use crs::{Converter, CrsRegistry};
    use foundation::{GeoPoint, Geometry, Shape};
    use pretty_assertions::assert_eq;

    fn square(lat: f64, lon: f64, size: f64) -> Geometry {
        Shape::Polygon(vec![vec![
            GeoPoint::new(lon, lat),
            GeoPoint::new(lon + size, lat),
            GeoPoint::new(lon + size, lat + size),
            GeoPoint::new(lon, lat + size),
            GeoPoint::new(lon, lat),
        ]])
    }

    #[test]
    fn fit_covers_every_source_strictly() {
        let registry = CrsRegistry::new().expect("registry");
        let conv = Converter::new(&registry);
        let pyramids = PyramidSet::default();

        let data = [square(60.2, 24.8, 0.1)];
        let drawing = [Shape::Point(GeoPoint::new(25.7, 62.2))];
        let transects = [Shape::LineString(vec![
            GeoPoint::new(27.6, 62.9),
            GeoPoint::new(27.8, 63.0),
        ])];
        let sources = [
            GeometrySource::new("data", &data),
            GeometrySource::new("draw", &drawing),
            GeometrySource::new("transect", &transects),
        ];

        for config in [&pyramids.national, &pyramids.global] {
            let view = fit_viewport(&conv, &sources, config, &FitOptions::default()).expect("fit");
            assert!(view.fitted);
            for source in &sources {
                let b = source.bounds().expect("source bounds");
                assert!(
                    view.bounds.strictly_contains(&b),
                    "{} not inside {:?}",
                    source.name,
                    view.bounds
                );
            }
            assert_eq!(view.zoom.normalized, view.zoom.real - config.offset);
        }
    }

    #[test]
    fn adding_sources_never_zooms_in() {
        let registry = CrsRegistry::new().expect("registry");
        let conv = Converter::new(&registry);
        let config = PyramidSet::default().national;
        let options = FitOptions::default();

        let data = [square(60.2, 24.8, 0.1)];
        let far = [Shape::Point(GeoPoint::new(27.0, 68.5))];
        let one = fit_viewport(&conv, &[GeometrySource::new("data", &data)], &config, &options)
            .expect("one");
        let both = fit_viewport(
            &conv,
            &[
                GeometrySource::new("data", &data),
                GeometrySource::new("draw", &far),
            ],
            &config,
            &options,
        )
        .expect("both");
        assert!(both.zoom.real < one.zoom.real);
    }

    #[test]
    fn pad_ratio_widens_the_fit() {
        let registry = CrsRegistry::new().expect("registry");
        let conv = Converter::new(&registry);
        let config = PyramidSet::default().national;
        let data = [square(60.2, 24.8, 0.4)];
        let sources = [GeometrySource::new("data", &data)];
        let tight = fit_viewport(&conv, &sources, &config, &FitOptions::default()).expect("tight");
        let padded = fit_viewport(
            &conv,
            &sources,
            &config,
            &FitOptions {
                pad_ratio: 1.5,
                ..FitOptions::default()
            },
        )
        .expect("padded");
        assert!(padded.zoom.real < tight.zoom.real);
    }

    #[test]
    fn empty_sources_fall_back() {
        let registry = CrsRegistry::new().expect("registry");
        let conv = Converter::new(&registry);
        let config = PyramidSet::default().global;
        let options = FitOptions {
            fallback_center: GeoPoint::new(25.0, 61.0),
            fallback_normalized_zoom: 4,
            ..FitOptions::default()
        };
        let empty: [Geometry; 0] = [];
        let view = fit_viewport(&conv, &[GeometrySource::new("data", &empty)], &config, &options)
            .expect("fallback");
        assert!(!view.fitted);
        assert_eq!(view.center, GeoPoint::new(25.0, 61.0));
        assert_eq!(view.zoom, ZoomPair { real: 7, normalized: 4 });
        assert!(view.bounds.contains(&foundation::LatLngBounds::from_point(view.center)));
    }

    #[test]
    fn national_fallback_at_the_lowest_zooms() {
        let registry = CrsRegistry::new().expect("registry");
        let conv = Converter::new(&registry);
        let config = PyramidSet::default().national;
        let empty: [Geometry; 0] = [];
        for normalized in [0, 1] {
            let options = FitOptions {
                fallback_normalized_zoom: normalized,
                ..FitOptions::default()
            };
            let view = fit_viewport(&conv, &[GeometrySource::new("data", &empty)], &config, &options)
                .unwrap_or_else(|e| panic!("normalized {normalized}: {e}"));
            assert!(!view.fitted);
            assert_eq!(view.zoom, ZoomPair { real: normalized, normalized });
            assert!(view.bounds.contains(&foundation::LatLngBounds::from_point(view.center)));
        }
    }

    #[test]
    fn fallback_center_off_the_national_grid_still_gives_a_view() {
        let registry = CrsRegistry::new().expect("registry");
        let conv = Converter::new(&registry);
        let config = PyramidSet::default().national;
        let options = FitOptions {
            fallback_center: GeoPoint::new(151.2, -33.9),
            ..FitOptions::default()
        };
        let empty: [Geometry; 0] = [];
        let view = fit_viewport(&conv, &[GeometrySource::new("data", &empty)], &config, &options)
            .expect("fallback");
        assert!(!view.fitted);
        assert_eq!(view.bounds, foundation::LatLngBounds::from_point(view.center));
    }

    #[test]
    fn country_wide_data_fits_at_the_top_of_the_national_pyramid() {
        let registry = CrsRegistry::new().expect("registry");
        let conv = Converter::new(&registry);
        let config = PyramidSet::default().national;
        let options = FitOptions {
            width_px: 400,
            height_px: 300,
            ..FitOptions::default()
        };
        let finland = [Shape::LineString(vec![
            GeoPoint::new(20.0, 59.5),
            GeoPoint::new(31.0, 70.0),
        ])];
        let sources = [GeometrySource::new("data", &finland)];
        let view = fit_viewport(&conv, &sources, &config, &options).expect("fit");
        assert!(view.fitted);
        assert!(view.zoom.real <= 1, "real zoom {}", view.zoom.real);
        let b = sources[0].bounds().expect("bounds");
        assert!(view.bounds.strictly_contains(&b), "{:?}", view.bounds);
    }

    #[test]
    fn single_point_zooms_all_the_way_in() {
        let registry = CrsRegistry::new().expect("registry");
        let conv = Converter::new(&registry);
        let config = PyramidSet::default().national;
        let point = [Shape::Point(GeoPoint::new(24.9384, 60.1699))];
        let view = fit_viewport(
            &conv,
            &[GeometrySource::new("draw", &point)],
            &config,
            &FitOptions::default(),
        )
        .expect("fit");
        assert_eq!(view.zoom.real, config.max_real_zoom);
    }
}
