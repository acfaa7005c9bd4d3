//! The drawing model and the geometry that enters it.
//!
//! Nothing is stored without passing [`commit`], so every polygon in the model
//! is closed and canonically wound.

use std::f64::consts::TAU;

use crs::Converter;
use foundation::math::offset_geo_point;
use foundation::{Feature, GeoPoint, Geometry, Shape};
use geometry::normalize_geometry;
use tracing::debug;
use viewport::{FitOptions, GeometrySource, PyramidSet, Viewport, ZoomState, fit_viewport};

use crate::Failure;

pub const CIRCLE_SEGMENTS: usize = 64;

/// Normalize a feature's geometry so it may enter the model.
pub fn commit(feature: Feature) -> Result<Feature, Failure> {
    let geometry = normalize_geometry(&feature.geometry)?;
    Ok(Feature {
        geometry,
        ..feature
    })
}

/// Axis-aligned (in lat/lng) rectangle spanned by two opposite corners.
pub fn rectangle(a: GeoPoint, b: GeoPoint) -> Result<Feature, Failure> {
    let ring = vec![
        a,
        GeoPoint::new(b.lon_deg, a.lat_deg),
        b,
        GeoPoint::new(a.lon_deg, b.lat_deg),
    ];
    commit(Feature::new(Shape::Polygon(vec![ring])))
}

/// Regular polygon approximating a circle of `radius_m` metres on the ground.
pub fn circle(center: GeoPoint, radius_m: f64, segments: usize) -> Result<Feature, Failure> {
    let ring = (0..segments)
        .map(|i| {
            let theta = TAU * i as f64 / segments as f64;
            offset_geo_point(center, radius_m * theta.sin(), radius_m * theta.cos())
        })
        .collect();
    commit(Feature::new(Shape::Polygon(vec![ring])))
}

/// Committed features, in drawing order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawingModel {
    features: Vec<Feature>,
}

impl DrawingModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn geometries(&self) -> Vec<Geometry> {
        self.features.iter().map(|f| f.geometry.clone()).collect()
    }

    /// Returns the index of the new feature.
    pub fn add(&mut self, feature: Feature) -> Result<usize, Failure> {
        let feature = commit(feature)?;
        debug!(kind = ?feature.geometry.kind(), "feature committed");
        self.features.push(feature);
        Ok(self.features.len() - 1)
    }

    /// Edit completion: swap in the edited geometry, returning the previous feature.
    ///
    /// `Ok(None)` when there is no feature at `index`.
    pub fn finish_edit(
        &mut self,
        index: usize,
        geometry: Geometry,
    ) -> Result<Option<Feature>, Failure> {
        let Some(slot) = self.features.get_mut(index) else {
            return Ok(None);
        };
        let edited = commit(Feature {
            geometry,
            coordinate_verbatim: slot.coordinate_verbatim.clone(),
        })?;
        Ok(Some(std::mem::replace(slot, edited)))
    }

    pub fn remove(&mut self, index: usize) -> Option<Feature> {
        (index < self.features.len()).then(|| self.features.remove(index))
    }

    pub fn clear(&mut self) {
        self.features.clear();
    }
}

/// Fit the active pyramid's view to the drawing plus any other layers, and
/// record the resulting zoom in `state`.
pub fn fit_to_data(
    converter: &Converter<'_>,
    model: &DrawingModel,
    others: &[GeometrySource<'_>],
    state: &mut ZoomState,
    pyramids: &PyramidSet,
    options: &FitOptions,
) -> Result<Viewport, Failure> {
    let drawn = model.geometries();
    let mut sources = Vec::with_capacity(others.len() + 1);
    sources.extend_from_slice(others);
    sources.push(GeometrySource::new("draw", &drawn));

    let view = fit_viewport(converter, &sources, pyramids.get(state.pyramid()), options)?;
    state.set_real(view.zoom.real, pyramids);
    Ok(view)
}

#[cfg(test)]
mod tests {
    use super::{CIRCLE_SEGMENTS, DrawingModel, circle, commit, fit_to_data, rectangle};
    use crate::FailureKind;
    use crs::{Converter, CrsRegistry};
    use foundation::math::enu_offset;
    use foundation::{Feature, GeoPoint, Shape};
    use geometry::is_clockwise;
    use pretty_assertions::assert_eq;
    use viewport::{FitOptions, GeometrySource, PyramidSet, TilePyramid, ZoomState};

    fn ring(feature: &Feature) -> &[GeoPoint] {
        match &feature.geometry {
            Shape::Polygon(rings) => &rings[0],
            other => panic!("expected polygon, got {other:?}"),
        }
    }

    #[test]
    fn rectangles_are_canonical_whichever_corner_comes_first() {
        let a = GeoPoint::new(24.0, 60.0);
        let b = GeoPoint::new(25.0, 61.0);
        let ab = rectangle(a, b).expect("ab");
        let ba = rectangle(b, a).expect("ba");
        assert!(is_clockwise(ring(&ab)));
        assert!(is_clockwise(ring(&ba)));
        assert_eq!(ring(&ab).len(), 5);
    }

    #[test]
    fn circle_vertices_sit_on_the_radius() {
        let center = GeoPoint::new(24.9384, 60.1699);
        let feature = circle(center, 1_000.0, CIRCLE_SEGMENTS).expect("circle");
        let vertices = ring(&feature);
        assert_eq!(vertices.len(), CIRCLE_SEGMENTS + 1);
        assert!(is_clockwise(vertices));
        for v in vertices {
            let enu = enu_offset(center, *v);
            let r = (enu.east * enu.east + enu.north * enu.north).sqrt();
            assert!((r - 1_000.0).abs() < 0.5, "radius {r}");
        }
    }

    #[test]
    fn degenerate_shapes_are_refused() {
        let p = GeoPoint::new(24.0, 60.0);
        assert_eq!(
            rectangle(p, GeoPoint::new(25.0, 60.0)).map_err(|e| e.kind()),
            Err(FailureKind::Conversion)
        );
        assert!(circle(p, 0.0, CIRCLE_SEGMENTS).is_err());
        assert!(circle(p, 100.0, 2).is_err());
    }

    #[test]
    fn edits_are_normalized_and_keep_verbatim() {
        let mut model = DrawingModel::new();
        let first = Feature::new(Shape::Point(GeoPoint::new(24.0, 60.0))).with_verbatim("60:24");
        let index = model.add(first).expect("add");

        // Drawn the non-canonical way round.
        let edited = Shape::Polygon(vec![vec![
            GeoPoint::new(24.0, 60.0),
            GeoPoint::new(24.0, 61.0),
            GeoPoint::new(25.0, 61.0),
            GeoPoint::new(25.0, 60.0),
        ]]);
        let previous = model.finish_edit(index, edited).expect("edit");
        assert!(previous.is_some());
        let stored = &model.features()[index];
        assert!(is_clockwise(ring(stored)));
        assert_eq!(stored.coordinate_verbatim.as_deref(), Some("60:24"));

        assert_eq!(
            model.finish_edit(7, Shape::Point(GeoPoint::new(0.0, 0.0))),
            Ok(None)
        );
        assert!(model.remove(index).is_some());
        assert!(model.features().is_empty());
    }

    #[test]
    fn commit_passes_points_through() {
        let point = Feature::new(Shape::Point(GeoPoint::new(24.0, 60.0)));
        assert_eq!(commit(point.clone()), Ok(point));
    }

    #[test]
    fn fit_to_data_includes_the_drawing_and_updates_zoom() {
        let registry = CrsRegistry::new().expect("registry");
        let conv = Converter::new(&registry);
        let pyramids = PyramidSet::default();
        let mut state = ZoomState::new(TilePyramid::Global, 0, &pyramids);

        let mut model = DrawingModel::new();
        model
            .add(rectangle(GeoPoint::new(24.0, 60.0), GeoPoint::new(24.2, 60.1)).expect("rect"))
            .expect("add");
        let data = [Shape::Point(GeoPoint::new(25.0, 61.0))];

        let view = fit_to_data(
            &conv,
            &model,
            &[GeometrySource::new("data", &data)],
            &mut state,
            &pyramids,
            &FitOptions::default(),
        )
        .expect("fit");
        assert!(view.fitted);
        assert_eq!(state.zoom(), view.zoom);
        assert_eq!(state.requested_normalized(), view.zoom.normalized);
        assert!(view.bounds.west <= 24.0 && view.bounds.east >= 25.0);
    }
}
