use crs::{Converter, CrsId, CrsRegistry};
use formats::Format;
use foundation::{GeoPoint, Geometry, Shape};
use geometry::is_clockwise;
use interaction::copy::copy;
use interaction::draw::{DrawingModel, rectangle};
use interaction::entry::{Entry, submit};
use interaction::upload::upload;
use pretty_assertions::assert_eq;
use viewport::{FitOptions, GeometrySource, PyramidSet, TilePyramid, ZoomState, fit_viewport};

/// A metre of rounding in a grid is about 1.8e-5 degrees of longitude here.
const GRID_TOLERANCE_DEG: f64 = 2e-5;

fn assert_close(a: f64, b: f64, eps: f64) {
    let diff = (a - b).abs();
    assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
}

fn assert_same_geometry(got: &Geometry, expected: &Geometry, eps: f64) {
    assert_eq!(got.kind(), expected.kind());
    let got: Vec<&GeoPoint> = got.vertices().collect();
    let expected: Vec<&GeoPoint> = expected.vertices().collect();
    assert_eq!(got.len(), expected.len());
    for (g, e) in got.iter().zip(&expected) {
        assert_close(g.lon_deg, e.lon_deg, eps);
        assert_close(g.lat_deg, e.lat_deg, eps);
    }
}

fn drawn_geometries() -> Vec<Geometry> {
    let polygon = rectangle(GeoPoint::new(24.9, 60.1), GeoPoint::new(25.1, 60.2))
        .expect("rectangle")
        .geometry;
    vec![
        Shape::Point(GeoPoint::new(24.938_4, 60.169_9)),
        Shape::LineString(vec![
            GeoPoint::new(24.0, 61.0),
            GeoPoint::new(24.5, 61.2),
            GeoPoint::new(25.0, 61.1),
        ]),
        polygon,
    ]
}

#[test]
fn copy_then_upload_round_trips_for_every_system_and_format() {
    let registry = CrsRegistry::new().expect("registry");
    let conv = Converter::new(&registry);

    for geometry in drawn_geometries() {
        for crs in CrsId::ALL {
            for format in Format::ALL {
                let text = copy(&conv, &geometry, crs, format)
                    .unwrap_or_else(|e| panic!("copy {crs} {format}: {e}"));
                let uploaded = upload(&conv, &text)
                    .unwrap_or_else(|e| panic!("upload {crs} {format}: {e}\n{text}"));

                assert_eq!(uploaded.format, format, "{text}");
                assert_eq!(uploaded.crs, crs, "{text}");
                assert_eq!(uploaded.features.len(), 1);

                let eps = if crs.is_grid() { GRID_TOLERANCE_DEG } else { 1e-9 };
                assert_same_geometry(&uploaded.features[0].geometry, &geometry, eps);
            }
        }
    }
}

#[test]
fn western_aland_round_trips_through_etrs_wkt() {
    let registry = CrsRegistry::new().expect("registry");
    let conv = Converter::new(&registry);
    let point = Shape::Point(GeoPoint::new(19.14, 60.30));

    let text = copy(&conv, &point, CrsId::EtrsTm35Fin, Format::Wkt).expect("copy");
    assert_eq!(text, "POINT(66259 6710726)");
    let uploaded = upload(&conv, &text).expect("upload");
    assert_eq!(uploaded.crs, CrsId::EtrsTm35Fin);
    assert_same_geometry(&uploaded.features[0].geometry, &point, GRID_TOLERANCE_DEG);
}

#[test]
fn explicit_iso_override_beats_magnitude_inline_and_on_its_own_line() {
    let registry = CrsRegistry::new().expect("registry");
    let conv = Converter::new(&registry);
    let inline = upload(&conv, "6666666:3333333/CRSEPSG:3067");
    let own_line = upload(&conv, "6666666:3333333/\nCRSEPSG:3067");
    // Detected as ETRS-TM35FIN, whose easting domain does not reach 3 333 333.
    for outcome in [inline, own_line] {
        let err = outcome.expect_err("easting outside ETRS-TM35FIN");
        assert_eq!(err.kind(), interaction::FailureKind::Conversion);
    }

    let tagged = upload(&conv, "6666666:333333/CRSEPSG:3067").expect("tagged");
    assert_eq!(tagged.crs, CrsId::EtrsTm35Fin);
}

#[test]
fn entry_and_upload_agree_on_grid_cells() {
    let registry = CrsRegistry::new().expect("registry");
    let conv = Converter::new(&registry);
    let entered = submit(&conv, &Entry::new("666666", "333333")).expect("entry");
    let uploaded = upload(&conv, "666666:333333/").expect("upload");
    assert_eq!(entered.feature, uploaded.features[0]);

    let Shape::Polygon(rings) = &entered.feature.geometry else {
        panic!("expected cell");
    };
    assert!(is_clockwise(&rings[0]));
}

#[test]
fn drawing_then_fitting_across_a_pyramid_switch() {
    let registry = CrsRegistry::new().expect("registry");
    let conv = Converter::new(&registry);
    let pyramids = PyramidSet::default();

    let mut model = DrawingModel::new();
    for g in drawn_geometries() {
        model
            .add(foundation::Feature::new(g))
            .expect("commit");
    }
    let transect = [Shape::LineString(vec![
        GeoPoint::new(26.0, 62.0),
        GeoPoint::new(26.5, 62.4),
    ])];
    let drawn = model.geometries();
    let sources = [
        GeometrySource::new("draw", &drawn),
        GeometrySource::new("transect", &transect),
    ];

    let mut state = ZoomState::new(TilePyramid::National, 3, &pyramids);
    let national = fit_viewport(&conv, &sources, &pyramids.national, &FitOptions::default())
        .expect("national fit");
    state.set_real(national.zoom.real, &pyramids);

    let on_global = state.switch_pyramid(TilePyramid::Global, &pyramids);
    assert_eq!(on_global.normalized, national.zoom.normalized);
    let back = state.switch_pyramid(TilePyramid::National, &pyramids);
    assert_eq!(back, national.zoom);

    for source in &sources {
        let b = source.bounds().expect("bounds");
        assert!(national.bounds.strictly_contains(&b), "{}", source.name);
    }
}
