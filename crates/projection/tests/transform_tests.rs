//! Transform tests against well-known reference coordinates.

use projection::CrsTransform;
use sits_common::Crs;
use test_utils::{assert_approx_eq, assert_coords_approx_eq};

// ============================================================================
// UTM
// ============================================================================

#[test]
fn test_utm_central_meridian_on_equator() {
    let t = CrsTransform::new(&Crs::WGS84, &Crs::Epsg(32633)).unwrap();
    let (x, y) = t.transform_point(15.0, 0.0).unwrap();
    assert_coords_approx_eq!((x, y), (500000.0, 0.0), 1e-3);
}

#[test]
fn test_utm_mid_latitude_northing() {
    let t = CrsTransform::new(&Crs::WGS84, &Crs::Epsg(32633)).unwrap();
    let (x, y) = t.transform_point(15.0, 45.0).unwrap();
    assert_approx_eq!(x, 500000.0, 1e-3);
    assert_approx_eq!(y, 4982950.4, 0.5);
}

#[test]
fn test_utm_round_trip() {
    let forward = CrsTransform::new(&Crs::WGS84, &Crs::Epsg(32632)).unwrap();
    let inverse = CrsTransform::new(&Crs::Epsg(32632), &Crs::WGS84).unwrap();
    let (x, y) = forward.transform_point(10.5, 45.5).unwrap();
    let (lon, lat) = inverse.transform_point(x, y).unwrap();
    assert_coords_approx_eq!((lon, lat), (10.5, 45.5), 1e-7);
}

// ============================================================================
// ETRS89 LAEA
// ============================================================================

#[test]
fn test_laea_projection_origin() {
    let t = CrsTransform::new(&Crs::WGS84, &Crs::Epsg(3035)).unwrap();
    let (x, y) = t.transform_point(10.0, 52.0).unwrap();
    assert_coords_approx_eq!((x, y), (4321000.0, 3210000.0), 1e-2);
}

#[test]
fn test_laea_batch_round_trip() {
    let forward = CrsTransform::new(&Crs::WGS84, &Crs::Epsg(3035)).unwrap();
    let inverse = CrsTransform::new(&Crs::Epsg(3035), &Crs::WGS84).unwrap();
    let original = [(10.0, 45.0), (11.0, 45.0), (11.0, 46.0), (10.0, 46.0)];
    let mut points = original;
    forward.transform_points(&mut points).unwrap();
    assert!(points.iter().zip(original.iter()).all(|(p, o)| p != o));
    inverse.transform_points(&mut points).unwrap();
    for (p, o) in points.iter().zip(original.iter()) {
        assert_coords_approx_eq!((p.0, p.1), (o.0, o.1), 1e-7);
    }
}

// ============================================================================
// National grids
// ============================================================================

#[test]
fn test_lambert93_projection_origin() {
    let t = CrsTransform::new(&Crs::WGS84, &Crs::Epsg(2154)).unwrap();
    let (x, y) = t.transform_point(3.0, 46.5).unwrap();
    assert_coords_approx_eq!((x, y), (700000.0, 6600000.0), 1e-2);
}

#[test]
fn test_lambert93_round_trip() {
    let forward = CrsTransform::new(&Crs::WGS84, &Crs::Epsg(2154)).unwrap();
    let inverse = CrsTransform::new(&Crs::Epsg(2154), &Crs::WGS84).unwrap();
    let (x, y) = forward.transform_point(2.35, 48.85).unwrap();
    assert!(x > 600000.0 && x < 700000.0);
    assert!(y > 6800000.0 && y < 6900000.0);
    let (lon, lat) = inverse.transform_point(x, y).unwrap();
    assert_coords_approx_eq!((lon, lat), (2.35, 48.85), 1e-7);
}

#[test]
fn test_european_grids_resolve() {
    for code in [3763, 31287, 2056, 3067, 27700] {
        assert!(
            CrsTransform::new(&Crs::WGS84, &Crs::Epsg(code)).is_ok(),
            "EPSG:{} failed to resolve",
            code
        );
    }
}

// ============================================================================
// PROJ strings
// ============================================================================

#[test]
fn test_proj_string_matches_epsg() {
    let by_code = CrsTransform::new(&Crs::WGS84, &Crs::Epsg(32633)).unwrap();
    let by_text = CrsTransform::new(
        &Crs::WGS84,
        &Crs::Proj("+proj=utm +zone=33 +datum=WGS84 +units=m +no_defs".to_string()),
    )
    .unwrap();
    let a = by_code.transform_point(14.0, 48.0).unwrap();
    let b = by_text.transform_point(14.0, 48.0).unwrap();
    assert_coords_approx_eq!((a.0, a.1), (b.0, b.1), 1e-6);
}

#[test]
fn test_invalid_proj_string() {
    let result = CrsTransform::new(&Crs::WGS84, &Crs::Proj("+proj=nonsense".to_string()));
    assert!(result.is_err());
}
