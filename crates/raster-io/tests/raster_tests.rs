//! Integration tests for GeoTIFF reading, class-raster writing and point
//! queries.

use projection::CrsTransform;
use raster_io::{
    extract_pixel_value, format_pixel_values, write_class_raster, ClassGrid, ColorTable,
    RasterDataset, RasterError, SampleType, Window,
};
use sits_common::{Crs, GeoTransform};
use test_utils::{
    assert_approx_eq, create_diagonal_class_grid, temp_test_dir, write_class_geotiff,
    write_test_geotiff, TestGrid,
};
use tiff::encoder::colortype;

fn utm_grid(width: u32, height: u32) -> ClassGrid {
    ClassGrid {
        width,
        height,
        geotransform: GeoTransform::north_up(600000.0, 5300000.0, 10.0, -10.0),
        crs: Crs::Epsg(32633),
    }
}

#[test]
fn test_class_raster_reads_back() {
    let dir = temp_test_dir();
    let path = dir.path().join("classes.tif");
    let (width, height) = (300, 260);
    let data = create_diagonal_class_grid(width as usize, height as usize, 7);
    let mut colors = ColorTable::new();
    colors.set(2, (230, 0, 77, 255));

    write_class_raster(&path, &utm_grid(width, height), &data, &colors).unwrap();

    let mut dataset = RasterDataset::open(&path).unwrap();
    assert_eq!(dataset.size(), (300, 260));
    assert_eq!(dataset.band_count(), 1);
    assert_eq!(dataset.sample_type(), SampleType::U8);
    assert_eq!(dataset.srid(), Some(32633));
    assert_eq!(
        dataset.geotransform().unwrap(),
        GeoTransform::north_up(600000.0, 5300000.0, 10.0, -10.0)
    );

    let map = dataset.color_map().unwrap();
    assert_eq!(map.len(), 256);
    assert_eq!(map[2], [230, 0, 77]);
    assert_eq!(map[0], [0, 0, 0]);

    let all = dataset.read_window_u8(0, Window::new(0, 0, width, height)).unwrap();
    assert_eq!(all, data);
}

#[test]
fn test_window_across_tile_boundary() {
    let dir = temp_test_dir();
    let path = dir.path().join("classes.tif");
    let (width, height) = (300, 300);
    let data = create_diagonal_class_grid(width as usize, height as usize, 11);
    write_class_raster(&path, &utm_grid(width, height), &data, &ColorTable::new()).unwrap();

    let mut dataset = RasterDataset::open(&path).unwrap();
    let window = Window::new(250, 250, 20, 10);
    let values = dataset.read_window_u8(0, window).unwrap();
    assert_eq!(values.len(), 200);
    for row in 0..10usize {
        for col in 0..20usize {
            let expected = data[(250 + row) * width as usize + 250 + col];
            assert_eq!(values[row * 20 + col], expected);
        }
    }
}

#[test]
fn test_existing_output_is_replaced() {
    let dir = temp_test_dir();
    let path = dir.path().join("classes.tif");
    std::fs::write(&path, b"not a tiff").unwrap();

    write_class_raster(&path, &utm_grid(8, 8), &[4; 64], &ColorTable::new()).unwrap();

    let mut dataset = RasterDataset::open(&path).unwrap();
    assert_eq!(dataset.read_pixel(7, 7).unwrap(), vec![4.0]);
}

#[test]
fn test_proj_string_crs_round_trip() {
    let dir = temp_test_dir();
    let path = dir.path().join("custom.tif");
    let definition = "+proj=utm +zone=33 +datum=WGS84 +units=m +no_defs";
    let grid = ClassGrid {
        crs: Crs::Proj(definition.to_string()),
        ..utm_grid(4, 4)
    };
    write_class_raster(&path, &grid, &[1; 16], &ColorTable::new()).unwrap();

    let dataset = RasterDataset::open(&path).unwrap();
    assert_eq!(dataset.crs().unwrap(), &Crs::Proj(definition.to_string()));
    assert_eq!(dataset.srid(), None);
}

#[test]
fn test_rotated_geotransform_round_trip() {
    let dir = temp_test_dir();
    let path = dir.path().join("rotated.tif");
    let geotransform = GeoTransform::from_gdal([1000.0, 2.0, 0.5, 5000.0, 0.25, -2.0]);
    let grid = ClassGrid {
        width: 3,
        height: 2,
        geotransform,
        crs: Crs::Epsg(32633),
    };
    write_class_raster(&path, &grid, &[0, 1, 2, 3, 4, 5], &ColorTable::new()).unwrap();

    let dataset = RasterDataset::open(&path).unwrap();
    assert_eq!(dataset.geotransform().unwrap(), geotransform);
}

#[test]
fn test_pixel_is_point_origin_is_pixel_corner() {
    let dir = temp_test_dir();
    let path = dir.path().join("point.tif");
    let grid = TestGrid::new(4, 4, (600000.0, 5300000.0), (10.0, 10.0), 32633).with_pixel_is_point();
    write_class_geotiff(&path, &grid, &[1u8; 16]);

    let dataset = RasterDataset::open(&path).unwrap();
    let geotransform = dataset.geotransform().unwrap();
    assert_approx_eq!(geotransform.origin_x, 599995.0, 1e-9);
    assert_approx_eq!(geotransform.origin_y, 5300005.0, 1e-9);
    assert_approx_eq!(geotransform.pixel_width, 10.0, 1e-9);
    assert_approx_eq!(geotransform.pixel_height, -10.0, 1e-9);
}

#[test]
fn test_pixel_is_area_origin_unchanged() {
    let dir = temp_test_dir();
    let path = dir.path().join("area.tif");
    let grid = TestGrid::new(4, 4, (600000.0, 5300000.0), (10.0, 10.0), 32633);
    write_class_geotiff(&path, &grid, &[1u8; 16]);

    let geotransform = RasterDataset::open(&path).unwrap().geotransform().unwrap();
    assert_eq!((geotransform.origin_x, geotransform.origin_y), (600000.0, 5300000.0));
}

#[test]
fn test_striped_geotiff() {
    let dir = temp_test_dir();
    let path = dir.path().join("striped.tif");
    let grid = TestGrid::new(64, 40, (16.0, 48.5), (0.01, 0.01), 4326);
    let data = create_diagonal_class_grid(64, 40, 5);
    write_class_geotiff(&path, &grid, &data);

    let mut dataset = RasterDataset::open(&path).unwrap();
    assert_eq!(dataset.size(), (64, 40));
    assert_eq!(dataset.srid(), Some(4326));
    assert!(dataset.crs().unwrap().is_geographic());

    let bbox = dataset.bounding_box().unwrap();
    assert_approx_eq!(bbox.min_x, 16.0, 1e-9);
    assert_approx_eq!(bbox.max_x, 16.64, 1e-9);
    assert_approx_eq!(bbox.min_y, 48.1, 1e-9);
    assert_approx_eq!(bbox.max_y, 48.5, 1e-9);

    let values = dataset.read_window_u8(0, Window::new(10, 30, 5, 10)).unwrap();
    assert_eq!(values[0], ((10 + 30) % 5) as u8);
    assert_eq!(values[49], ((14 + 39) % 5) as u8);
    assert_eq!(dataset.read_pixel(3, 1).unwrap(), vec![4.0]);
}

#[test]
fn test_window_out_of_bounds() {
    let dir = temp_test_dir();
    let path = dir.path().join("small.tif");
    let grid = TestGrid::new(10, 10, (600000.0, 5300000.0), (10.0, 10.0), 32633);
    write_class_geotiff(&path, &grid, &[0; 100]);

    let mut dataset = RasterDataset::open(&path).unwrap();
    let err = dataset.read_window_u8(0, Window::new(5, 0, 6, 1)).unwrap_err();
    assert!(matches!(err, RasterError::WindowOutOfBounds { .. }));
    assert!(dataset.read_pixel(10, 0).is_err());
}

#[test]
fn test_8bit_read_of_16bit_raster_fails() {
    let dir = temp_test_dir();
    let path = dir.path().join("uint16.tif");
    let grid = TestGrid::new(4, 4, (600000.0, 5300000.0), (10.0, 10.0), 32633);
    write_test_geotiff::<colortype::Gray16>(&path, &grid, &[1000u16; 16]);

    let mut dataset = RasterDataset::open(&path).unwrap();
    assert_eq!(dataset.sample_type(), SampleType::U16);
    let err = dataset.read_window_u8(0, Window::new(0, 0, 4, 4)).unwrap_err();
    assert!(matches!(err, RasterError::Unsupported(_)));
    assert_eq!(dataset.read_pixel(2, 2).unwrap(), vec![1000.0]);
}

#[test]
fn test_read_pixel_returns_all_bands() {
    let dir = temp_test_dir();
    let path = dir.path().join("rgb.tif");
    let grid = TestGrid::new(2, 2, (600000.0, 5300000.0), (10.0, 10.0), 32633);
    let data: Vec<u8> = (0..12).collect();
    write_test_geotiff::<colortype::RGB8>(&path, &grid, &data);

    let mut dataset = RasterDataset::open(&path).unwrap();
    assert_eq!(dataset.band_count(), 3);
    assert_eq!(dataset.read_pixel(1, 1).unwrap(), vec![9.0, 10.0, 11.0]);
    assert_eq!(
        dataset.read_window_u8(2, Window::new(0, 0, 2, 2)).unwrap(),
        vec![2, 5, 8, 11]
    );
}

#[test]
fn test_point_query_in_utm_raster() {
    let dir = temp_test_dir();
    let path = dir.path().join("utm.tif");
    let grid = TestGrid::new(100, 100, (600000.0, 5300000.0), (10.0, 10.0), 32633);
    let data = create_diagonal_class_grid(100, 100, 7);
    write_class_geotiff(&path, &grid, &data);

    // centre of pixel (40, 11)
    let to_wgs84 = CrsTransform::new(&Crs::Epsg(32633), &Crs::WGS84).unwrap();
    let (lon, lat) = to_wgs84.transform_point(600405.0, 5299885.0).unwrap();

    let values = extract_pixel_value(&path, lat, lon).unwrap();
    assert_eq!(values, Some(vec![2.0]));
    assert_eq!(format_pixel_values(values.as_deref()), "2");
}

#[test]
fn test_point_query_outside_extent() {
    let dir = temp_test_dir();
    let path = dir.path().join("wgs84.tif");
    let grid = TestGrid::new(10, 10, (16.0, 48.5), (0.01, 0.01), 4326);
    write_class_geotiff(&path, &grid, &[9; 100]);

    assert_eq!(extract_pixel_value(&path, 48.45, 16.05).unwrap(), Some(vec![9.0]));
    assert_eq!(extract_pixel_value(&path, 0.0, 0.0).unwrap(), None);
    assert_eq!(extract_pixel_value(&path, 48.45, 16.2).unwrap(), None);
    assert_eq!(format_pixel_values(None), "");
}
