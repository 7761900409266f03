//! Synthetic GeoTIFF writers.
//!
//! Fakes of the coverage service and the external algorithms write their
//! outputs through these helpers, so tests need neither a server nor GDAL.

use std::fs::File;
use std::path::Path;

use tiff::encoder::{colortype, TiffEncoder, TiffValue};
use tiff::tags::Tag;

/// North-up grid of a synthetic raster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestGrid {
    pub width: u32,
    pub height: u32,
    /// Upper-left corner
    pub origin: (f64, f64),
    /// Pixel size, both positive
    pub pixel_size: (f64, f64),
    pub epsg: u16,
    /// Tiepoint refers to the pixel centre (GTRasterTypeGeoKey = PixelIsPoint)
    pub pixel_is_point: bool,
}

impl TestGrid {
    pub fn new(width: u32, height: u32, origin: (f64, f64), pixel_size: (f64, f64), epsg: u16) -> Self {
        Self {
            width,
            height,
            origin,
            pixel_size,
            epsg,
            pixel_is_point: false,
        }
    }

    pub fn with_pixel_is_point(mut self) -> Self {
        self.pixel_is_point = true;
        self
    }

    /// Lower-right corner.
    pub fn lower_right(&self) -> (f64, f64) {
        (
            self.origin.0 + self.width as f64 * self.pixel_size.0,
            self.origin.1 - self.height as f64 * self.pixel_size.1,
        )
    }

    fn geo_key_directory(&self) -> [u16; 16] {
        let geographic = matches!(self.epsg, 4326 | 4258 | 4269);
        let (model_type, crs_key) = if geographic { (2, 2048) } else { (1, 3072) };
        let raster_type = if self.pixel_is_point { 2 } else { 1 };
        [
            1, 1, 0, 3, // header: version, revision, minor, key count
            1024, 0, 1, model_type, // GTModelTypeGeoKey
            1025, 0, 1, raster_type, // GTRasterTypeGeoKey
            crs_key, 0, 1, self.epsg,
        ]
    }
}

/// Writes a striped GeoTIFF of colour type `C` with the grid's georeferencing.
pub fn write_test_geotiff<C>(path: &Path, grid: &TestGrid, data: &[C::Inner])
where
    C: colortype::ColorType,
    [C::Inner]: TiffValue,
{
    let file = File::create(path).expect("Failed to create test GeoTIFF");
    let mut encoder = TiffEncoder::new(file).expect("Failed to start TIFF encoder");
    let mut image = encoder
        .new_image::<C>(grid.width, grid.height)
        .expect("Failed to start TIFF image");

    let scale = [grid.pixel_size.0, grid.pixel_size.1, 0.0];
    let tiepoint = [0.0, 0.0, 0.0, grid.origin.0, grid.origin.1, 0.0];
    let keys = grid.geo_key_directory();
    let directory = image.encoder();
    directory
        .write_tag(Tag::ModelPixelScaleTag, &scale[..])
        .expect("Failed to write pixel scale");
    directory
        .write_tag(Tag::ModelTiepointTag, &tiepoint[..])
        .expect("Failed to write tiepoint");
    directory
        .write_tag(Tag::GeoKeyDirectoryTag, &keys[..])
        .expect("Failed to write GeoKey directory");

    image.write_data(data).expect("Failed to write test GeoTIFF data");
}

/// Single-band 8-bit class raster.
pub fn write_class_geotiff(path: &Path, grid: &TestGrid, data: &[u8]) {
    write_test_geotiff::<colortype::Gray8>(path, grid, data);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_class_geotiff_readable() {
        let dir = crate::temp_test_dir();
        let path = dir.path().join("class.tif");
        let grid = TestGrid::new(4, 3, (600000.0, 5300000.0), (10.0, 10.0), 32633);
        write_class_geotiff(&path, &grid, &[1u8; 12]);

        let mut decoder = tiff::decoder::Decoder::new(File::open(&path).unwrap()).unwrap();
        assert_eq!(decoder.dimensions().unwrap(), (4, 3));
        let scale = decoder.get_tag_f64_vec(Tag::ModelPixelScaleTag).unwrap();
        assert_eq!(scale, vec![10.0, 10.0, 0.0]);
        assert_eq!(grid.lower_right(), (600040.0, 5299970.0));
    }
}
