//! Single-point value queries.

use std::path::Path;

use projection::CrsTransform;
use sits_common::{format_general, Crs, SitsResult};
use tracing::debug;

use crate::reader::RasterDataset;

/// Values of every band at a WGS84 location, `None` outside the raster.
pub fn extract_pixel_value(
    image: &Path,
    latitude: f64,
    longitude: f64,
) -> SitsResult<Option<Vec<f64>>> {
    let mut dataset = RasterDataset::open(image)?;
    let geotransform = dataset.geotransform()?;
    let to_raster = CrsTransform::new(&Crs::WGS84, dataset.crs()?)?;

    let (x, y) = to_raster.transform_point(longitude, latitude)?;
    let (col, row) = geotransform.inverse()?.apply(x, y);
    let (col, row) = (col.floor(), row.floor());

    let (width, height) = dataset.size();
    if !(col >= 0.0 && row >= 0.0 && col < f64::from(width) && row < f64::from(height)) {
        debug!(
            path = %image.display(),
            latitude = latitude,
            longitude = longitude,
            "Point outside raster extent"
        );
        return Ok(None);
    }

    let values = dataset.read_pixel(col as u32, row as u32)?;
    Ok(Some(values))
}

/// Comma-joined band values with 18 significant digits; empty for `None`.
pub fn format_pixel_values(values: Option<&[f64]>) -> String {
    values
        .unwrap_or_default()
        .iter()
        .map(|v| format_general(*v, 18))
        .collect::<Vec<_>>()
        .join(",")
}
