//! Downloading a SITS onto one common grid.
//!
//! The first ("master") coverage is cut from the AOI in EPSG:4326 and
//! delivered in its native CRS, optionally scaled down. Every following
//! ("slave") coverage is requested with the master's CRS, extent and pixel
//! dimensions, so the whole stack lines up pixel for pixel.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use raster_io::RasterDataset;
use serde::{Deserialize, Serialize};
use sits_common::{GeoTransform, Selection, SitsError, SitsResult, WGS84_SRID};
use tracing::{debug, info, instrument};
use wcs_protocol::{GeoTiffOptions, GetCoverageRequest, Interpolation, Scale, Subset};

use crate::service::CoverageService;

/// Copy buffer used when streaming coverage bodies to disk (1 MiB).
pub const COPY_CHUNK_SIZE: usize = 1024 * 1024;

/// Output format of every coverage request.
pub const COVERAGE_FORMAT: &str = "image/tiff";

/// Resampling options shared by all requests of one download.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadOptions {
    /// Downscaling of the master coverage, in `(0, 1]`
    pub scaling_factor: f64,
    pub interpolation: Interpolation,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            scaling_factor: 1.0,
            interpolation: Interpolation::NearestNeighbour,
        }
    }
}

impl DownloadOptions {
    pub fn new(scaling_factor: f64, interpolation: Interpolation) -> SitsResult<Self> {
        let options = Self {
            scaling_factor,
            interpolation,
        };
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> SitsResult<()> {
        if !(self.scaling_factor > 0.0 && self.scaling_factor <= 1.0) {
            return Err(SitsError::InvalidParameter {
                param: "scaling_factor".to_string(),
                message: format!("{} is outside of (0, 1]", self.scaling_factor),
            });
        }
        Ok(())
    }
}

/// Grid every slave coverage is resampled onto.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridReference {
    pub srid: u32,
    /// Pixel counts along x and y
    pub size: (u32, u32),
    /// `(x_ul, x_br)`
    pub subset_x: (f64, f64),
    /// `(y_br, y_ul)`
    pub subset_y: (f64, f64),
}

impl GridReference {
    /// Grid of a `width x height` image with the given geotransform.
    pub fn from_geotransform(srid: u32, geotransform: &GeoTransform, width: u32, height: u32) -> Self {
        let (x_ul, y_ul) = geotransform.apply(0.0, 0.0);
        let (x_br, y_br) = geotransform.apply(f64::from(width), f64::from(height));
        Self {
            srid,
            size: (width, height),
            subset_x: (x_ul, x_br),
            subset_y: (y_br, y_ul),
        }
    }

    /// Grid of a downloaded raster, expressed in `srid`.
    pub fn from_raster(path: &Path, srid: u32) -> SitsResult<Self> {
        let dataset = RasterDataset::open(path)?;
        let (width, height) = dataset.size();
        let geotransform = dataset.geotransform()?;
        Ok(Self::from_geotransform(srid, &geotransform, width, height))
    }

    fn subsets(&self) -> Vec<Subset> {
        vec![
            Subset::trim("x", self.subset_x.0, self.subset_x.1),
            Subset::trim("y", self.subset_y.0, self.subset_y.1),
        ]
    }

    fn size_terms(&self) -> Vec<(String, u32)> {
        vec![("x".to_string(), self.size.0), ("y".to_string(), self.size.1)]
    }
}

fn base_request(options: &DownloadOptions) -> GetCoverageRequest {
    GetCoverageRequest {
        format: Some(COVERAGE_FORMAT.to_string()),
        interpolation: Some(options.interpolation),
        geotiff: Some(GeoTiffOptions::sits_default()),
        ..Default::default()
    }
}

/// Request of the master coverage: the AOI in EPSG:4326, delivered in the
/// coverage's native CRS.
pub fn master_request(
    selection: &Selection,
    native_srid: u32,
    options: &DownloadOptions,
) -> GetCoverageRequest {
    let aoi = &selection.aoi;
    GetCoverageRequest {
        subsets: vec![
            Subset::trim("x", aoi.left, aoi.right),
            Subset::trim("y", aoi.bottom, aoi.top),
        ],
        subsetting_srid: Some(WGS84_SRID),
        output_srid: Some(native_srid),
        scale: Some(Scale::Factor(options.scaling_factor)),
        ..base_request(options)
    }
}

/// Request of a slave coverage resampled onto `grid`.
pub fn slave_request(grid: &GridReference, options: &DownloadOptions) -> GetCoverageRequest {
    GetCoverageRequest {
        subsets: grid.subsets(),
        subsetting_srid: Some(grid.srid),
        output_srid: Some(grid.srid),
        size: grid.size_terms(),
        ..base_request(options)
    }
}

/// Download `coverages` into the new directory `output_dir`, aligned to the
/// grid of the first one.
///
/// Returns the written paths in input order. `on_complete` is called with
/// the position, identifier and path of each file once it is closed. Any
/// failure aborts the download; files already written are left in place.
#[instrument(skip(service, coverages, selection, on_complete), fields(count = coverages.len()))]
pub fn download_coverages<S, F>(
    service: &S,
    coverages: &[String],
    selection: &Selection,
    output_dir: &Path,
    options: &DownloadOptions,
    mut on_complete: F,
) -> SitsResult<Vec<PathBuf>>
where
    S: CoverageService + ?Sized,
    F: FnMut(usize, &str, &Path),
{
    let Some(master) = coverages.first() else {
        return Err(SitsError::EmptySits);
    };
    options.validate()?;

    fs::create_dir(output_dir)?;

    let native_srid = service.describe_coverage(master)?.srid.ok_or_else(|| {
        SitsError::UnresolvedReference(format!(
            "coverage '{}' has no EPSG reference system",
            master
        ))
    })?;

    let mut request = master_request(selection, native_srid, options);
    let mut images = Vec::with_capacity(coverages.len());

    for (idx, coverage) in coverages.iter().enumerate() {
        debug!(coverage_id = %coverage, index = idx, "Requesting coverage");

        let path = output_dir.join(format!("{}.tif", coverage));
        let bytes = {
            let mut body = service.get_coverage(coverage, &request)?;
            copy_to_file(&mut body, &path)?
        };
        info!(coverage_id = %coverage, path = %path.display(), bytes = bytes, "Downloaded coverage");

        if idx == 0 {
            let grid = GridReference::from_raster(&path, native_srid)?;
            debug!(
                srid = grid.srid,
                size_x = grid.size.0,
                size_y = grid.size.1,
                "Derived grid reference from master coverage"
            );
            request = slave_request(&grid, options);
        }

        on_complete(idx, coverage, &path);
        images.push(path);
    }

    Ok(images)
}

fn copy_to_file(source: &mut dyn Read, path: &Path) -> io::Result<u64> {
    let mut writer = BufWriter::with_capacity(COPY_CHUNK_SIZE, File::create(path)?);
    let bytes = io::copy(source, &mut writer)?;
    writer.flush()?;
    Ok(bytes)
}
