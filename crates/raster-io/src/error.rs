//! Error types for raster access.

use std::path::PathBuf;

use sits_common::SitsError;
use thiserror::Error;

pub type RasterResult<T> = Result<T, RasterError>;

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("Failed to open raster {path}: {message}")]
    Open { path: PathBuf, message: String },

    #[error("TIFF error: {0}")]
    Tiff(String),

    #[error("Decompression failed ({method}): {message}")]
    Decompress { method: &'static str, message: String },

    #[error("Unsupported raster layout: {0}")]
    Unsupported(String),

    #[error("Window ({x}, {y}) {width}x{height} exceeds raster size {raster_width}x{raster_height}")]
    WindowOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        raster_width: u32,
        raster_height: u32,
    },

    #[error("Raster is not georeferenced: {0}")]
    MissingGeoreference(String),

    #[error("Invalid raster data: {0}")]
    InvalidData(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<tiff::TiffError> for RasterError {
    fn from(err: tiff::TiffError) -> Self {
        match err {
            tiff::TiffError::IoError(e) => RasterError::Io(e),
            other => RasterError::Tiff(other.to_string()),
        }
    }
}

impl From<RasterError> for SitsError {
    fn from(err: RasterError) -> Self {
        match err {
            RasterError::Io(e) => SitsError::Io(e),
            other => SitsError::Raster(other.to_string()),
        }
    }
}
