//! Common types and utilities shared across the SITS coverage pipeline.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod format;
pub mod geotransform;
pub mod selection;

pub use bbox::BoundingBox;
pub use crs::Crs;
pub use error::{SitsError, SitsResult};
pub use format::format_general;
pub use geotransform::{GeoTransform, Matrix2};
pub use selection::{Aoi, Selection, Toi};

/// EPSG code of the geographic reference every AOI is expressed in.
pub const WGS84_SRID: u32 = 4326;
