//! GeoTIFF access for the SITS coverage pipeline.
//!
//! Reading covers what the pipeline needs from downloaded coverages and
//! class rasters: size, band count, sample type, georeference, windowed
//! 8-bit reads and single-pixel reads. Writing is limited to palette class
//! rasters.

pub mod decompress;
pub mod error;
pub mod geokeys;
pub mod point;
pub mod reader;
pub mod sample;
pub mod writer;

pub use error::{RasterError, RasterResult};
pub use point::{extract_pixel_value, format_pixel_values};
pub use reader::{RasterDataset, Window};
pub use sample::SampleType;
pub use writer::{write_class_raster, ClassGrid, ColorTable, Rgba, CLASS_TILE_SIZE};
