//! Coordinate reference system transformations.
//!
//! Thin layer over proj4rs: EPSG codes are resolved through the
//! crs-definitions database, PROJ strings are used as given.

pub mod epsg;
pub mod transform;

pub use transform::{resolve, CrsTransform, ProjectionError};
