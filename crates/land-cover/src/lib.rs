//! Reference land cover: class tables, vector layers and rasterization
//! onto a template grid.

pub mod classes;
pub mod rasterize;
pub mod vector;

pub use classes::{ClassTable, LandCoverClass, CLC2012_ATTRIBUTE};
pub use rasterize::{rasterize_shapes, RasterizeSummary};
pub use vector::{VectorDataset, VectorFeature, VectorLayer};
