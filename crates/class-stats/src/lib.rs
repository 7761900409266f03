//! Confusion statistics between a classification and a reference class
//! raster.

pub mod histogram;
pub mod report;

pub use histogram::{calculate_2d_class_histogram, ConfusionMatrix, HISTOGRAM_TILE_SIZE};
pub use report::{write_class_statistics, write_statistics_report};
