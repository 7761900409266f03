//! SITS coverage pipeline: aligned downloads, external algorithms and the
//! process workflows built on them.

pub mod algorithm;
pub mod download;
pub mod process;
pub mod records;
pub mod service;

pub use algorithm::{Algorithm, AlgorithmOutputs, AlgorithmParams, ParamValue, ProgressSink, CLASSES_OUTPUT};
pub use download::{download_coverages, DownloadOptions, GridReference};
pub use process::{
    classify_and_validate, export_sits, rasterize_land_cover, ClassificationOutputs, ExportOutputs,
    LandCoverDataset, ProcessContext, SITS_DIR,
};
pub use records::{load_coverage_records, ordered_identifiers, parse_coverage_records, CoverageRecord};
pub use service::CoverageService;
