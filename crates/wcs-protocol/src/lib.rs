//! OGC WCS 2.0 protocol implementation.
//!
//! Supports:
//! - KVP encoding of GetCapabilities, DescribeCoverage and GetCoverage,
//!   including the CRS, scaling, interpolation and GeoTIFF extensions
//! - Parsing of capabilities, coverage descriptions and OWS 2.0 exception
//!   reports
//!
//! Nothing here touches the network; see the `wcs-client` crate.

pub mod capabilities;
pub mod description;
pub mod error;
pub mod exceptions;
pub mod options;
pub mod request;
pub mod uri;
mod xml;

pub use capabilities::Capabilities;
pub use description::CoverageDescription;
pub use error::{WcsError, WcsResult};
pub use exceptions::{is_xml_content_type, OwsException};
pub use options::{GeoTiffCompression, GeoTiffOptions};
pub use request::{GetCoverageRequest, Scale, Subset, WcsRequest};
pub use uri::{pack_interpolation, pack_srid, parse_interpolation, parse_srid, Interpolation};

/// Service type sent with every request.
pub const SERVICE: &str = "WCS";

/// Protocol version sent with every request.
pub const VERSION: &str = "2.0.0";
