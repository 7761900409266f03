//! The coverage service seen by the downloader.

use std::io::Read;

use sits_common::SitsResult;
use wcs_client::WcsClient;
use wcs_protocol::{CoverageDescription, GetCoverageRequest};

/// Source of coverage descriptions and coverage bodies.
///
/// Implemented by [`WcsClient`]; tests substitute fakes that synthesise
/// rasters locally.
pub trait CoverageService {
    fn describe_coverage(&self, coverage_id: &str) -> SitsResult<CoverageDescription>;

    /// Start streaming a coverage.
    fn get_coverage(
        &self,
        coverage_id: &str,
        params: &GetCoverageRequest,
    ) -> SitsResult<Box<dyn Read + '_>>;
}

impl CoverageService for WcsClient {
    fn describe_coverage(&self, coverage_id: &str) -> SitsResult<CoverageDescription> {
        Ok(WcsClient::describe_coverage(self, coverage_id)?)
    }

    fn get_coverage(
        &self,
        coverage_id: &str,
        params: &GetCoverageRequest,
    ) -> SitsResult<Box<dyn Read + '_>> {
        let stream = WcsClient::get_coverage(self, coverage_id, params)?;
        Ok(Box::new(stream))
    }
}
