//! Blocking HTTP client for OGC WCS 2.0 services.
//!
//! Request encoding and response parsing live in `wcs-protocol`; this crate
//! only moves bytes. Coverage bodies are handed out as a [`CoverageStream`]
//! so callers can copy them to disk without buffering whole scenes.

use std::io::{self, Read};
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info, instrument, warn};

use wcs_protocol::request::base_url;
use wcs_protocol::{
    is_xml_content_type, Capabilities, CoverageDescription, GetCoverageRequest, OwsException,
    WcsError, WcsRequest, WcsResult,
};

/// Default timeout for a whole request, body included.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Client bound to one service endpoint.
#[derive(Debug, Clone)]
pub struct WcsClient {
    service_url: String,
    http: Client,
}

impl WcsClient {
    pub fn new(service_url: &str) -> WcsResult<Self> {
        Self::with_timeout(service_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(service_url: &str, timeout: Duration) -> WcsResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(30))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| WcsError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            service_url: base_url(service_url),
            http,
        })
    }

    /// Endpoint with the trailing `?`.
    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    fn query(&self, request: &WcsRequest<'_>) -> WcsResult<Response> {
        let url = request.url(&self.service_url);
        debug!(url = %url, "WCS query");

        let response = self
            .http
            .get(&url)
            .send()
            .map_err(|e| WcsError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        if is_xml_content_type(&content_type) {
            let body = response.text().map_err(|e| {
                WcsError::Transport(format!("HTTP {} from {}: unreadable error body: {}", status, url, e))
            })?;
            if let Some(exception) = OwsException::parse(&body) {
                warn!(
                    code = %exception.code,
                    locator = %exception.locator,
                    "WCS exception report"
                );
                return Err(WcsError::Ows(exception));
            }
        }

        Err(WcsError::Transport(format!("HTTP {} from {}", status, url)))
    }

    fn query_text(&self, request: &WcsRequest<'_>) -> WcsResult<String> {
        self.query(request)?
            .text()
            .map_err(|e| WcsError::Transport(e.to_string()))
    }

    #[instrument(skip(self))]
    pub fn get_capabilities(&self) -> WcsResult<Capabilities> {
        let body = self.query_text(&WcsRequest::GetCapabilities)?;
        Capabilities::parse(&body)
    }

    #[instrument(skip(self))]
    pub fn describe_coverage(&self, coverage_id: &str) -> WcsResult<CoverageDescription> {
        let body = self.query_text(&WcsRequest::DescribeCoverage { coverage_id })?;
        CoverageDescription::parse(&body)
    }

    /// Start a coverage download.
    ///
    /// When only a subsetting CRS is given, the output CRS is set to the
    /// coverage's native one, which costs one extra DescribeCoverage.
    #[instrument(skip(self, params))]
    pub fn get_coverage(
        &self,
        coverage_id: &str,
        params: &GetCoverageRequest,
    ) -> WcsResult<CoverageStream> {
        let resolved;
        let params = if params.needs_output_srid() {
            let mut with_output = params.clone();
            with_output.output_srid = self.describe_coverage(coverage_id)?.srid;
            resolved = with_output;
            &resolved
        } else {
            params
        };

        let response = self.query(&WcsRequest::GetCoverage {
            coverage_id,
            params,
        })?;
        info!(
            coverage_id = %coverage_id,
            content_length = ?response.content_length(),
            "Coverage download started"
        );
        Ok(CoverageStream { response })
    }
}

/// Body of a GetCoverage response.
pub struct CoverageStream {
    response: Response,
}

impl CoverageStream {
    pub fn content_type(&self) -> Option<&str> {
        self.response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }

    pub fn content_length(&self) -> Option<u64> {
        self.response.content_length()
    }
}

impl Read for CoverageStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.response.read(buf)
    }
}
