//! KVP request encoding.

use sits_common::format_general;

use crate::options::GeoTiffOptions;
use crate::uri::{pack_srid, Interpolation};
use crate::{SERVICE, VERSION};

/// Significant digits of numeric subset and scale values on the wire.
const WIRE_PRECISION: usize = 16;

fn wire_number(value: f64) -> String {
    format_general(value, WIRE_PRECISION)
}

/// WCS request types.
#[derive(Debug, Clone)]
pub enum WcsRequest<'a> {
    GetCapabilities,
    DescribeCoverage {
        coverage_id: &'a str,
    },
    GetCoverage {
        coverage_id: &'a str,
        params: &'a GetCoverageRequest,
    },
}

impl WcsRequest<'_> {
    /// Request-specific KVP terms, without the service and version terms.
    pub fn to_kvp_terms(&self) -> Vec<String> {
        match self {
            WcsRequest::GetCapabilities => vec!["request=getCapabilities".to_string()],
            WcsRequest::DescribeCoverage { coverage_id } => vec![
                "request=describeCoverage".to_string(),
                format!("coverageId={}", coverage_id),
            ],
            WcsRequest::GetCoverage {
                coverage_id,
                params,
            } => {
                let mut terms = vec![
                    "request=getCoverage".to_string(),
                    format!("coverageId={}", coverage_id),
                ];
                terms.extend(params.to_kvp_terms());
                terms
            }
        }
    }

    /// Full request URL for a service endpoint.
    pub fn url(&self, service_url: &str) -> String {
        build_url(service_url, &self.to_kvp_terms())
    }
}

/// Normalise a service endpoint so query terms can be appended directly.
pub fn base_url(service_url: &str) -> String {
    if service_url.ends_with('?') {
        service_url.to_string()
    } else {
        format!("{}?", service_url)
    }
}

/// Join the endpoint, the fixed service/version terms and `terms`.
pub fn build_url(service_url: &str, terms: &[String]) -> String {
    let mut query = vec![format!("service={}", SERVICE), format!("version={}", VERSION)];
    query.extend(terms.iter().cloned());
    format!("{}{}", base_url(service_url), query.join("&"))
}

/// A subset along one axis.
#[derive(Debug, Clone, PartialEq)]
pub enum Subset {
    /// `axis(min,max)`
    Trim { axis: String, min: f64, max: f64 },
    /// `axis(value)`
    Slice { axis: String, value: f64 },
}

impl Subset {
    pub fn trim(axis: impl Into<String>, min: f64, max: f64) -> Self {
        Subset::Trim {
            axis: axis.into(),
            min,
            max,
        }
    }

    pub fn slice(axis: impl Into<String>, value: f64) -> Self {
        Subset::Slice {
            axis: axis.into(),
            value,
        }
    }

    fn to_kvp_term(&self) -> String {
        match self {
            Subset::Trim { axis, min, max } => {
                format!("subset={}({},{})", axis, wire_number(*min), wire_number(*max))
            }
            Subset::Slice { axis, value } => format!("subset={}({})", axis, wire_number(*value)),
        }
    }
}

/// Scaling extension: one factor for all axes, or one per axis.
#[derive(Debug, Clone, PartialEq)]
pub enum Scale {
    Factor(f64),
    Axes(Vec<(String, f64)>),
}

/// GetCoverage parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetCoverageRequest {
    /// Output MIME type (e.g., "image/tiff")
    pub format: Option<String>,
    pub subsets: Vec<Subset>,
    /// EPSG code the subset bounds are expressed in
    pub subsetting_srid: Option<u32>,
    /// EPSG code of the delivered raster
    pub output_srid: Option<u32>,
    pub scale: Option<Scale>,
    /// Target pixel counts per axis
    pub size: Vec<(String, u32)>,
    pub interpolation: Option<Interpolation>,
    pub geotiff: Option<GeoTiffOptions>,
}

impl GetCoverageRequest {
    /// When a subsetting CRS is given without an output CRS, the output
    /// defaults to the coverage's native CRS, which has to be looked up.
    pub fn needs_output_srid(&self) -> bool {
        self.subsetting_srid.is_some() && self.output_srid.is_none()
    }

    /// Encode the parameters in the order the service expects them.
    pub fn to_kvp_terms(&self) -> Vec<String> {
        let mut terms = Vec::new();

        if let Some(format) = &self.format {
            terms.push(format!("format={}", format));
        }

        terms.extend(self.subsets.iter().map(Subset::to_kvp_term));

        if let Some(srid) = self.subsetting_srid {
            terms.push(format!("subsettingCrs={}", pack_srid(srid)));
        }
        if let Some(srid) = self.output_srid {
            terms.push(format!("outputCrs={}", pack_srid(srid)));
        }

        match &self.scale {
            Some(Scale::Factor(factor)) => terms.push(format!("scaleFactor={}", wire_number(*factor))),
            Some(Scale::Axes(axes)) if !axes.is_empty() => terms.push(format!(
                "scaleAxes={}",
                axes.iter()
                    .map(|(axis, factor)| format!("{}({})", axis, wire_number(*factor)))
                    .collect::<Vec<_>>()
                    .join(",")
            )),
            _ => {}
        }

        if !self.size.is_empty() {
            terms.push(format!(
                "scaleSize={}",
                self.size
                    .iter()
                    .map(|(axis, n)| format!("{}({})", axis, n))
                    .collect::<Vec<_>>()
                    .join(",")
            ));
        }

        if let Some(interpolation) = self.interpolation {
            terms.push(format!("interpolation={}", interpolation.uri()));
        }

        if let Some(options) = &self.geotiff {
            terms.extend(options.to_kvp_terms());
        }

        terms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalisation() {
        assert_eq!(base_url("http://example.com/ows"), "http://example.com/ows?");
        assert_eq!(base_url("http://example.com/ows?"), "http://example.com/ows?");
    }

    #[test]
    fn test_get_capabilities_url() {
        assert_eq!(
            WcsRequest::GetCapabilities.url("http://example.com/ows"),
            "http://example.com/ows?service=WCS&version=2.0.0&request=getCapabilities"
        );
    }

    #[test]
    fn test_describe_coverage_url() {
        let url = WcsRequest::DescribeCoverage { coverage_id: "S2A_20160501" }.url("http://h/ows?");
        assert_eq!(
            url,
            "http://h/ows?service=WCS&version=2.0.0&request=describeCoverage&coverageId=S2A_20160501"
        );
    }

    #[test]
    fn test_empty_request_has_no_terms() {
        assert!(GetCoverageRequest::default().to_kvp_terms().is_empty());
        assert!(!GetCoverageRequest::default().needs_output_srid());
    }

    #[test]
    fn test_subset_terms() {
        let request = GetCoverageRequest {
            subsets: vec![Subset::trim("x", 10.0, 11.5), Subset::slice("t", 3.0)],
            ..Default::default()
        };
        assert_eq!(request.to_kvp_terms(), vec!["subset=x(10,11.5)", "subset=t(3)"]);
    }

    #[test]
    fn test_scale_axes_and_size() {
        let request = GetCoverageRequest {
            scale: Some(Scale::Axes(vec![("x".to_string(), 0.5), ("y".to_string(), 0.25)])),
            size: vec![("x".to_string(), 640), ("y".to_string(), 480)],
            ..Default::default()
        };
        assert_eq!(
            request.to_kvp_terms(),
            vec!["scaleAxes=x(0.5),y(0.25)", "scaleSize=x(640),y(480)"]
        );
    }
}
