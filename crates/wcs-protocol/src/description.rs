//! WCS 2.0 DescribeCoverage response.

use serde::Serialize;

use crate::error::{WcsError, WcsResult};
use crate::uri::parse_srid;
use crate::xml;

const DOCUMENT: &str = "coverage description";

/// Bounding envelope and reference system of one coverage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverageDescription {
    pub coverage_id: Option<String>,
    /// Native EPSG code, `None` when `srsName` is not an EPSG URI
    pub srid: Option<u32>,
    pub axis_labels: Vec<String>,
    pub uom_labels: Vec<String>,
    pub dimension: usize,
    /// Lower corner followed by the upper corner, in axis-label order
    pub envelope: Vec<f64>,
}

fn split_labels(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| v.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

fn parse_corner(envelope: &xml::Element, name: &str) -> WcsResult<Vec<f64>> {
    let corner = envelope
        .child(name)
        .ok_or_else(|| WcsError::document(DOCUMENT, format!("missing {}", name)))?;
    corner
        .text
        .split_whitespace()
        .map(|v| {
            v.parse::<f64>()
                .map_err(|_| WcsError::document(DOCUMENT, format!("invalid {} value '{}'", name, v)))
        })
        .collect()
}

impl CoverageDescription {
    pub fn parse(body: &str) -> WcsResult<Self> {
        let root = xml::parse(body).map_err(|e| WcsError::document(DOCUMENT, e))?;
        let envelope = root
            .find(&["boundedBy", "Envelope"])
            .ok_or_else(|| WcsError::document(DOCUMENT, "missing gml:boundedBy/gml:Envelope"))?;

        let srid = envelope.attr("srsName").and_then(parse_srid);
        let axis_labels = split_labels(envelope.attr("axisLabels"));
        let uom_labels = split_labels(envelope.attr("uomLabels"));

        let mut corners = parse_corner(envelope, "lowerCorner")?;
        let upper = parse_corner(envelope, "upperCorner")?;
        if corners.len() != upper.len() {
            return Err(WcsError::document(
                DOCUMENT,
                format!(
                    "corner dimensions differ: {} vs {}",
                    corners.len(),
                    upper.len()
                ),
            ));
        }
        corners.extend(upper);

        let dimension = match envelope.attr("srsDimension") {
            Some(value) => value.trim().parse::<usize>().map_err(|_| {
                WcsError::document(DOCUMENT, format!("invalid srsDimension '{}'", value))
            })?,
            None => corners.len() / 2,
        };

        let coverage_id = root.find(&["CoverageId"]).map(|e| e.text.clone());

        Ok(Self {
            coverage_id,
            srid,
            axis_labels,
            uom_labels,
            dimension,
            envelope: corners,
        })
    }

    pub fn lower_corner(&self) -> &[f64] {
        &self.envelope[..self.envelope.len() / 2]
    }

    pub fn upper_corner(&self) -> &[f64] {
        &self.envelope[self.envelope.len() / 2..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_envelope() {
        let err = CoverageDescription::parse("<CoverageDescriptions/>").unwrap_err();
        assert!(err.to_string().contains("Envelope"));
    }

    #[test]
    fn test_non_numeric_corner() {
        let body = r#"<CoverageDescription><boundedBy><Envelope srsDimension="2">
<lowerCorner>1 a</lowerCorner><upperCorner>2 3</upperCorner></Envelope></boundedBy>
</CoverageDescription>"#;
        assert!(CoverageDescription::parse(body).is_err());
    }
}
