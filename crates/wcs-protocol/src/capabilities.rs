//! WCS 2.0 GetCapabilities response.

use serde::Serialize;

use crate::error::{WcsError, WcsResult};
use crate::uri::{parse_interpolation, parse_srid};
use crate::xml;

const DOCUMENT: &str = "capabilities";

/// The parts of a capabilities document the pipeline reads.
///
/// CRS and interpolation URIs the codecs do not recognise are dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Capabilities {
    pub service_type: Option<String>,
    pub versions: Vec<String>,
    pub profiles: Vec<String>,
    pub formats: Vec<String>,
    pub srids: Vec<u32>,
    pub interpolations: Vec<String>,
    /// EO dataset series identifiers
    pub dataset_series: Vec<String>,
}

fn texts(root: &xml::Element, path: &[&str]) -> Vec<String> {
    root.find_all(path).into_iter().map(|e| e.text.clone()).collect()
}

impl Capabilities {
    pub fn parse(body: &str) -> WcsResult<Self> {
        let root = xml::parse(body).map_err(|e| WcsError::document(DOCUMENT, e))?;
        if root.name != "Capabilities" {
            return Err(WcsError::document(
                DOCUMENT,
                format!("unexpected root element '{}'", root.name),
            ));
        }

        let metadata = root.find(&["ServiceMetadata"]);
        let contents = root.find(&["Contents"]);

        Ok(Self {
            service_type: root
                .find(&["ServiceIdentification", "ServiceType"])
                .map(|e| e.text.clone()),
            versions: texts(&root, &["ServiceIdentification", "ServiceTypeVersion"]),
            profiles: texts(&root, &["ServiceIdentification", "Profile"]),
            formats: texts(&root, &["ServiceMetadata", "formatSupported"]),
            srids: metadata
                .map(|m| texts(m, &["crsSupported"]))
                .unwrap_or_default()
                .iter()
                .filter_map(|uri| parse_srid(uri))
                .collect(),
            interpolations: metadata
                .map(|m| texts(m, &["InterpolationSupported"]))
                .unwrap_or_default()
                .iter()
                .filter_map(|uri| parse_interpolation(uri))
                .collect(),
            dataset_series: contents
                .map(|c| texts(c, &["DatasetSeriesId"]))
                .unwrap_or_default(),
        })
    }

    pub fn supports_srid(&self, srid: u32) -> bool {
        self.srids.contains(&srid)
    }
}
