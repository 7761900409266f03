//! OWS 2.0 exception reports.

use std::fmt;

use sits_common::error::locator_suffix;

use crate::xml;

/// First exception of an `ows:ExceptionReport`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwsException {
    pub code: String,
    /// Empty when the service did not name one.
    pub locator: String,
    pub text: String,
}

impl fmt::Display for OwsException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}: {}", self.code, locator_suffix(&self.locator), self.text)
    }
}

impl OwsException {
    /// Extract the exception from a response body.
    ///
    /// Returns `None` when the body is not XML or carries no exception, in
    /// which case the HTTP failure is reported as is.
    pub fn parse(body: &str) -> Option<Self> {
        let root = xml::parse(body).ok()?;
        let exception = root.find(&["Exception"])?;
        Some(Self {
            code: exception.attr("exceptionCode").unwrap_or_default().to_string(),
            locator: exception.attr("locator").unwrap_or_default().to_string(),
            text: exception
                .child("ExceptionText")
                .map(|t| t.text.clone())
                .unwrap_or_default(),
        })
    }
}

/// Whether a `Content-Type` header announces an XML body.
pub fn is_xml_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "text/xml" || mime == "application/xml"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exception_report() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<ows:ExceptionReport xmlns:ows="http://www.opengis.net/ows/2.0" version="2.0.0">
  <ows:Exception exceptionCode="NoSuchCoverage" locator="foo">
    <ows:ExceptionText>No such Coverage 'foo'.</ows:ExceptionText>
  </ows:Exception>
</ows:ExceptionReport>"#;
        let e = OwsException::parse(body).unwrap();
        assert_eq!(e.code, "NoSuchCoverage");
        assert_eq!(e.locator, "foo");
        assert_eq!(e.to_string(), "NoSuchCoverage(foo): No such Coverage 'foo'.");
    }

    #[test]
    fn test_missing_locator() {
        let body = r#"<ExceptionReport><Exception exceptionCode="InvalidParameterValue">
<ExceptionText>bad subset</ExceptionText></Exception></ExceptionReport>"#;
        let e = OwsException::parse(body).unwrap();
        assert_eq!(e.locator, "");
        assert_eq!(e.to_string(), "InvalidParameterValue: bad subset");
    }

    #[test]
    fn test_non_exception_bodies() {
        assert!(OwsException::parse("<html><body>502</body></html>").is_none());
        assert!(OwsException::parse("Bad Gateway").is_none());
    }

    #[test]
    fn test_xml_content_types() {
        assert!(is_xml_content_type("text/xml"));
        assert!(is_xml_content_type("application/xml; charset=utf-8"));
        assert!(!is_xml_content_type("text/html"));
        assert!(!is_xml_content_type("image/tiff"));
    }
}
