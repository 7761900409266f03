//! Common test fixtures for SITS pipeline tests.
//!
//! Service documents are trimmed-down versions of what an EOxServer WCS
//! 2.0 endpoint returns.

/// Common areas of interest as (left, bottom, right, top) in WGS84.
pub mod aoi {
    /// Around Vienna, covered by UTM zone 33N
    pub const VIENNA: (f64, f64, f64, f64) = (16.2, 48.1, 16.5, 48.3);

    /// One degree square at the UTM 33N central meridian
    pub const UTM33_CENTRE: (f64, f64, f64, f64) = (14.5, 45.0, 15.5, 46.0);

    /// Degenerate AOI (left == right)
    pub const DEGENERATE: (f64, f64, f64, f64) = (16.0, 48.0, 16.0, 49.0);
}

/// Selection documents as stored with a SITS.
pub mod selection {
    pub const VALID: &str = r#"{
  "aoi": {"left": 16.2, "right": 16.5, "bottom": 48.1, "top": 48.3},
  "toi": {"start": "2016-04-01T00:00:00Z", "end": "2016-09-30T23:59:59Z"}
}"#;

    /// Start after end
    pub const REVERSED_TOI: &str = r#"{
  "aoi": {"left": 16.2, "right": 16.5, "bottom": 48.1, "top": 48.3},
  "toi": {"start": "2016-09-30", "end": "2016-04-01"}
}"#;
}

/// WCS 2.0 service documents.
pub mod wcs {
    pub const CAPABILITIES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<wcs:Capabilities xmlns:wcs="http://www.opengis.net/wcs/2.0"
    xmlns:ows="http://www.opengis.net/ows/2.0"
    xmlns:crs="http://www.opengis.net/wcs/crs/1.0"
    xmlns:int="http://www.opengis.net/wcs/interpolation/1.0"
    xmlns:wcseo="http://www.opengis.net/wcs/wcseo/1.0" version="2.0.1">
  <ows:ServiceIdentification>
    <ows:Title>SITS coverage service</ows:Title>
    <ows:ServiceType codeSpace="OGC">OGC WCS</ows:ServiceType>
    <ows:ServiceTypeVersion>2.0.0</ows:ServiceTypeVersion>
    <ows:ServiceTypeVersion>2.0.1</ows:ServiceTypeVersion>
    <ows:Profile>http://www.opengis.net/spec/WCS/2.0/conf/core</ows:Profile>
    <ows:Profile>http://www.opengis.net/spec/WCS_service-extension_crs/1.0/conf/crs</ows:Profile>
  </ows:ServiceIdentification>
  <wcs:ServiceMetadata>
    <wcs:formatSupported>image/tiff</wcs:formatSupported>
    <wcs:formatSupported>image/png</wcs:formatSupported>
    <wcs:Extension>
      <int:InterpolationMetadata>
        <int:InterpolationSupported>http://www.opengis.net/def/interpolation/OGC/1/nearest-neighbour</int:InterpolationSupported>
        <int:InterpolationSupported>http://www.opengis.net/def/interpolation/OGC/1/bilinear</int:InterpolationSupported>
      </int:InterpolationMetadata>
      <crs:CrsMetadata>
        <crs:crsSupported>http://www.opengis.net/def/crs/EPSG/0/4326</crs:crsSupported>
        <crs:crsSupported>http://www.opengis.net/def/crs/EPSG/0/32633</crs:crsSupported>
        <crs:crsSupported>http://www.opengis.net/def/crs/OGC/1.3/CRS84</crs:crsSupported>
      </crs:CrsMetadata>
    </wcs:Extension>
  </wcs:ServiceMetadata>
  <wcs:Contents>
    <wcs:CoverageSummary>
      <wcs:CoverageId>S2A_20160501_T33UXP</wcs:CoverageId>
    </wcs:CoverageSummary>
    <wcs:Extension>
      <wcseo:DatasetSeriesSummary>
        <wcseo:DatasetSeriesId>Sentinel2_L1C</wcseo:DatasetSeriesId>
      </wcseo:DatasetSeriesSummary>
      <wcseo:DatasetSeriesSummary>
        <wcseo:DatasetSeriesId>Landsat8_L1T</wcseo:DatasetSeriesId>
      </wcseo:DatasetSeriesSummary>
    </wcs:Extension>
  </wcs:Contents>
</wcs:Capabilities>"#;

    pub const DESCRIPTION_UTM33: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<wcs:CoverageDescriptions xmlns:wcs="http://www.opengis.net/wcs/2.0"
    xmlns:gml="http://www.opengis.net/gml/3.2">
  <wcs:CoverageDescription gml:id="S2A_20160501_T33UXP">
    <gml:boundedBy>
      <gml:Envelope srsName="http://www.opengis.net/def/crs/EPSG/0/32633"
          axisLabels="x y" uomLabels="m m" srsDimension="2">
        <gml:lowerCorner>600000 5290200</gml:lowerCorner>
        <gml:upperCorner>709800 5400000</gml:upperCorner>
      </gml:Envelope>
    </gml:boundedBy>
    <wcs:CoverageId>S2A_20160501_T33UXP</wcs:CoverageId>
  </wcs:CoverageDescription>
</wcs:CoverageDescriptions>"#;

    pub const DESCRIPTION_WGS84: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<wcs:CoverageDescriptions xmlns:wcs="http://www.opengis.net/wcs/2.0"
    xmlns:gml="http://www.opengis.net/gml/3.2">
  <wcs:CoverageDescription gml:id="LC8_20160514">
    <gml:boundedBy>
      <gml:Envelope srsName="http://www.opengis.net/def/crs/EPSG/0/4326"
          axisLabels="lat long" uomLabels="deg deg" srsDimension="2">
        <gml:lowerCorner>47.5 15.25</gml:lowerCorner>
        <gml:upperCorner>49.25 17.75</gml:upperCorner>
      </gml:Envelope>
    </gml:boundedBy>
    <wcs:CoverageId>LC8_20160514</wcs:CoverageId>
  </wcs:CoverageDescription>
</wcs:CoverageDescriptions>"#;

    pub const NO_SUCH_COVERAGE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ows:ExceptionReport xmlns:ows="http://www.opengis.net/ows/2.0" version="2.0.0">
  <ows:Exception exceptionCode="NoSuchCoverage" locator="missing_coverage">
    <ows:ExceptionText>No such Coverage 'missing_coverage'.</ows:ExceptionText>
  </ows:Exception>
</ows:ExceptionReport>"#;
}

/// GeoJSON vector datasets.
pub mod geojson {
    /// FeatureCollection of axis-aligned rectangles given as
    /// `(left, bottom, right, top, code_12)` in WGS84.
    pub fn land_cover_rectangles(features: &[(f64, f64, f64, f64, &str)]) -> String {
        let features: Vec<String> = features
            .iter()
            .map(|(l, b, r, t, code)| {
                format!(
                    r#"{{"type":"Feature","properties":{{"code_12":"{code}"}},"geometry":{{"type":"Polygon","coordinates":[[[{l},{b}],[{r},{b}],[{r},{t}],[{l},{t}],[{l},{b}]]]}}}}"#
                )
            })
            .collect();
        format!(
            r#"{{"type":"FeatureCollection","features":[{}]}}"#,
            features.join(",")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_land_cover_rectangles_shape() {
        let doc = geojson::land_cover_rectangles(&[(0.0, 0.0, 1.0, 1.0, "311")]);
        assert!(doc.starts_with(r#"{"type":"FeatureCollection""#));
        assert!(doc.contains(r#""code_12":"311""#));
        assert!(doc.contains("[[[0,0],[1,0],[1,1],[0,1],[0,0]]]"));
    }

    #[test]
    fn test_documents_are_xml() {
        for doc in [
            wcs::CAPABILITIES,
            wcs::DESCRIPTION_UTM33,
            wcs::DESCRIPTION_WGS84,
            wcs::NO_SUCH_COVERAGE,
        ] {
            assert!(doc.starts_with("<?xml"));
        }
    }
}
