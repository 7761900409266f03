//! Coordinate Reference System identifiers.
//!
//! Rasters, vector layers and the coverage service refer to reference systems
//! in different ways: bare EPSG codes, `EPSG:xxxx` strings, OGC URNs/URIs or
//! full PROJ strings. Everything is normalised to [`Crs`] at the boundary.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A reference system identified either by EPSG code or by opaque
/// projection text (a PROJ string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Crs {
    Epsg(u32),
    Proj(String),
}

/// EPSG codes of geographic (lat/lon) systems known to the pipeline.
const GEOGRAPHIC_CODES: &[u32] = &[4326, 4258, 4269, 4267, 4019];

impl Crs {
    /// WGS84 geographic coordinates.
    pub const WGS84: Crs = Crs::Epsg(4326);

    /// Parse any of the textual forms a reference system shows up in.
    ///
    /// Accepts formats like:
    /// - "EPSG:4326", "epsg:4326"
    /// - "CRS:84", "OGC:CRS84" (treated as EPSG:4326)
    /// - "urn:ogc:def:crs:EPSG::3035"
    /// - "http://www.opengis.net/def/crs/EPSG/0/32633"
    /// - "+proj=utm +zone=33 +datum=WGS84"
    pub fn from_user_string(s: &str) -> Result<Self, CrsParseError> {
        let s = s.trim();
        if s.starts_with('+') {
            return Ok(Crs::Proj(s.to_string()));
        }

        let upper = s.to_uppercase();
        if upper == "CRS:84" || upper == "OGC:CRS84" || upper.ends_with("OGC:1.3:CRS84") {
            return Ok(Crs::WGS84);
        }

        let code = if let Some(rest) = upper.strip_prefix("EPSG:") {
            rest
        } else if let Some(rest) = upper.strip_prefix("URN:OGC:DEF:CRS:EPSG:") {
            // version field between the colons may be empty
            rest.rsplit(':').next().unwrap_or(rest)
        } else if let Some(rest) = upper.strip_prefix("HTTP://WWW.OPENGIS.NET/DEF/CRS/EPSG/") {
            rest.rsplit('/').next().unwrap_or(rest)
        } else {
            return Err(CrsParseError::UnsupportedCrs(s.to_string()));
        };

        code.parse::<u32>()
            .map(Crs::Epsg)
            .map_err(|_| CrsParseError::UnsupportedCrs(s.to_string()))
    }

    /// The EPSG code, when the system is identified by one.
    pub fn epsg(&self) -> Option<u32> {
        match self {
            Crs::Epsg(code) => Some(*code),
            Crs::Proj(_) => None,
        }
    }

    /// Check if this is a geographic (lat/lon) CRS.
    pub fn is_geographic(&self) -> bool {
        match self {
            Crs::Epsg(code) => GEOGRAPHIC_CODES.contains(code),
            Crs::Proj(text) => text.contains("+proj=longlat") || text.contains("+proj=latlong"),
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Crs::Epsg(code) => write!(f, "EPSG:{}", code),
            Crs::Proj(text) => write!(f, "{}", text),
        }
    }
}

impl From<u32> for Crs {
    fn from(code: u32) -> Self {
        Crs::Epsg(code)
    }
}

impl TryFrom<String> for Crs {
    type Error = CrsParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Crs::from_user_string(&value)
    }
}

impl From<Crs> for String {
    fn from(crs: Crs) -> Self {
        crs.to_string()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),
}
