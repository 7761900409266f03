//! CRS and interpolation URI codecs.
//!
//! WCS 2.0 extensions identify reference systems and interpolation methods by
//! OGC definition URIs. Parsing never fails hard: a URI of a different shape
//! yields `None`, so capabilities can simply skip what they do not understand.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

const SRID_PREFIX: &str = "http://www.opengis.net/def/crs/EPSG/0/";
const INTERPOLATION_PREFIX: &str = "http://www.opengis.net/def/interpolation/OGC/1/";

/// CRS URI of an EPSG code.
pub fn pack_srid(srid: u32) -> String {
    format!("{}{}", SRID_PREFIX, srid)
}

/// EPSG code of a CRS URI, `None` for anything else.
pub fn parse_srid(uri: &str) -> Option<u32> {
    let code = uri.strip_prefix(SRID_PREFIX)?;
    if code.is_empty() || !code.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    code.parse().ok()
}

/// Interpolation URI of a method name.
pub fn pack_interpolation(name: &str) -> String {
    format!("{}{}", INTERPOLATION_PREFIX, name)
}

/// Method name of an interpolation URI, `None` for anything else.
pub fn parse_interpolation(uri: &str) -> Option<String> {
    let name = uri.strip_prefix(INTERPOLATION_PREFIX)?;
    if name.is_empty() || name.contains('/') {
        return None;
    }
    Some(name.to_string())
}

/// Interpolation methods accepted for resampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Interpolation {
    #[default]
    NearestNeighbour,
    Average,
    Bilinear,
    Cubic,
    CubicSpline,
    Lanczos,
    Mode,
}

impl Interpolation {
    pub const ALL: [Interpolation; 7] = [
        Interpolation::NearestNeighbour,
        Interpolation::Average,
        Interpolation::Bilinear,
        Interpolation::Cubic,
        Interpolation::CubicSpline,
        Interpolation::Lanczos,
        Interpolation::Mode,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Interpolation::NearestNeighbour => "nearest-neighbour",
            Interpolation::Average => "average",
            Interpolation::Bilinear => "bilinear",
            Interpolation::Cubic => "cubic",
            Interpolation::CubicSpline => "cubic-spline",
            Interpolation::Lanczos => "lanczos",
            Interpolation::Mode => "mode",
        }
    }

    pub fn uri(&self) -> String {
        pack_interpolation(self.name())
    }
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Interpolation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Interpolation::ALL
            .iter()
            .copied()
            .find(|method| method.name() == s)
            .ok_or_else(|| {
                format!(
                    "unknown interpolation method '{}', expected one of: {}",
                    s,
                    Interpolation::ALL.map(|m| m.name()).join(", ")
                )
            })
    }
}
