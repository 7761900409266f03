//! Spatio-temporal selection of a satellite image time series.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::bbox::BoundingBox;
use crate::error::{SitsError, SitsResult};

/// Area of interest in EPSG:4326 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aoi {
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
    pub top: f64,
}

impl Aoi {
    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::new(self.left, self.bottom, self.right, self.top)
    }
}

/// Time of interest, both bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toi {
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub start: DateTime<Utc>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub end: DateTime<Utc>,
}

impl Toi {
    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        time >= self.start && time <= self.end
    }
}

/// Selection stored with every time series: where and when.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub aoi: Aoi,
    pub toi: Toi,
}

impl Selection {
    /// Build a validated selection.
    pub fn new(aoi: Aoi, toi: Toi) -> SitsResult<Self> {
        let selection = Self { aoi, toi };
        selection.validate()?;
        Ok(selection)
    }

    /// Parse the JSON document a time series carries and validate it.
    pub fn from_json(s: &str) -> SitsResult<Self> {
        let selection: Selection = serde_json::from_str(s)?;
        selection.validate()?;
        Ok(selection)
    }

    /// Check the ordering of both the spatial and the temporal bounds.
    pub fn validate(&self) -> SitsResult<()> {
        let aoi = &self.aoi;
        if !(aoi.left < aoi.right) {
            return Err(SitsError::InvalidSelection(format!(
                "AOI left ({}) must be less than right ({})",
                aoi.left, aoi.right
            )));
        }
        if !(aoi.bottom < aoi.top) {
            return Err(SitsError::InvalidSelection(format!(
                "AOI bottom ({}) must be less than top ({})",
                aoi.bottom, aoi.top
            )));
        }
        if self.toi.start > self.toi.end {
            return Err(SitsError::InvalidSelection(format!(
                "TOI start ({}) is after end ({})",
                self.toi.start.to_rfc3339(),
                self.toi.end.to_rfc3339()
            )));
        }
        Ok(())
    }
}

/// Parse a timestamp in any of the accepted forms.
///
/// Supports:
/// - RFC 3339: "2016-05-01T10:20:30Z", "2016-05-01T12:20:30+02:00"
/// - naive datetime (UTC assumed): "2016-05-01T10:20:30"
/// - date only (midnight UTC): "2016-05-01"
pub fn parse_timestamp(s: &str) -> SitsResult<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for pattern in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, pattern) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    if let Some(ndt) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(Utc.from_utc_datetime(&ndt));
    }

    Err(SitsError::InvalidSelection(format!("Invalid timestamp: {}", s)))
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}
