//! Coverage records of a time series.

use std::cmp::Ordering;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sits_common::{SitsError, SitsResult};

/// One scene of a time series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageRecord {
    pub identifier: String,
    pub begin_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

impl CoverageRecord {
    pub fn new(identifier: impl Into<String>, begin_time: DateTime<Utc>) -> Self {
        Self {
            identifier: identifier.into(),
            begin_time,
            end_time: None,
        }
    }

    /// Acquisition order: begin time, then identifier.
    pub fn acquisition_order(&self, other: &Self) -> Ordering {
        self.begin_time
            .cmp(&other.begin_time)
            .then_with(|| self.identifier.cmp(&other.identifier))
    }
}

/// Coverage identifiers in acquisition order.
pub fn ordered_identifiers(records: &[CoverageRecord]) -> Vec<String> {
    let mut sorted: Vec<&CoverageRecord> = records.iter().collect();
    sorted.sort_by(|a, b| a.acquisition_order(b));
    sorted.into_iter().map(|r| r.identifier.clone()).collect()
}

/// Parse a JSON array of coverage records.
pub fn parse_coverage_records(json: &str) -> SitsResult<Vec<CoverageRecord>> {
    serde_json::from_str(json).map_err(|e| SitsError::InvalidParameter {
        param: "coverages".to_string(),
        message: e.to_string(),
    })
}

pub fn load_coverage_records(path: &Path) -> SitsResult<Vec<CoverageRecord>> {
    parse_coverage_records(&std::fs::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_by_time_then_identifier() {
        let records = parse_coverage_records(
            r#"[
                {"identifier": "S2_C", "begin_time": "2015-07-01T10:00:00Z"},
                {"identifier": "S2_B", "begin_time": "2015-05-01T10:00:00Z"},
                {"identifier": "S2_A", "begin_time": "2015-07-01T10:00:00Z",
                 "end_time": "2015-07-01T10:00:05Z"}
            ]"#,
        )
        .unwrap();

        assert_eq!(ordered_identifiers(&records), vec!["S2_B", "S2_A", "S2_C"]);
        assert!(records[2].end_time.is_some());
    }

    #[test]
    fn test_missing_begin_time_is_rejected() {
        let err = parse_coverage_records(r#"[{"identifier": "X"}]"#).unwrap_err();
        assert!(matches!(err, SitsError::InvalidParameter { ref param, .. } if param == "coverages"));
    }
}
