//! REST API types for dashboard integration.
//!
//! Dense rows are returned as-is; the dashboard table binds directly to the
//! cell and performance keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::{Direction, PerformanceBand, Style};
use crate::transform::performance::Thresholds;
use crate::transform::pipeline::ScorecardResult;
use crate::transform::pivot::DenseRow;
use crate::transform::scope::{DimensionScope, QueryParams};
use crate::transform::summary::PeriodSummary;

/// Response sent after building a scorecard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorecardResponse {
    /// Unique job identifier
    pub job_id: String,

    /// Status: "ready", "empty", "error"
    pub status: String,

    pub generated_at: DateTime<Utc>,

    /// One dense row per in-scope element
    pub rows: Vec<DenseRow>,

    pub summaries: Vec<PeriodSummary>,

    pub metadata: ResponseMetadata,
}

/// Metadata about the run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub total_rows: usize,
    pub periods: Vec<String>,
    pub dimensions: Vec<String>,
    pub scope: DimensionScope,
    pub query: QueryParams,
    pub skipped_rows: usize,
    /// Taxonomy problems that emptied the dataset
    pub errors: Vec<String>,
}

impl From<ScorecardResult> for ScorecardResponse {
    fn from(result: ScorecardResult) -> Self {
        let status = if !result.errors.is_empty() {
            "error"
        } else if result.rows.is_empty() {
            "empty"
        } else {
            "ready"
        };

        ScorecardResponse {
            job_id: Uuid::new_v4().to_string(),
            status: status.to_string(),
            generated_at: Utc::now(),
            metadata: ResponseMetadata {
                total_rows: result.rows.len(),
                periods: result.periods,
                dimensions: result.dimensions,
                scope: result.scope,
                query: result.query,
                skipped_rows: result.skipped_rows,
                errors: result.errors,
            },
            rows: result.rows,
            summaries: result.summaries,
        }
    }
}

/// Body of `POST /api/classify`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyRequest {
    /// Raw values as found in analytics rows; blank means missing.
    #[serde(default)]
    pub actual: String,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub descending: bool,
    pub thresholds: Option<Thresholds>,
}

/// Result of `POST /api/classify`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyResponse {
    /// `null` when no ratio could be computed
    pub ratio: Option<f64>,
    pub performance: String,
    pub band: PerformanceBand,
    pub style: Style,
    pub direction: Direction,
}

/// Result of `POST /api/validate`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub valid: bool,
    pub group_sets: usize,
    pub errors: Vec<String>,
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
        "rows": [],
        "summaries": [],
        "metadata": {
            "totalRows": 0,
            "errors": [error]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn result(rows: usize, errors: Vec<String>) -> ScorecardResult {
        ScorecardResult {
            scope: DimensionScope::default(),
            query: QueryParams::default(),
            periods: vec!["2024Q1".into()],
            dimensions: vec!["target".into(), "actual".into()],
            records: BTreeMap::new(),
            rows: (0..rows).map(|_| DenseRow::new()).collect(),
            summaries: vec![],
            errors,
            skipped_rows: 0,
        }
    }

    #[test]
    fn test_status() {
        assert_eq!(ScorecardResponse::from(result(2, vec![])).status, "ready");
        assert_eq!(ScorecardResponse::from(result(0, vec![])).status, "empty");
        assert_eq!(ScorecardResponse::from(result(0, vec!["bad".into()])).status, "error");
    }

    #[test]
    fn test_response_shape() {
        let json = serde_json::to_value(ScorecardResponse::from(result(1, vec![]))).unwrap();
        assert_eq!(json["metadata"]["totalRows"], 1);
        assert_eq!(json["metadata"]["periods"][0], "2024Q1");
        assert!(json["jobId"].as_str().is_some());
        assert!(json["generatedAt"].as_str().is_some());
    }

    #[test]
    fn test_error_response() {
        let json = error_response("boom");
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "boom");
        assert_eq!(json["rows"].as_array().unwrap().len(), 0);
    }
}
