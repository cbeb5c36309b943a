//! Evaluation score records

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Externally computed quality score for a trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationRecord {
    #[serde(default)]
    pub trace_id: Option<String>,
    pub evaluation_name: String,
    #[serde(default)]
    pub score_value: Option<f64>,
}

impl EvaluationRecord {
    /// Score value if present and finite
    pub fn finite_score(&self) -> Option<f64> {
        self.score_value.filter(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_null_fields() {
        let record: EvaluationRecord = serde_json::from_str(
            r#"{"traceId": null, "evaluationName": "relevance", "scoreValue": null}"#,
        )
        .unwrap();
        assert_eq!(record.trace_id, None);
        assert_eq!(record.score_value, None);
        assert_eq!(record.evaluation_name, "relevance");
    }

    #[test]
    fn test_finite_score() {
        let mut record = EvaluationRecord {
            trace_id: Some("t1".to_string()),
            evaluation_name: "relevance".to_string(),
            score_value: Some(0.5),
        };
        assert_eq!(record.finite_score(), Some(0.5));
        record.score_value = Some(f64::NAN);
        assert_eq!(record.finite_score(), None);
        record.score_value = None;
        assert_eq!(record.finite_score(), None);
    }
}
