use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Completed AI summary for one contact. Also the output schema handed to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SummaryResult {
    /// 2-3 sentence summary of client status
    pub summary: String,
    /// Suggested escalation message for unresponsive clients
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalation: Option<String>,
}

/// A summary as it streams in. Any field may still be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalation: Option<String>,
}

impl PartialSummary {
    pub fn has_summary(&self) -> bool {
        self.summary.as_deref().is_some_and(|s| !s.is_empty())
    }
}

impl From<SummaryResult> for PartialSummary {
    fn from(result: SummaryResult) -> Self {
        Self {
            summary: Some(result.summary),
            escalation: result.escalation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escalation_is_omitted_when_absent() {
        let result = SummaryResult {
            summary: "On track.".to_string(),
            escalation: None,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json, serde_json::json!({ "summary": "On track." }));
    }

    #[test]
    fn test_summary_is_required_when_deserializing() {
        let result: Result<SummaryResult, _> =
            serde_json::from_value(serde_json::json!({ "escalation": "Call me" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_partial_summary_accepts_empty_object() {
        let partial: PartialSummary = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(partial, PartialSummary::default());
        assert!(!partial.has_summary());
    }

    #[test]
    fn test_blank_summary_does_not_count() {
        let partial = PartialSummary {
            summary: Some(String::new()),
            escalation: None,
        };
        assert!(!partial.has_summary());
    }

    #[test]
    fn test_schema_lists_both_fields_and_requires_summary() {
        let schema = serde_json::to_value(schemars::schema_for!(SummaryResult)).unwrap();
        assert!(schema["properties"]["summary"].is_object());
        assert!(schema["properties"]["escalation"].is_object());
        let required = schema["required"].as_array().unwrap();
        assert!(required.iter().any(|v| v == "summary"));
        assert!(!required.iter().any(|v| v == "escalation"));
    }
}
