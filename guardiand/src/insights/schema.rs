use super::error::InsightError;
use jsonschema::JSONSchema;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const TOOL_NAME: &str = "provide_health_insights";
pub const TOOL_DESCRIPTION: &str = "Provide health analysis summary and recommendations";

/// Parameters of the forced tool call. The same schema validates the
/// arguments that come back.
pub static INSIGHT_PARAMETERS: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "summary": {
                "type": "string",
                "description": "A brief summary of current health status"
            },
            "recommendation": {
                "type": "string",
                "description": "Specific actionable recommendations for the caregiver"
            }
        },
        "required": ["summary", "recommendation"],
        "additionalProperties": false
    })
});

static INSIGHT_VALIDATOR: Lazy<JSONSchema> = Lazy::new(|| {
    JSONSchema::compile(&INSIGHT_PARAMETERS).expect("insight tool schema must compile")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub summary: String,
    pub recommendation: String,
}

/// Pull the insight out of a chat completion whose first choice carries the
/// forced tool call.
pub fn extract_insight(completion: &Value) -> Result<Insight, InsightError> {
    let message = completion
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .ok_or_else(|| InsightError::Malformed("completion missing choices".to_string()))?;

    let arguments = message
        .get("tool_calls")
        .and_then(|calls| calls.as_array())
        .and_then(|calls| calls.first())
        .and_then(|call| call.get("function"))
        .and_then(|function| function.get("arguments"))
        .ok_or(InsightError::NoInsights)?;

    // Arguments normally arrive as a JSON-encoded string; some gateways
    // inline the object.
    let arguments = match arguments {
        Value::String(raw) => serde_json::from_str::<Value>(raw)
            .map_err(|e| InsightError::Malformed(format!("arguments are not JSON: {e}")))?,
        Value::Object(_) => arguments.clone(),
        _ => return Err(InsightError::NoInsights),
    };

    parse_and_validate(arguments)
}

pub fn parse_and_validate(arguments: Value) -> Result<Insight, InsightError> {
    if let Err(errors) = INSIGHT_VALIDATOR.validate(&arguments) {
        let reasons = errors.map(|e| e.to_string()).collect::<Vec<_>>();
        return Err(InsightError::Malformed(reasons.join("; ")));
    }

    let insight: Insight =
        serde_json::from_value(arguments).map_err(|e| InsightError::Malformed(e.to_string()))?;

    if insight.summary.trim().is_empty() {
        return Err(InsightError::Malformed("summary is empty".to_string()));
    }
    if insight.recommendation.trim().is_empty() {
        return Err(InsightError::Malformed("recommendation is empty".to_string()));
    }
    Ok(insight)
}
