//! Turning the oracle's raw text into a typed `AssessmentResult`.
//!
//! Decoding runs in two phases:
//!
//! 1. **Syntax**: the text must be a JSON document. Blank text is an
//!    `EmptyResponse`; anything unparseable is a `MalformedResponse`.
//! 2. **Shape**: the document is validated against
//!    [`validation_schema`](crate::prompt::validation_schema) with the
//!    `jsonschema` crate. All violations are collected into one
//!    `MalformedResponse` so the log shows the full picture.

use serde_json::Value;
use tracing::{debug, warn};

use dishdose_contracts::{assessment::AssessmentResult, error::OracleError};

use crate::prompt::validation_schema;

/// Decode the oracle's text answer.
pub fn decode_assessment(text: &str) -> Result<AssessmentResult, OracleError> {
    let body = strip_code_fence(text.trim());
    if body.is_empty() {
        return Err(OracleError::EmptyResponse);
    }

    let value: Value = serde_json::from_str(body).map_err(|e| OracleError::MalformedResponse {
        reason: format!("response is not valid JSON: {}", e),
    })?;

    let violations = schema_violations(&value);
    if !violations.is_empty() {
        let reason = violations.join("; ");
        warn!(%reason, "oracle response failed schema validation");
        return Err(OracleError::MalformedResponse { reason });
    }

    let result: AssessmentResult =
        serde_json::from_value(value).map_err(|e| OracleError::MalformedResponse {
            reason: format!("response does not match the assessment shape: {}", e),
        })?;
    debug!(status = %result.status, severity = %result.severity, "oracle response decoded");
    Ok(result)
}

/// Every way `value` departs from the validation schema, as readable lines.
pub fn schema_violations(value: &Value) -> Vec<String> {
    let schema = validation_schema();
    match jsonschema::validator_for(&schema) {
        Ok(validator) => validator
            .iter_errors(value)
            .map(|error| format!("at '{}': {}", error.instance_path, error))
            .collect(),
        // Only reachable if the constant schema itself is broken.
        Err(e) => vec![format!("invalid validation schema: {}", e)],
    }
}

/// Remove a surrounding Markdown code fence such as ```` ```json ... ``` ````.
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (e.g. "json") on the opening line.
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => "",
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}
