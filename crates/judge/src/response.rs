//! Reading verdict payloads returned by judge services.

use serde_json::Value;

use crate::error::JudgeError;
use crate::types::{ImpactLevel, JudgeVerdict};

/// Confidence assumed when the service omits one.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Rationale used when the service returns an impact without one.
pub fn default_rationale(impact: ImpactLevel) -> &'static str {
    match impact {
        ImpactLevel::Critical => "affects financial, legal or contractual meaning",
        ImpactLevel::Medium => "changes meaning; review recommended",
        ImpactLevel::Low => "no business impact",
    }
}

/// Removes a surrounding Markdown code fence (```` ```json ... ``` ````).
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (`json`) on the opening line.
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().trim_end_matches("```").trim()
}

/// Reads `{impact, rationale?, confidence?}` from a JSON value.
///
/// A single-element array is unwrapped, since chat models often answer
/// with a list.
pub fn parse_verdict(value: &Value) -> Result<JudgeVerdict, JudgeError> {
    let object = match value {
        Value::Object(map) => map,
        Value::Array(items) if items.len() == 1 => return parse_verdict(&items[0]),
        other => {
            return Err(JudgeError::MalformedResponse(format!(
                "expected a verdict object, got {}",
                kind_of(other)
            )));
        }
    };

    let impact: ImpactLevel = match object.get("impact") {
        Some(Value::String(raw)) => raw.parse()?,
        Some(other) => {
            return Err(JudgeError::MalformedResponse(format!(
                "impact must be a string, got {}",
                kind_of(other)
            )));
        }
        None => return Err(JudgeError::MalformedResponse("missing impact".into())),
    };

    let rationale = match object.get("rationale").or_else(|| object.get("reason")) {
        Some(Value::String(text)) if !text.trim().is_empty() => text.trim().to_string(),
        _ => default_rationale(impact).to_string(),
    };

    let confidence = match object.get("confidence") {
        None | Some(Value::Null) => DEFAULT_CONFIDENCE,
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| {
            JudgeError::MalformedResponse(format!("confidence out of range: {n}"))
        })?,
        Some(other) => {
            return Err(JudgeError::MalformedResponse(format!(
                "confidence must be a number, got {}",
                kind_of(other)
            )));
        }
    };

    JudgeVerdict::new(impact, rationale, confidence).validated()
}

/// Parses free text (possibly fenced) as a verdict.
pub fn parse_verdict_text(text: &str) -> Result<JudgeVerdict, JudgeError> {
    let body = strip_code_fences(text);
    let value: Value = serde_json::from_str(body)
        .map_err(|e| JudgeError::MalformedResponse(format!("invalid JSON: {e}")))?;
    parse_verdict(&value)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
