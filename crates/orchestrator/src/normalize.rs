//! Turning raw model replies into something the caller can trust.
//!
//! Replies are untrusted text. JSON contracts go through [`extract_payload`];
//! yes/no checks go through [`is_valid_verdict`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Result of reading a JSON reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Structured(Value),
    Malformed(String),
}

impl Payload {
    /// Deserialize the structured payload into `T`.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, String> {
        match self {
            Payload::Structured(value) => {
                serde_json::from_value(value).map_err(|e| format!("unexpected shape: {}", e))
            }
            Payload::Malformed(reason) => Err(reason),
        }
    }
}

/// Remove a surrounding Markdown code fence (```` ```json ```` or ```` ``` ````).
///
/// The closing fence is only stripped when an opening fence was present.
pub fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let body = if let Some(rest) = trimmed.strip_prefix("```json") {
        rest
    } else if let Some(rest) = trimmed.strip_prefix("```") {
        rest
    } else {
        return trimmed;
    };
    let body = body.trim_start();
    body.strip_suffix("```").unwrap_or(body).trim_end()
}

/// Shared parse step for every JSON-expecting operation.
pub fn extract_payload(reply: &str) -> Payload {
    let cleaned = strip_code_fence(reply);
    match serde_json::from_str::<Value>(cleaned) {
        Ok(value @ Value::Object(_)) => Payload::Structured(value),
        Ok(other) => Payload::Malformed(format!("expected a JSON object, got {}", kind(&other))),
        Err(e) => Payload::Malformed(format!("invalid JSON: {}", e)),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A VALID/INVALID reply counts as valid only if it says VALID and never
/// says INVALID anywhere.
pub fn is_valid_verdict(reply: &str) -> bool {
    let upper = reply.trim().to_uppercase();
    upper.contains("VALID") && !upper.contains("INVALID")
}

/// Deserialize a field, falling back to its default when the model sent
/// `null` or the wrong type.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Confidence scores arrive as numbers or numeric strings ("85", "85%").
pub(crate) fn confidence<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    })
}
