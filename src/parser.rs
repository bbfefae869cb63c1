//! Model Response Parser
//!
//! Models are chatty: they wrap values in quotes and JSON in prose.
//! These helpers recover the payload.

use serde_json::Value;

use crate::error::ProviderError;
use crate::providers::FieldValues;

const QUOTES: [char; 3] = ['"', '\'', '`'];

/// Clean a raw suggestion: trim, drop one leading and one trailing quote, trim again
///
/// Returns `None` when nothing is left.
pub fn clean_suggestion(raw: &str) -> Option<String> {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix(&QUOTES[..]) {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix(&QUOTES[..]) {
        text = rest;
    }
    let text = text.trim();

    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Find the first balanced `{...}` substring
///
/// Braces inside JSON string literals are ignored.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Parse the first JSON object embedded in free text
pub fn parse_object_from_text(text: &str) -> Result<FieldValues, ProviderError> {
    let json = extract_json_object(text)
        .ok_or_else(|| ProviderError::invalid_response("No JSON object in model output"))?;

    match serde_json::from_str::<Value>(json) {
        Ok(Value::Object(map)) => Ok(map.into_iter().collect()),
        Ok(_) => Err(ProviderError::invalid_response("Model output is not a JSON object")),
        Err(e) => Err(ProviderError::invalid_response(format!(
            "Failed to parse model JSON: {}",
            e
        ))),
    }
}

/// Normalize an `autofillData` payload that may be an object or a JSON-encoded string
pub fn normalize_autofill_payload(payload: Value) -> Result<FieldValues, ProviderError> {
    match payload {
        Value::Object(map) => Ok(map.into_iter().collect()),
        Value::String(s) => match serde_json::from_str::<Value>(&s) {
            Ok(Value::Object(map)) => Ok(map.into_iter().collect()),
            Ok(_) => Err(ProviderError::invalid_response(
                "autofillData string does not encode an object",
            )),
            // Servers proxying a model sometimes pass its prose through
            Err(_) => parse_object_from_text(&s),
        },
        Value::Null => Err(ProviderError::empty("autofillData missing")),
        other => Err(ProviderError::invalid_response(format!(
            "Unexpected autofillData type: {}",
            other
        ))),
    }
}
