use serde_json::{Map, Value};

use crate::ScrapeError;

/// Provider result payload, decoded by shape but otherwise uninterpreted.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResult {
    /// A sequence of opaque records (`[..]` or `{"items": [..]}`).
    Records(Vec<Value>),
    /// A single error-shaped object.
    Error(Map<String, Value>),
}

impl RawResult {
    /// Decodes one of the three accepted payload shapes.
    pub fn decode(payload: Value) -> Result<Self, ScrapeError> {
        let payload = match decode_list(payload) {
            Ok(raw) => return Ok(raw),
            Err(payload) => payload,
        };
        let payload = match decode_items(payload) {
            Ok(raw) => return Ok(raw),
            Err(payload) => payload,
        };
        let payload = match decode_error(payload) {
            Ok(raw) => return Ok(raw),
            Err(payload) => payload,
        };
        Err(ScrapeError::MalformedResponse(format!(
            "unexpected result payload: {}",
            describe(&payload)
        )))
    }
}

fn decode_list(payload: Value) -> Result<RawResult, Value> {
    match payload {
        Value::Array(items) => Ok(RawResult::Records(items)),
        other => Err(other),
    }
}

fn decode_items(payload: Value) -> Result<RawResult, Value> {
    match payload {
        Value::Object(mut map) if map.get("items").is_some_and(Value::is_array) => {
            match map.remove("items") {
                Some(Value::Array(items)) => Ok(RawResult::Records(items)),
                _ => Err(Value::Object(map)),
            }
        }
        other => Err(other),
    }
}

fn decode_error(payload: Value) -> Result<RawResult, Value> {
    match payload {
        Value::Object(map) if error_marker(&map).is_some() => Ok(RawResult::Error(map)),
        other => Err(other),
    }
}

/// Message of an embedded "no data" marker, if the object carries one.
///
/// `null`, `false`, blank strings and empty containers under `error` or
/// `errorDescription` are not markers.
pub(crate) fn error_marker(map: &Map<String, Value>) -> Option<String> {
    let mut flagged = false;
    for value in [map.get("errorDescription"), map.get("error")]
        .into_iter()
        .flatten()
    {
        match value {
            Value::Null | Value::Bool(false) => {}
            Value::Bool(true) => flagged = true,
            Value::String(s) if s.trim().is_empty() => {}
            Value::String(s) => return Some(s.trim().to_string()),
            Value::Array(items) if items.is_empty() => {}
            Value::Object(fields) if fields.is_empty() => {}
            other => return Some(other.to_string()),
        }
    }
    flagged.then(|| "no data".to_string())
}

fn describe(value: &Value) -> String {
    let kind = match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    let mut text = value.to_string();
    if text.len() > 120 {
        let cut = (0..=120).rev().find(|i| text.is_char_boundary(*i)).unwrap_or(0);
        text.truncate(cut);
        text.push_str("...");
    }
    format!("{kind} {text}")
}
