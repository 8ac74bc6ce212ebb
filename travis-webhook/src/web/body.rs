//! Request body decoding.
//!
//! Travis posts `application/x-www-form-urlencoded` bodies, but the relay
//! also accepts JSON so it can be driven by other senders and by tests.
//! Decoding never fails: anything unrecognised becomes an empty object.

use serde_json::{Map, Value};
use tracing::debug;

/// Body encoding, sniffed from the content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    UrlEncoded,
    Json,
}

impl BodyKind {
    /// Classify a `Content-Type` header value.
    ///
    /// Parameters such as `charset` are ignored, as is case. Any `+json`
    /// structured suffix counts as JSON.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        let (kind, subtype) = essence.split_once('/')?;
        match (kind, subtype) {
            ("application", "x-www-form-urlencoded") => Some(BodyKind::UrlEncoded),
            ("application", "json") => Some(BodyKind::Json),
            (_, s) if !kind.is_empty() && s.ends_with("+json") => Some(BodyKind::Json),
            _ => None,
        }
    }
}

/// Decode a request body into a JSON object.
///
/// Returns an empty map for an unknown or missing content type, for bodies
/// that fail to decode, and for JSON bodies that are not objects.
pub fn parse_body(content_type: Option<&str>, body: &[u8]) -> Map<String, Value> {
    let kind = content_type.and_then(BodyKind::from_content_type);
    debug!(content_type = ?content_type, body_kind = ?kind, "request_body_type");

    match kind {
        Some(BodyKind::UrlEncoded) => parse_urlencoded(body),
        Some(BodyKind::Json) => match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                debug!(json_type = json_type(&other), "request_body_not_object");
                Map::new()
            }
            Err(e) => {
                debug!(error = %e, "request_body_json_invalid");
                Map::new()
            }
        },
        None => Map::new(),
    }
}

/// Pull the signed `payload` string out of a decoded body.
pub fn extract_payload(body: &Map<String, Value>) -> Option<&str> {
    body.get("payload")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// First occurrence of a repeated field wins.
fn parse_urlencoded(body: &[u8]) -> Map<String, Value> {
    let mut map = Map::new();
    for (key, value) in url::form_urlencoded::parse(body) {
        map.entry(key.into_owned())
            .or_insert_with(|| Value::String(value.into_owned()));
    }
    map
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
