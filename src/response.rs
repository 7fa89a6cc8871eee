//! Normalized view over a decoded API response.
//!
//! The API answers with `{ "metadata": {...}, "data": {...} }`. A response is
//! valid when `data` is present and carries no `error` object. Fields set to
//! JSON `null` count as absent.

use serde_json::Value;

/// Wrapper around a decoded JSON payload with a single validity rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseEnvelope {
    payload: Value,
}

impl ResponseEnvelope {
    pub fn new(payload: Value) -> Self {
        Self { payload }
    }

    /// Decode a raw body. Undecodable text yields a `null` payload, which is
    /// always invalid.
    pub fn from_body(body: &str) -> Self {
        Self::new(serde_json::from_str(body).unwrap_or(Value::Null))
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn into_payload(self) -> Value {
        self.payload
    }

    pub fn is_valid(&self) -> bool {
        self.data().is_some() && field(self.data(), "error").is_none()
    }

    /// `metadata.objectId`, the session correlation token.
    pub fn object_id(&self) -> Option<String> {
        field(self.metadata(), "objectId").and_then(scalar_to_string)
    }

    /// `metadata.code`, or 0 when missing or not numeric.
    pub fn error_code(&self) -> i64 {
        match field(self.metadata(), "code") {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .unwrap_or_default(),
            Some(Value::String(s)) => {
                let s = s.trim();
                s.parse()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
                    .unwrap_or_default()
            }
            _ => 0,
        }
    }

    /// `data.error.description`, or an empty string.
    pub fn error_description(&self) -> String {
        field(self.error(), "description")
            .and_then(scalar_to_string)
            .unwrap_or_default()
    }

    /// `data.error.details`; structured details are rendered as JSON text.
    pub fn error_debug_info(&self) -> Option<String> {
        field(self.error(), "details").and_then(scalar_to_string)
    }

    pub(crate) fn metadata(&self) -> Option<&Value> {
        field(Some(&self.payload), "metadata")
    }

    pub(crate) fn data(&self) -> Option<&Value> {
        field(Some(&self.payload), "data")
    }

    fn error(&self) -> Option<&Value> {
        field(self.data(), "error")
    }
}

impl From<Value> for ResponseEnvelope {
    fn from(payload: Value) -> Self {
        Self::new(payload)
    }
}

/// Non-null member lookup on an optional object.
pub(crate) fn field<'a>(parent: Option<&'a Value>, key: &str) -> Option<&'a Value> {
    parent.and_then(|v| v.get(key)).filter(|v| !v.is_null())
}

pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
