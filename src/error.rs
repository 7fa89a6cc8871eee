//! Error taxonomy shared by every client operation.
//!
//! Callers are expected to match on the variant and decide their own retry
//! policy; the client never retries internally.

use thiserror::Error;

use crate::response::ResponseEnvelope;

/// Errors returned by [`crate::ApiClient`] operations.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Invalid client configuration (bad base URL, missing upload destination).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No HTTP response was obtained at all.
    #[error("Transport error: {message} (code {code})")]
    Transport { message: String, code: i32 },

    /// The API answered with a status other than 200.
    #[error("API unavailable, HTTP STATUS CODE = {status}")]
    ApiStatus {
        status: u16,
        envelope: Box<ResponseEnvelope>,
    },

    /// The API answered 200 but the payload carries an error object.
    #[error("API error: {description} (code {code})")]
    ApiLogic {
        description: String,
        code: i64,
        debug_info: Option<String>,
        envelope: Box<ResponseEnvelope>,
    },

    /// The catalog archive could not be written.
    #[error("Packaging error: {0}")]
    Packaging(String),

    /// Object storage refused the uploaded archive.
    #[error("Upload rejected: {description} (code {code})")]
    UploadRejected { description: String, code: String },
}

pub type Result<T> = std::result::Result<T, ClientError>;

impl ClientError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn packaging(msg: impl Into<String>) -> Self {
        Self::Packaging(msg.into())
    }

    /// The decoded response that came with an HTTP-level failure, if any.
    ///
    /// Transport failures never carry one.
    pub fn partial_response(&self) -> Option<&ResponseEnvelope> {
        match self {
            Self::ApiStatus { envelope, .. } | Self::ApiLogic { envelope, .. } => Some(envelope),
            _ => None,
        }
    }

    /// Debug details the server attached to the failure.
    pub fn debug_info(&self) -> Option<&str> {
        match self {
            Self::ApiLogic { debug_info, .. } => debug_info.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_partial_response_only_for_http_failures() {
        let envelope = ResponseEnvelope::new(json!({"metadata": {"objectId": "abc"}}));
        let status = ClientError::ApiStatus {
            status: 503,
            envelope: Box::new(envelope.clone()),
        };
        assert_eq!(
            status.partial_response().and_then(|e| e.object_id()),
            Some("abc".to_string())
        );

        let transport = ClientError::Transport {
            message: "connection refused".into(),
            code: 7,
        };
        assert!(transport.partial_response().is_none());
        assert!(ClientError::configuration("bad").partial_response().is_none());
    }

    #[test]
    fn test_display_messages() {
        let err = ClientError::ApiStatus {
            status: 502,
            envelope: Box::new(ResponseEnvelope::new(serde_json::Value::Null)),
        };
        assert_eq!(err.to_string(), "API unavailable, HTTP STATUS CODE = 502");

        let err = ClientError::UploadRejected {
            description: "Access Denied".into(),
            code: "AccessDenied".into(),
        };
        assert_eq!(err.to_string(), "Upload rejected: Access Denied (code AccessDenied)");
    }

    #[test]
    fn test_debug_info_from_logic_error() {
        let err = ClientError::ApiLogic {
            description: "bad query".into(),
            code: 400,
            debug_info: Some("trace-1".into()),
            envelope: Box::new(ResponseEnvelope::new(serde_json::Value::Null)),
        };
        assert_eq!(err.debug_info(), Some("trace-1"));
        assert!(err.partial_response().is_some());
    }
}
