//! Classification of Unity error responses.
//!
//! Unity rarely signals failure through HTTP status codes. Errors come back
//! in the body instead, in one of a few loosely defined shapes. The checks
//! here match those shapes as the service actually produces them and are
//! deliberately literal: only the first array element is inspected and the
//! `error:` match is case-sensitive.

use serde_json::Value;

/// Message used when Unity answers with nothing at all.
pub const EMPTY_RESPONSE: &str = "Response was empty";

/// An error reported by the Unity service itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    message: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The vendor's error message, verbatim.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Unity API error: {}", self.message)
    }
}

impl std::error::Error for ApiError {}

/// A response body before classification.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResponse {
    /// No body.
    Empty,
    /// A body that parsed as JSON.
    Json(Value),
    /// A plain text body, or a JSON string already unquoted.
    Text(String),
}

impl RawResponse {
    /// Interprets a body that may be JSON or plain text.
    ///
    /// A JSON string becomes [`RawResponse::Text`] holding the unquoted value.
    pub fn from_body(body: &str) -> Self {
        if body.trim().is_empty() {
            return RawResponse::Empty;
        }

        match serde_json::from_str::<Value>(body) {
            Ok(Value::String(text)) => RawResponse::Text(text),
            Ok(value) => RawResponse::Json(value),
            Err(_) => RawResponse::Text(body.to_string()),
        }
    }
}

/// Fails with an [`ApiError`] when `response` has one of Unity's error shapes.
pub fn check_response(response: &RawResponse) -> Result<(), ApiError> {
    match response {
        RawResponse::Empty | RawResponse::Json(Value::Null) => Err(ApiError::new(EMPTY_RESPONSE)),
        RawResponse::Json(Value::Array(items)) => match items.first().and_then(|i| i.get("Error")) {
            None | Some(Value::Null) => Ok(()),
            Some(Value::String(message)) => Err(ApiError::new(message.as_str())),
            Some(other) => Err(ApiError::new(other.to_string())),
        },
        RawResponse::Json(Value::String(text)) | RawResponse::Text(text) => {
            if text.contains("error:") {
                Err(ApiError::new(text.as_str()))
            } else {
                Ok(())
            }
        }
        RawResponse::Json(_) => Ok(()),
    }
}
