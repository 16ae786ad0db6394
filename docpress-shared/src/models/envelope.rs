//! Response envelope shared by every endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status code the backend uses for a successful call.
pub const SUCCESS_CODE: i64 = 0;

/// Uniform response envelope wrapped around every JSON payload.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ApiResponse<T = Value> {
    /// Application status; `0` on success.
    pub code: i64,
    /// Human readable status message.
    #[serde(default)]
    pub message: String,
    /// Payload, present on most successful calls.
    pub data: Option<T>,
    /// Extra diagnostic information from validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
}

impl<T> ApiResponse<T> {
    /// Creates a successful envelope carrying `data`.
    #[must_use]
    pub fn ok(data: T) -> Self {
        Self {
            code: SUCCESS_CODE,
            message: "ok".to_string(),
            data: Some(data),
            detail: None,
        }
    }

    /// Creates a failed envelope with the given application code.
    #[must_use]
    pub fn failure(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
            detail: None,
        }
    }

    /// Returns `true` when the backend reported success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }
}

impl<T> std::fmt::Display for ApiResponse<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

/// Error body shape produced by the backend's HTTP exception handlers.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ErrorBody {
    /// Message set by the application's own handlers.
    #[serde(default)]
    pub message: Option<String>,
    /// Framework-level detail, a string or a list of validation errors.
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ErrorBody {
    /// Best-effort human readable description of the failure.
    #[must_use]
    pub fn describe(&self) -> Option<String> {
        if let Some(message) = self.message.as_ref().filter(|m| !m.is_empty()) {
            return Some(message.clone());
        }
        match &self.detail {
            Some(Value::String(text)) => Some(text.clone()),
            Some(other) => Some(other.to_string()),
            None => None,
        }
    }
}
