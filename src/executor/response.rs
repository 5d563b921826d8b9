//! Response shape: partial data plus per-field errors

use crate::core::error::ExecutionError;
use serde::Serialize;
use serde_json::Value;

/// An error attributed to the output path of the field that failed
///
/// Paths hold output keys only. Records of one level are fetched as a
/// batch, so a failure applies to the field across the whole batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub message: String,
    pub path: Vec<String>,

    #[serde(skip)]
    pub code: &'static str,
}

impl FieldError {
    pub fn new(error: &ExecutionError, path: Vec<String>) -> Self {
        Self {
            message: error.to_string(),
            path,
            code: error.error_code(),
        }
    }
}

/// Result of executing one request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub data: Value,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl Response {
    /// True when no field failed
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Errors reported under `path`
    pub fn errors_at(&self, path: &[&str]) -> Vec<&FieldError> {
        self.errors
            .iter()
            .filter(|error| error.path.iter().map(String::as_str).eq(path.iter().copied()))
            .collect()
    }
}
