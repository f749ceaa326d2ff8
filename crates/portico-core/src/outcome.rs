use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, ErrorKind};
use crate::record::ExtractedRecord;

/// Result of a login request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<Value>,
}

impl AuthResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            error_kind: None,
            error: None,
            diagnostics: None,
        }
    }

    pub fn failed(err: &Error) -> Self {
        Self {
            success: false,
            error_kind: Some(err.kind()),
            error: Some(err.to_string()),
            diagnostics: err.diagnostics(),
        }
    }
}

impl From<crate::Result<()>> for AuthResult {
    fn from(result: crate::Result<()>) -> Self {
        match result {
            Ok(()) => AuthResult::ok(),
            Err(e) => AuthResult::failed(&e),
        }
    }
}

/// Result of a record fetch; `data` is empty on failure
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchResult {
    pub success: bool,
    pub data: Vec<ExtractedRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<crate::Result<Vec<ExtractedRecord>>> for FetchResult {
    fn from(result: crate::Result<Vec<ExtractedRecord>>) -> Self {
        match result {
            Ok(data) => Self {
                success: true,
                data,
                error_kind: None,
                error: None,
            },
            Err(e) => Self {
                success: false,
                data: Vec::new(),
                error_kind: Some(e.kind()),
                error: Some(e.to_string()),
            },
        }
    }
}
