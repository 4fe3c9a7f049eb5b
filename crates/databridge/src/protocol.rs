// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Request/response messages of the bridge protocol.
//!
//! JSON-based, one message per line.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Client -> bridge request.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Request {
    pub command: String,
    #[serde(default = "empty_params")]
    pub params: Value,
}

fn empty_params() -> Value {
    Value::Object(Map::new())
}

impl Request {
    pub fn new(command: impl Into<String>, params: Value) -> Self {
        Self {
            command: command.into(),
            params,
        }
    }
}

/// Error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    TableNotFound,
    RowNotFound,
    AssetNotFound,
    RowAlreadyExists,
    /// Missing or malformed parameter
    InvalidField,
    InvalidValue,
    /// Row or asset type is not registered
    InvalidStructType,
    SerializationError,
    UnknownCommand,
    CompositeWriteBlocked,
    BatchLimitExceeded,
    BatchRecursionBlocked,
    /// Undecodable request line
    InvalidRequest,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TableNotFound => "TABLE_NOT_FOUND",
            Self::RowNotFound => "ROW_NOT_FOUND",
            Self::AssetNotFound => "ASSET_NOT_FOUND",
            Self::RowAlreadyExists => "ROW_ALREADY_EXISTS",
            Self::InvalidField => "INVALID_FIELD",
            Self::InvalidValue => "INVALID_VALUE",
            Self::InvalidStructType => "INVALID_STRUCT_TYPE",
            Self::SerializationError => "SERIALIZATION_ERROR",
            Self::UnknownCommand => "UNKNOWN_COMMAND",
            Self::CompositeWriteBlocked => "COMPOSITE_WRITE_BLOCKED",
            Self::BatchLimitExceeded => "BATCH_LIMIT_EXCEEDED",
            Self::BatchRecursionBlocked => "BATCH_RECURSION_BLOCKED",
            Self::InvalidRequest => "INVALID_REQUEST",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error payload of a failed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Bridge -> client response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    #[serde(default)]
    pub warnings: Vec<String>,
    pub timing_ms: f64,
}

impl Response {
    pub fn success(data: Value, warnings: Vec<String>, timing_ms: f64) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            warnings,
            timing_ms,
        }
    }

    pub fn failure(
        code: ErrorCode,
        message: impl Into<String>,
        details: Option<Value>,
        timing_ms: f64,
    ) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorBody {
                code,
                message: message.into(),
                details,
            }),
            warnings: Vec::new(),
            timing_ms,
        }
    }

    /// Error code of a failed response.
    pub fn error_code(&self) -> Option<ErrorCode> {
        self.error.as_ref().map(|e| e.code)
    }
}

/// Line decoding errors.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("request must be a JSON object")]
    NotAnObject,

    #[error("request has no 'command' string")]
    MissingCommand,

    #[error("'params' must be an object")]
    InvalidParams,
}

/// Decode one request line.
pub fn decode_request(line: &str) -> Result<Request, CodecError> {
    let value: Value = serde_json::from_str(line.trim())?;
    let Value::Object(mut object) = value else {
        return Err(CodecError::NotAnObject);
    };
    let command = match object.remove("command") {
        Some(Value::String(command)) => command,
        _ => return Err(CodecError::MissingCommand),
    };
    let params = match object.remove("params") {
        None | Some(Value::Null) => empty_params(),
        Some(params @ Value::Object(_)) => params,
        Some(_) => return Err(CodecError::InvalidParams),
    };
    Ok(Request { command, params })
}

/// Encode a response as one line (no trailing newline).
pub fn encode_response(response: &Response) -> Result<String, CodecError> {
    Ok(serde_json::to_string(response)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_request() {
        let request = decode_request(r#"{"command":"ping"}"#).expect("decode");
        assert_eq!(request, Request::new("ping", json!({})));

        let request =
            decode_request(r#" {"command":"get_datatable_row","params":{"row_name":"a"}} "#)
                .expect("decode");
        assert_eq!(request.params["row_name"], json!("a"));
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(decode_request("{nope"), Err(CodecError::Json(_))));
        assert!(matches!(decode_request("[1]"), Err(CodecError::NotAnObject)));
        assert!(matches!(
            decode_request(r#"{"params":{}}"#),
            Err(CodecError::MissingCommand)
        ));
        assert!(matches!(
            decode_request(r#"{"command":"ping","params":[1]}"#),
            Err(CodecError::InvalidParams)
        ));
    }

    #[test]
    fn test_response_shape() {
        let ok = Response::success(json!({"message": "pong"}), Vec::new(), 0.5);
        let value = serde_json::to_value(&ok).expect("serialize");
        assert_eq!(
            value,
            json!({"success": true, "data": {"message": "pong"}, "warnings": [], "timing_ms": 0.5})
        );

        let err = Response::failure(ErrorCode::RowNotFound, "Row not found: x", None, 1.0);
        let line = encode_response(&err).expect("encode");
        assert!(line.contains(r#""code":"ROW_NOT_FOUND""#));
        assert!(!line.contains("details"));
        assert_eq!(err.error_code(), Some(ErrorCode::RowNotFound));
    }

    #[test]
    fn test_error_code_names_match_serde() {
        for code in [
            ErrorCode::TableNotFound,
            ErrorCode::CompositeWriteBlocked,
            ErrorCode::BatchRecursionBlocked,
            ErrorCode::InvalidStructType,
        ] {
            assert_eq!(
                serde_json::to_value(code).expect("serialize"),
                json!(code.as_str())
            );
        }
    }
}
