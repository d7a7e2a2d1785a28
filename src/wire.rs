//! JSON-RPC 2.0 frame encoding/decoding.
//!
//! A frame is either a request (`id` present), a notification (`id` absent),
//! or a response. Unknown fields on incoming frames are ignored; outgoing
//! frames never carry a null-valued optional field except `id` on a
//! parse-error response, which JSON-RPC mandates.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;
pub const UNAUTHORIZED: i32 = -32001;

#[derive(Debug, Clone, Deserialize)]
pub struct RequestFrame {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

impl RequestFrame {
    /// A notification carries no `id` and expects no response.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseFrame {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl ResponseFrame {
    pub fn ok(id: Value, result: Value) -> Self {
        Self { jsonrpc: JSONRPC_VERSION, id, result: Some(result), error: None }
    }

    pub fn err(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: Some(serde_json::json!({ "code": code, "message": message.into() })),
        }
    }

    pub fn err_value(id: Value, error: Value) -> Self {
        Self { jsonrpc: JSONRPC_VERSION, id, result: None, error: Some(error) }
    }
}

/// Parse a raw frame body. Returns the typed request on success, or a
/// ready-to-send parse-error response frame on failure.
pub fn decode(raw: &str) -> Result<RequestFrame, ResponseFrame> {
    serde_json::from_str::<RequestFrame>(raw)
        .map_err(|e| ResponseFrame::err(Value::Null, PARSE_ERROR, format!("parse error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_request_with_id() {
        let frame = decode(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#).unwrap();
        assert_eq!(frame.method, "initialize");
        assert!(!frame.is_notification());
    }

    #[test]
    fn decodes_notification_without_id() {
        let frame = decode(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).unwrap();
        assert!(frame.is_notification());
    }

    #[test]
    fn malformed_json_yields_parse_error_response() {
        let err = decode("not json").unwrap_err();
        assert_eq!(err.error.unwrap()["code"], PARSE_ERROR);
        assert_eq!(err.id, Value::Null);
    }

    #[test]
    fn response_carries_exactly_one_of_result_or_error() {
        let ok = ResponseFrame::ok(Value::from(1), serde_json::json!({"a":1}));
        assert!(ok.result.is_some() && ok.error.is_none());
        let bad = ResponseFrame::err(Value::from(1), METHOD_NOT_FOUND, "nope");
        assert!(bad.result.is_none() && bad.error.is_some());
    }
}
