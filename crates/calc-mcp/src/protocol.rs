//! JSON-RPC 2.0 envelopes and the MCP `tools/call` result shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use calc_core::CalcError;

pub const JSONRPC_VERSION: &str = "2.0";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// One incoming line. A message without an `id` is a notification.
#[derive(Debug, Deserialize)]
pub struct JsonRpcMessage {
    #[serde(default)]
    pub jsonrpc: String,
    pub id: Option<Value>,
    #[serde(default)]
    pub method: String,
    pub params: Option<Value>,
}

impl JsonRpcMessage {
    pub fn has_valid_version(&self) -> bool {
        self.jsonrpc == JSONRPC_VERSION
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Exactly one of `result` or `error` is present on the wire.
#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Result(Value),
    Error(JsonRpcError),
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

impl JsonRpcResponse {
    pub fn ok(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            outcome: Outcome::Result(result),
        }
    }

    pub fn err(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            outcome: Outcome::Error(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }

    /// The id is unknown when the line itself could not be parsed.
    pub fn parse_error(e: &serde_json::Error) -> Self {
        Self::err(Value::Null, PARSE_ERROR, format!("parse error: {e}"))
    }

    pub fn invalid_request(id: Value, jsonrpc: &str) -> Self {
        Self::err(
            id,
            INVALID_REQUEST,
            format!("unsupported jsonrpc version {jsonrpc:?}, expected \"{JSONRPC_VERSION}\""),
        )
    }

    pub fn method_not_found(id: Value, method: &str) -> Self {
        Self::err(id, METHOD_NOT_FOUND, format!("method not found: {method}"))
    }

    pub fn invalid_params(id: Value, message: &str) -> Self {
        Self::err(id, INVALID_PARAMS, message)
    }

    pub fn error_code(&self) -> Option<i64> {
        match &self.outcome {
            Outcome::Error(e) => Some(e.code),
            Outcome::Result(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tool results
// ---------------------------------------------------------------------------

/// Payload of a `tools/call` response. Calculator failures are reported here
/// with `isError`, not as JSON-RPC errors.
#[derive(Debug, Serialize)]
pub struct ToolResult {
    pub content: Vec<Content>,
    #[serde(rename = "isError", skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    Text { text: String },
}

impl ToolResult {
    pub fn text(text: String) -> Self {
        Self {
            content: vec![Content::Text { text }],
            is_error: false,
        }
    }

    pub fn error(text: String) -> Self {
        Self {
            is_error: true,
            ..Self::text(text)
        }
    }

    pub fn first_text(&self) -> &str {
        match self.content.first() {
            Some(Content::Text { text }) => text,
            None => "",
        }
    }
}

impl From<CalcError> for ToolResult {
    fn from(e: CalcError) -> Self {
        Self::error(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_carries_result_or_error() {
        let ok = serde_json::to_value(JsonRpcResponse::ok(json!(1), json!({}))).unwrap();
        assert_eq!(ok, json!({"jsonrpc": "2.0", "id": 1, "result": {}}));

        let err = JsonRpcResponse::method_not_found(json!(2), "nope");
        assert_eq!(err.error_code(), Some(METHOD_NOT_FOUND));
        let v = serde_json::to_value(err).unwrap();
        assert!(v.get("result").is_none());
        assert_eq!(v["error"]["message"], "method not found: nope");
    }

    #[test]
    fn test_tool_result_shape() {
        let v = serde_json::to_value(ToolResult::text("42".into())).unwrap();
        assert_eq!(v, json!({"content": [{"type": "text", "text": "42"}]}));

        let r = ToolResult::from(CalcError::UnknownNode("x".into()));
        assert!(r.is_error);
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["isError"], true);
        assert_eq!(v["content"][0]["text"], r.first_text());
    }

    #[test]
    fn test_version_check() {
        let msg: JsonRpcMessage =
            serde_json::from_str(r#"{"jsonrpc":"1.0","id":1,"method":"ping"}"#).unwrap();
        assert!(!msg.has_valid_version());
        let msg: JsonRpcMessage = serde_json::from_str(r#"{"id":1,"method":"ping"}"#).unwrap();
        assert!(!msg.has_valid_version());
    }
}
