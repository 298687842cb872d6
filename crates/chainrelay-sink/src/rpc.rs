//! JSON-RPC 2.0 wire types for the sink endpoint.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A JSON-RPC 2.0 request. The sink methods each take a single object
/// parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: Vec<Value>,
    pub id: u64,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: impl Into<String>, param: Value) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            method: method.into(),
            params: vec![param],
            id,
        }
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JSON-RPC error {}: {}", self.code, self.message)
    }
}

/// A JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Unwrap the result value or return the error object.
    pub fn into_result(self) -> Result<Option<Value>, JsonRpcError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.result),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_serialization() {
        let req = JsonRpcRequest::new(7, "relay_sendAction", json!({ "action": "init" }));
        let text = serde_json::to_string(&req).unwrap();
        assert!(text.contains("\"jsonrpc\":\"2.0\""));
        assert!(text.contains("\"method\":\"relay_sendAction\""));
        assert!(text.contains("\"params\":[{\"action\":\"init\"}]"));
    }

    #[test]
    fn response_into_result_ok() {
        let resp: JsonRpcResponse = serde_json::from_str(
            r#"{ "jsonrpc": "2.0", "id": 7, "result": { "message": "stored" } }"#,
        )
        .unwrap();
        let value = resp.into_result().unwrap().unwrap();
        assert_eq!(value["message"], "stored");
    }

    #[test]
    fn response_into_result_error() {
        let resp: JsonRpcResponse = serde_json::from_str(
            r#"{ "jsonrpc": "2.0", "id": 7, "error": { "code": -32000, "message": "full" } }"#,
        )
        .unwrap();
        let err = resp.into_result().unwrap_err();
        assert_eq!(err.code, -32000);
        assert_eq!(err.message, "full");
    }
}
