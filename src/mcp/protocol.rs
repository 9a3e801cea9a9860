//! JSON-RPC 2.0 framing and MCP protocol constants.

// self
use crate::_prelude::*;

/// JSON-RPC version accepted and emitted.
pub const JSONRPC_VERSION: &str = "2.0";
/// MCP revision answered when the client asks for one this server does not know.
pub const LATEST_PROTOCOL_VERSION: &str = "2025-06-18";
/// MCP revisions this server can speak.
pub const SUPPORTED_PROTOCOL_VERSIONS: [&str; 3] = ["2024-11-05", "2025-03-26", "2025-06-18"];

/// Invalid JSON was received.
pub const PARSE_ERROR: i32 = -32700;
/// The JSON sent is not a valid request object.
pub const INVALID_REQUEST: i32 = -32600;
/// The method does not exist.
pub const METHOD_NOT_FOUND: i32 = -32601;
/// Invalid method parameters.
pub const INVALID_PARAMS: i32 = -32602;

/// Incoming request or notification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
	/// Protocol version; must be `2.0`.
	pub jsonrpc: String,
	/// Method name.
	pub method: String,
	/// Method parameters.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub params: Option<Value>,
	/// Request id; absent for notifications.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<Value>,
}
impl JsonRpcRequest {
	/// Whether the sender expects no response.
	pub fn is_notification(&self) -> bool {
		self.id.is_none()
	}
}

/// Outgoing response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
	/// Protocol version; always `2.0`.
	pub jsonrpc: String,
	/// Result on success.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub result: Option<Value>,
	/// Error on failure.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<JsonRpcError>,
	/// Id of the request being answered (`null` when it could not be read).
	pub id: Value,
}
impl JsonRpcResponse {
	/// Successful response.
	pub fn success(id: Value, result: Value) -> Self {
		Self { jsonrpc: JSONRPC_VERSION.into(), result: Some(result), error: None, id }
	}

	/// Error response.
	pub fn error(id: Value, code: i32, message: impl Into<String>) -> Self {
		Self {
			jsonrpc: JSONRPC_VERSION.into(),
			result: None,
			error: Some(JsonRpcError { code, message: message.into(), data: None }),
			id,
		}
	}
}

/// JSON-RPC error object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
	/// Error code.
	pub code: i32,
	/// Short description.
	pub message: String,
	/// Additional details.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub data: Option<Value>,
}

/// Picks the revision to answer `initialize` with.
pub fn negotiate_protocol_version(requested: Option<&str>) -> &'static str {
	requested
		.and_then(|version| SUPPORTED_PROTOCOL_VERSIONS.into_iter().find(|known| *known == version))
		.unwrap_or(LATEST_PROTOCOL_VERSION)
}
