//! Line-delimited JSON-RPC loop dispatching MCP methods to the Fitness service.

// crates.io
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
// self
use crate::{
	_prelude::*,
	fitness::{FitnessService, ResponseEnvelope},
	http::{ReqwestHttpClient, TokenHttpClient},
	mcp::{
		protocol::{self, JsonRpcRequest, JsonRpcResponse},
		tools::{Tool, ToolCall},
	},
};

const SERVER_NAME: &str = "google-fitness";
const SERVER_TITLE: &str = "Google Fitness MCP 서버";

/// Line-delimited JSON-RPC server exposing the Fitness tools.
#[derive(Debug)]
pub struct McpServer<C = ReqwestHttpClient>
where
	C: ?Sized + TokenHttpClient,
{
	service: FitnessService<C>,
}
impl<C> McpServer<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Serves `service`.
	pub fn new(service: FitnessService<C>) -> Self {
		Self { service }
	}

	/// Runs on the process's stdin/stdout until stdin closes.
	pub async fn serve_stdio(&self) -> io::Result<()> {
		self.serve(BufReader::new(io::stdin()), io::stdout()).await
	}

	/// Reads one request per line from `reader` and writes one response per line to `writer`.
	///
	/// Requests are handled strictly in order; the next line is not read until the current
	/// response has been flushed.
	pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> io::Result<()>
	where
		R: AsyncBufRead + Unpin,
		W: AsyncWrite + Unpin,
	{
		let mut line = String::new();

		loop {
			line.clear();

			if reader.read_line(&mut line).await? == 0 {
				tracing::info!("Input closed; shutting down.");

				return Ok(());
			}
			if line.trim().is_empty() {
				continue;
			}

			if let Some(response) = self.handle_line(&line).await {
				let mut payload = serde_json::to_vec(&response).map_err(io::Error::other)?;

				payload.push(b'\n');
				writer.write_all(&payload).await?;
				writer.flush().await?;
			}
		}
	}

	/// Handles one raw message; `None` means nothing should be written back.
	pub async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
		let value = match serde_json::from_str::<Value>(line) {
			Ok(value) => value,
			Err(e) =>
				return Some(JsonRpcResponse::error(
					Value::Null,
					protocol::PARSE_ERROR,
					format!("Parse error: {e}"),
				)),
		};
		let id = value.get("id").cloned().unwrap_or(Value::Null);
		let request = match serde_json::from_value::<JsonRpcRequest>(value) {
			Ok(request) => request,
			Err(e) =>
				return Some(JsonRpcResponse::error(
					id,
					protocol::INVALID_REQUEST,
					format!("Invalid request: {e}"),
				)),
		};

		self.handle_request(request).await
	}

	/// Dispatches a parsed request.
	pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
		let JsonRpcRequest { jsonrpc, method, params, id } = request;
		let Some(id) = id else {
			tracing::debug!(%method, "Received notification.");

			return None;
		};

		if jsonrpc != protocol::JSONRPC_VERSION {
			return Some(JsonRpcResponse::error(
				id,
				protocol::INVALID_REQUEST,
				format!("Unsupported JSON-RPC version: {jsonrpc}"),
			));
		}

		tracing::debug!(%method, "Handling request.");

		let response = match method.as_str() {
			"initialize" => JsonRpcResponse::success(id, initialize_result(params.as_ref())),
			"ping" => JsonRpcResponse::success(id, serde_json::json!({})),
			"tools/list" => JsonRpcResponse::success(
				id,
				serde_json::json!({
					"tools": Tool::ALL.into_iter().map(Tool::definition).collect::<Vec<_>>()
				}),
			),
			"tools/call" => match ToolCall::parse(params) {
				Ok(call) => JsonRpcResponse::success(id, self.call_tool(call).await),
				Err(e) => JsonRpcResponse::error(id, protocol::INVALID_PARAMS, e.to_string()),
			},
			_ => JsonRpcResponse::error(
				id,
				protocol::METHOD_NOT_FOUND,
				format!("Method not found: {method}"),
			),
		};

		Some(response)
	}

	async fn call_tool(&self, call: ToolCall) -> Value {
		tracing::info!(tool = call.tool.name(), days = call.days.get(), "Running tool.");

		match self.service.aggregate(call.days, &call.tool.source()).await {
			Ok(envelope) => envelope_result(&envelope),
			Err(e) => {
				tracing::error!(tool = call.tool.name(), error = %e, "Credential acquisition failed.");

				serde_json::json!({
					"content": [{ "type": "text", "text": e.to_string() }],
					"isError": true
				})
			},
		}
	}
}

fn initialize_result(params: Option<&Value>) -> Value {
	let requested =
		params.and_then(|params| params.get("protocolVersion")).and_then(Value::as_str);

	serde_json::json!({
		"protocolVersion": protocol::negotiate_protocol_version(requested),
		"capabilities": { "tools": { "listChanged": false } },
		"serverInfo": {
			"name": SERVER_NAME,
			"title": SERVER_TITLE,
			"version": env!("CARGO_PKG_VERSION")
		}
	})
}

fn envelope_result(envelope: &ResponseEnvelope) -> Value {
	let structured = envelope.to_json();

	serde_json::json!({
		"content": [{ "type": "text", "text": structured.to_string() }],
		"structuredContent": structured,
		"isError": false
	})
}
