//! Model Context Protocol surface: JSON-RPC framing, the tool catalog, and the stdio loop.

pub mod protocol;
pub mod server;
pub mod tools;

pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use server::McpServer;
pub use tools::{Tool, ToolArgumentError, ToolCall};
