//! Byte-level channels to an MCP server.
//!
//! A [`Transport`] moves whole JSON-RPC frames; framing (newlines, HTTP bodies,
//! SSE events) is the transport's business, the protocol is the client's.

#[cfg(feature = "stdio")]
pub mod stdio;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub mod sse;

use crate::protocol::McpError;
use async_trait::async_trait;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver one serialized JSON-RPC message.
    async fn send(&mut self, message: &str) -> Result<(), McpError>;

    /// Next serialized message from the server, in arrival order.
    async fn receive(&mut self) -> Result<String, McpError>;

    async fn close(&mut self) -> Result<(), McpError>;

    fn is_connected(&self) -> bool;
}
