//! MCP client error type.

use crate::protocol::messages::JsonRpcError;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum McpError {
    /// JSON-RPC error object returned by the server
    #[error("MCP server error: {0}")]
    Server(#[from] JsonRpcError),

    /// I/O or connection failure below the protocol
    #[error("transport error: {0}")]
    Transport(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Well-formed JSON that does not follow the protocol
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("client not initialized")]
    NotInitialized,

    #[error("failed to spawn MCP server: {0}")]
    ProcessSpawn(String),

    #[error("MCP server process exited")]
    ProcessExited,

    #[error("response id mismatch: expected {expected}, got {actual}")]
    ResponseIdMismatch { expected: String, actual: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transport kind compiled out of this build
    #[error("unsupported transport: {0}")]
    Unsupported(&'static str),
}

impl McpError {
    pub fn transport(msg: impl Into<String>) -> Self {
        McpError::Transport(msg.into())
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        McpError::Protocol(msg.into())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, McpError::Timeout(_))
    }
}
