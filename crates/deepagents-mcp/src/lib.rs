//! # deepagents-mcp
//!
//! Model Context Protocol (MCP) client used by `deepagents-custom` to expose
//! tools from external MCP servers to the agent.
//!
//! Servers are declared in a `.mcp.json` file, found by searching upward from
//! the working directory. Each server is reached over one of three transports:
//!
//! - **stdio**: `{"command": "npx", "args": [...], "env": {...}}`
//! - **streamable HTTP**: `{"url": "https://...", "headers": {...}}`
//! - **SSE** (legacy): `{"type": "sse", "url": "https://..."}`
//!
//! Every remote tool is wrapped as a [`deepagents_core::Tool`] named
//! `<server>__<tool>`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use deepagents_mcp::McpToolset;
//!
//! let toolset = McpToolset::open(std::path::Path::new(".")).await;
//! for error in &toolset.errors {
//!     eprintln!("warning: {error}");
//! }
//! for tool in &toolset.tools {
//!     println!("{}", tool.schema().name);
//! }
//! toolset.close().await;
//! ```

pub mod config;
pub mod protocol;
pub mod transport;

mod client;
mod toolset;

pub use client::{McpClient, McpClientConfig};
pub use config::{
    extract_servers, find_config_path, load_config, ConfigError, ServerConfig, CONFIG_FILE_NAME,
};
pub use protocol::{
    error::McpError,
    types::{CallToolResult, ContentBlock, McpTool},
};
pub use toolset::{format_call_result, Connector, DefaultConnector, McpServerTool, McpToolset};
pub use transport::Transport;

#[cfg(feature = "stdio")]
pub use transport::stdio::{StdioServerParams, StdioTransport};

#[cfg(feature = "http")]
pub use transport::{http::HttpTransport, sse::SseTransport};
