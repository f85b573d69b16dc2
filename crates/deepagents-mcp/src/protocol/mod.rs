//! Wire format: JSON-RPC 2.0 envelopes and the MCP payloads carried in them.

pub mod error;
pub mod messages;
pub mod types;

pub use error::McpError;
pub use messages::*;
pub use types::*;
