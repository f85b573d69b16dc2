//! Core types for the `deepagents-custom` CLI.
//!
//! This crate turns a `--model` string and an environment snapshot into a
//! provider connection descriptor, and defines the trait seams (tools and the
//! agent harness) that the CLI wires together. Nothing here performs I/O
//! beyond reading process environment variables.

pub mod env;
pub mod harness;
pub mod messaging;
pub mod provider;
pub mod tools;

pub use env::EnvSnapshot;
pub use harness::{AgentHarness, HarnessDescriptor};
pub use messaging::{AgentMessage, MessageRole};
pub use provider::{
    detect, resolve, ApiKey, ErrorKind, ModelSpec, ProviderConfig, ProviderEntry, ProviderId,
    ProviderRegistry, ProviderReport, ProviderStatus, ResolveError,
};
pub use tools::{Tool, ToolBox, ToolMetadata, ToolRegistry, ToolSchema};
