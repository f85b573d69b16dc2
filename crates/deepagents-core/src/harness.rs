//! Seam between the CLI and the external agent runtime.
//!
//! Planning, sub-agents, and the file-system sandbox live outside this
//! workspace. The CLI resolves a [`ProviderConfig`], loads tools, and then
//! talks to whatever implements [`AgentHarness`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::messaging::AgentMessage;
use crate::provider::ProviderConfig;
use crate::tools::ToolBox;

/// Minimal metadata about an attached harness.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HarnessDescriptor {
    pub name: String,
    pub version: String,
    pub description: Option<String>,
}

#[async_trait]
pub trait AgentHarness: Send + Sync {
    async fn describe(&self) -> HarnessDescriptor;

    /// Called once before the first turn with the resolved provider and the
    /// tools the session exposes.
    async fn configure(&self, provider: &ProviderConfig, tools: &[ToolBox]) -> anyhow::Result<()>;

    async fn handle_message(&self, input: AgentMessage) -> anyhow::Result<AgentMessage>;
}
