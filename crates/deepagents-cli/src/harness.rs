use async_trait::async_trait;
use deepagents_core::{AgentHarness, AgentMessage, HarnessDescriptor, ProviderConfig, ToolBox};

/// Stand-in used when no agent runtime is linked into the binary. Provider
/// resolution, `/model` and `/tools` all work; chat turns report the gap.
#[derive(Debug, Default)]
pub struct DetachedHarness;

#[async_trait]
impl AgentHarness for DetachedHarness {
    async fn describe(&self) -> HarnessDescriptor {
        HarnessDescriptor {
            name: "detached".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: Some("no agent runtime linked".to_string()),
        }
    }

    async fn configure(&self, provider: &ProviderConfig, tools: &[ToolBox]) -> anyhow::Result<()> {
        tracing::debug!(
            provider = %provider.qualified_name(),
            tools = tools.len(),
            "detached harness configured"
        );
        Ok(())
    }

    async fn handle_message(&self, _input: AgentMessage) -> anyhow::Result<AgentMessage> {
        anyhow::bail!("no agent harness is linked into this build; only /model, /tools and /help are available")
    }
}
