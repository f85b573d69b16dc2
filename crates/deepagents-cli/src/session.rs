//! Interactive read-eval loop.

use crate::commands::{Input, SlashCommand, HELP};
use deepagents_core::{
    AgentHarness, AgentMessage, EnvSnapshot, ProviderConfig, ProviderRegistry, ProviderReport,
    ToolRegistry,
};
use deepagents_mcp::McpToolset;
use std::io::{BufRead, Write};
use tracing::{debug, info};
use uuid::Uuid;

pub struct Session<'a, H: ?Sized> {
    id: Uuid,
    harness: &'a H,
    provider: &'a ProviderConfig,
    env: &'a EnvSnapshot,
    toolset: &'a McpToolset,
    tools: ToolRegistry,
    /// Tool names that were already taken when the session was built
    duplicates: Vec<String>,
}

impl<'a, H: AgentHarness + ?Sized> Session<'a, H> {
    pub fn new(
        harness: &'a H,
        provider: &'a ProviderConfig,
        env: &'a EnvSnapshot,
        toolset: &'a McpToolset,
    ) -> Self {
        let mut tools = ToolRegistry::new();
        let mut duplicates = Vec::new();
        for tool in &toolset.tools {
            if let Err(rejected) = tools.register(tool.clone()) {
                duplicates.push(rejected.schema().name);
            }
        }
        Self {
            id: Uuid::new_v4(),
            harness,
            provider,
            env,
            toolset,
            tools,
            duplicates,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn write_banner<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "deepagents-custom (session {})", self.id)?;
        writeln!(out, "Model: {}", self.provider.qualified_name())?;
        match (&self.toolset.config_path, self.tools.len()) {
            (Some(path), count) => {
                writeln!(out, "MCP tools: {} from {}", count, path.display())?
            }
            (None, _) => writeln!(out, "MCP tools: none")?,
        }
        for error in &self.toolset.errors {
            writeln!(out, "warning: {}", error)?;
        }
        for name in &self.duplicates {
            writeln!(out, "warning: duplicate tool name '{}' ignored", name)?;
        }
        writeln!(out, "Type /help for commands.")
    }

    /// Configure the harness, then serve lines from `input` until `/exit` or EOF.
    pub async fn run<R: BufRead, W: Write>(&self, mut input: R, mut out: W) -> anyhow::Result<()> {
        self.harness
            .configure(self.provider, &self.tools.tools())
            .await?;
        let descriptor = self.harness.describe().await;
        info!(session = %self.id, harness = %descriptor.name, "session started");

        self.write_banner(&mut out)?;
        let mut line = String::new();
        loop {
            write!(out, "> ")?;
            out.flush()?;

            line.clear();
            if input.read_line(&mut line)? == 0 {
                writeln!(out)?;
                break;
            }

            match Input::parse(&line) {
                Input::Blank => continue,
                Input::Command(SlashCommand::Exit) => break,
                Input::Command(command) => self.run_command(&command, &mut out)?,
                Input::Message(text) => self.send(text, &mut out).await?,
            }
        }
        debug!(session = %self.id, "session ended");
        Ok(())
    }

    fn run_command<W: Write>(&self, command: &SlashCommand, out: &mut W) -> std::io::Result<()> {
        match command {
            SlashCommand::Model => {
                let report =
                    ProviderReport::build(&ProviderRegistry::builtin(), self.env, Some(self.provider));
                writeln!(out, "Active model: {}", self.provider.qualified_name())?;
                write!(out, "{}", report)
            }
            SlashCommand::Tools => {
                if self.tools.is_empty() {
                    return writeln!(out, "No MCP tools loaded.");
                }
                for tool in self.tools.iter() {
                    let schema = tool.schema();
                    writeln!(out, "  {}  {}", schema.name, schema.description)?;
                }
                Ok(())
            }
            SlashCommand::Help => writeln!(out, "{}", HELP),
            SlashCommand::Unknown(name) => {
                writeln!(out, "Unknown command '/{}'. Type /help for commands.", name)
            }
            SlashCommand::Exit => Ok(()),
        }
    }

    async fn send<W: Write>(&self, text: String, out: &mut W) -> std::io::Result<()> {
        match self.harness.handle_message(AgentMessage::user(text)).await {
            Ok(reply) => writeln!(out, "{}", reply.content),
            Err(e) => writeln!(out, "error: {:#}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::DetachedHarness;
    use async_trait::async_trait;
    use deepagents_core::{HarnessDescriptor, ProviderId, Tool, ToolBox, ToolSchema};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct EchoHarness {
        configured_tools: Mutex<Option<usize>>,
    }

    #[async_trait]
    impl AgentHarness for EchoHarness {
        async fn describe(&self) -> HarnessDescriptor {
            HarnessDescriptor {
                name: "echo".into(),
                version: "0".into(),
                description: None,
            }
        }

        async fn configure(&self, _provider: &ProviderConfig, tools: &[ToolBox]) -> anyhow::Result<()> {
            *self.configured_tools.lock().unwrap() = Some(tools.len());
            Ok(())
        }

        async fn handle_message(&self, input: AgentMessage) -> anyhow::Result<AgentMessage> {
            let text = input.content.to_uppercase();
            Ok(AgentMessage::agent(text))
        }
    }

    struct StaticTool(&'static str, &'static str);

    #[async_trait]
    impl Tool for StaticTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema::no_params(self.0, self.1)
        }

        async fn execute(&self, _args: serde_json::Value) -> anyhow::Result<String> {
            Ok("ok".into())
        }
    }

    fn provider() -> ProviderConfig {
        ProviderConfig::new(ProviderId::Ollama, "llama3:8b")
    }

    fn env() -> EnvSnapshot {
        EnvSnapshot::new()
            .with("OLLAMA_BASE_URL", "http://localhost:11434")
            .with("OLLAMA_MODEL", "llama3:8b")
    }

    async fn drive<H: AgentHarness>(harness: &H, toolset: &McpToolset, script: &str) -> String {
        let provider = provider();
        let env = env();
        let session = Session::new(harness, &provider, &env, toolset);
        let mut out = Vec::new();
        session.run(script.as_bytes(), &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn messages_go_to_the_harness() {
        let harness = EchoHarness::default();
        let output = drive(&harness, &McpToolset::empty(), "hello there\n\n/exit\nnever sent\n").await;

        assert!(output.contains("Model: ollama:llama3:8b"));
        assert!(output.contains("HELLO THERE"));
        assert!(!output.contains("NEVER SENT"));
        assert_eq!(*harness.configured_tools.lock().unwrap(), Some(0));
    }

    #[tokio::test]
    async fn model_command_prints_report() {
        let output = drive(&EchoHarness::default(), &McpToolset::empty(), "/model\n").await;
        assert!(output.contains("Active model: ollama:llama3:8b"));
        assert!(output.contains("* ollama"));
        assert!(output.contains("missing OPENAI_API_KEY"));
    }

    #[tokio::test]
    async fn tools_command_lists_mcp_tools() {
        let mut toolset = McpToolset::empty();
        toolset
            .tools
            .push(Arc::new(StaticTool("tavily__search", "[MCP:tavily] Search the web")));
        toolset.errors.push("Failed to connect MCP server 'broken': boom".into());

        let harness = EchoHarness::default();
        let output = drive(&harness, &toolset, "/tools\n/quit\n").await;
        assert!(output.contains("tavily__search  [MCP:tavily] Search the web"));
        assert!(output.contains("warning: Failed to connect MCP server 'broken': boom"));
        assert_eq!(*harness.configured_tools.lock().unwrap(), Some(1));

        let empty = drive(&harness, &McpToolset::empty(), "/tools\n").await;
        assert!(empty.contains("No MCP tools loaded."));
    }

    #[tokio::test]
    async fn tools_are_listed_by_name_and_duplicates_dropped() {
        let mut toolset = McpToolset::empty();
        toolset.tools.extend([
            Arc::new(StaticTool("zotero__lookup", "[MCP:zotero] Look up")) as ToolBox,
            Arc::new(StaticTool("docs__search", "[MCP:docs] Search")) as ToolBox,
            Arc::new(StaticTool("docs__search", "[MCP:docs] Shadowed")) as ToolBox,
        ]);

        let harness = EchoHarness::default();
        let output = drive(&harness, &toolset, "/tools\n").await;
        assert!(output.contains("MCP tools: none"));
        assert!(output.contains("warning: duplicate tool name 'docs__search' ignored"));
        assert!(!output.contains("Shadowed"));
        let docs = output.find("docs__search  [MCP:docs] Search").unwrap();
        let zotero = output.find("zotero__lookup").unwrap();
        assert!(docs < zotero);
        assert_eq!(*harness.configured_tools.lock().unwrap(), Some(2));
    }

    #[tokio::test]
    async fn unknown_command_and_help() {
        let output = drive(&EchoHarness::default(), &McpToolset::empty(), "/nope\n/help\n").await;
        assert!(output.contains("Unknown command '/nope'"));
        assert!(output.contains("/tools"));
    }

    #[tokio::test]
    async fn detached_harness_reports_errors_and_keeps_going() {
        let output = drive(&DetachedHarness, &McpToolset::empty(), "hi\n/help\n").await;
        assert!(output.contains("error: no agent harness is linked"));
        assert!(output.contains("Commands:"));
    }

    #[test]
    fn banner_without_mcp_config() {
        let provider = provider();
        let env = env();
        let toolset = McpToolset::empty();
        let session = Session::new(&DetachedHarness, &provider, &env, &toolset);

        let mut out = Vec::new();
        session.write_banner(&mut out).unwrap();
        let banner = String::from_utf8(out).unwrap();
        assert!(banner.contains(&session.id().to_string()));
        assert!(banner.contains("MCP tools: none"));
    }
}
