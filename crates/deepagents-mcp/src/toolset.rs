//! Turns the servers in `.mcp.json` into agent tools.

use crate::client::{McpClient, McpClientConfig};
use crate::config::{extract_servers, find_config_path, load_config, ServerConfig};
use crate::protocol::{CallToolResult, ContentBlock, McpError, McpTool};
use crate::transport::Transport;
use async_trait::async_trait;
use deepagents_core::tools::{empty_object_schema, Tool, ToolBox, ToolMetadata, ToolSchema};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Opens a transport for one configured server.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        name: &str,
        config: &ServerConfig,
        cwd: &Path,
    ) -> Result<Box<dyn Transport>, McpError>;
}

/// Real transports: child processes and HTTP.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultConnector;

#[async_trait]
impl Connector for DefaultConnector {
    async fn connect(
        &self,
        name: &str,
        config: &ServerConfig,
        cwd: &Path,
    ) -> Result<Box<dyn Transport>, McpError> {
        debug!(server = %name, transport = config.transport_name(), "connecting MCP server");
        match config {
            #[cfg(feature = "stdio")]
            ServerConfig::Stdio { command, args, env } => {
                use crate::transport::stdio::{StdioServerParams, StdioTransport};
                let mut params = StdioServerParams::new(command.clone())
                    .args(args.iter().cloned())
                    .cwd(cwd);
                params.env = env.clone();
                Ok(Box::new(StdioTransport::spawn(params).await?))
            }
            #[cfg(feature = "http")]
            ServerConfig::Http { url, headers } => {
                use crate::transport::http::HttpTransport;
                let transport = HttpTransport::builder(url.clone())
                    .headers(headers.clone())
                    .build()?;
                Ok(Box::new(transport))
            }
            #[cfg(feature = "http")]
            ServerConfig::Sse { url, headers } => {
                use crate::transport::sse::SseTransport;
                Ok(Box::new(SseTransport::connect(url.clone(), headers.clone()).await?))
            }
            #[allow(unreachable_patterns)]
            other => {
                let _ = cwd;
                Err(McpError::Unsupported(other.transport_name()))
            }
        }
    }
}

/// Tools from every reachable MCP server, plus what went wrong with the rest.
pub struct McpToolset {
    pub tools: Vec<ToolBox>,
    pub config_path: Option<PathBuf>,
    /// One human-readable line per failure
    pub errors: Vec<String>,
    clients: Vec<Arc<McpClient>>,
}

impl McpToolset {
    pub fn empty() -> Self {
        Self {
            tools: Vec::new(),
            config_path: None,
            errors: Vec::new(),
            clients: Vec::new(),
        }
    }

    /// Search upward from `start` for `.mcp.json` and connect every server in it.
    pub async fn open(start: &Path) -> Self {
        Self::open_with(start, &DefaultConnector, McpClientConfig::default()).await
    }

    pub async fn open_with(
        start: &Path,
        connector: &dyn Connector,
        client_config: McpClientConfig,
    ) -> Self {
        let mut toolset = Self::empty();
        let Some(path) = find_config_path(start) else {
            debug!(start = %start.display(), "no .mcp.json found");
            return toolset;
        };
        toolset.config_path = Some(path.clone());

        let data = match load_config(&path) {
            Ok(data) => data,
            Err(e) => {
                toolset.errors.push(e.to_string());
                return toolset;
            }
        };

        let servers = extract_servers(&data);
        if servers.is_empty() {
            toolset.errors.push(format!(
                "No MCP servers configured in {}. Expected a top-level 'mcpServers'/'servers' object or a simplified server map.",
                path.display()
            ));
            return toolset;
        }

        for (name, value) in &servers {
            let Some(object) = value.as_object() else {
                toolset
                    .errors
                    .push(format!("MCP server '{}' config must be an object.", name));
                continue;
            };

            match connect_server(name, object, start, connector, &client_config).await {
                Ok((client, tools)) => {
                    info!(server = %name, tools = tools.len(), "MCP server ready");
                    toolset.tools.extend(tools);
                    toolset.clients.push(client);
                }
                Err(e) => {
                    warn!(server = %name, error = %e, "MCP server unavailable");
                    toolset
                        .errors
                        .push(format!("Failed to connect MCP server '{}': {}", name, e));
                }
            }
        }
        toolset
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Shut down every server connection. Tools stop working afterwards.
    pub async fn close(&self) {
        for client in &self.clients {
            if let Err(e) = client.close().await {
                debug!(error = %e, "error while closing MCP client");
            }
        }
    }
}

impl std::fmt::Debug for McpToolset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpToolset")
            .field(
                "tools",
                &self.tools.iter().map(|t| t.schema().name).collect::<Vec<_>>(),
            )
            .field("config_path", &self.config_path)
            .field("errors", &self.errors)
            .finish()
    }
}

async fn connect_server(
    name: &str,
    object: &Map<String, Value>,
    cwd: &Path,
    connector: &dyn Connector,
    client_config: &McpClientConfig,
) -> anyhow::Result<(Arc<McpClient>, Vec<ToolBox>)> {
    let config = ServerConfig::from_object(object)?;
    let transport = connector.connect(name, &config, cwd).await?;
    let client = Arc::new(McpClient::connect_with_config(transport, client_config.clone()).await?);

    let tools = client
        .tools()
        .iter()
        .map(|tool| {
            Arc::new(McpServerTool::new(
                name,
                config.transport_name(),
                tool.clone(),
                client.clone(),
            )) as ToolBox
        })
        .collect();
    Ok((client, tools))
}

/// One remote tool, exposed as `<server>__<tool>`.
pub struct McpServerTool {
    server: String,
    transport: &'static str,
    tool: McpTool,
    client: Arc<McpClient>,
}

impl McpServerTool {
    pub fn new(
        server: impl Into<String>,
        transport: &'static str,
        tool: McpTool,
        client: Arc<McpClient>,
    ) -> Self {
        Self {
            server: server.into(),
            transport,
            tool,
            client,
        }
    }

    pub fn qualified_name(&self) -> String {
        format!("{}__{}", self.server, self.tool.name)
    }

    fn description(&self) -> String {
        match self.tool.summary() {
            Some(text) => format!("[MCP:{}] {}", self.server, text),
            None => format!("[MCP:{}]", self.server),
        }
    }
}

#[async_trait]
impl Tool for McpServerTool {
    fn schema(&self) -> ToolSchema {
        let parameters = self
            .tool
            .input_schema
            .clone()
            .filter(|schema| !is_blank_schema(schema))
            .unwrap_or_else(empty_object_schema);
        ToolSchema::new(self.qualified_name(), self.description(), parameters)
    }

    fn metadata(&self) -> ToolMetadata {
        ToolMetadata::new()
            .with("source", "mcp")
            .with("mcp_server", self.server.as_str())
            .with("mcp_tool", self.tool.name.as_str())
            .with("mcp_transport", self.transport)
    }

    async fn execute(&self, args: Value) -> anyhow::Result<String> {
        let arguments = match args {
            Value::Null => Value::Object(Map::new()),
            Value::Object(_) => args,
            other => anyhow::bail!("MCP tool arguments must be a JSON object, got {}", other),
        };

        let result = self.client.call_tool(&self.tool.name, arguments).await?;
        let text = format_call_result(&result);
        if result.is_error {
            if text.is_empty() {
                anyhow::bail!("MCP tool call failed");
            }
            anyhow::bail!(text);
        }
        Ok(text)
    }
}

fn is_blank_schema(schema: &Value) -> bool {
    match schema {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Render a tool result for the model: structured content wins, otherwise
/// the non-empty content blocks joined by newlines.
pub fn format_call_result(result: &CallToolResult) -> String {
    if let Some(structured) = &result.structured_content {
        return serde_json::to_string_pretty(structured).unwrap_or_else(|_| structured.to_string());
    }

    result
        .content
        .iter()
        .map(|block| match block {
            ContentBlock::Text { text, .. } => text.clone(),
            ContentBlock::Other(value) => value.to_string(),
        })
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
