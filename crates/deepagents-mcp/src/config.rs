//! `.mcp.json` discovery and parsing.
//!
//! Three layouts are accepted:
//!
//! ```json
//! { "mcpServers": { "tavily": { "command": "npx", "args": ["-y", "tavily-mcp"] } } }
//! { "servers":    { "docs":   { "type": "http", "url": "https://example.com/mcp" } } }
//! { "tavily": { "command": "npx -y tavily-mcp" } }
//! ```

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = ".mcp.json";

/// Top-level keys of a simplified server map that are not servers.
const META_KEYS: &[&str] = &["$schema", "version", "inputs", "env"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {}: invalid JSON: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Missing 'command' for stdio MCP server")]
    MissingCommand,

    #[error("Missing 'url' for HTTP/SSE MCP server")]
    MissingUrl,

    #[error("Expected either 'command' or 'url' in MCP server config")]
    NoTransport,
}

/// Nearest `.mcp.json` in `start` or any of its ancestors.
pub fn find_config_path(start: &Path) -> Option<PathBuf> {
    let start = start.canonicalize().unwrap_or_else(|_| start.to_path_buf());
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

pub fn load_config(path: &Path) -> Result<Value, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Server definitions keyed by name; empty when the document matches no layout.
pub fn extract_servers(data: &Value) -> BTreeMap<String, Value> {
    let Some(root) = data.as_object() else {
        return BTreeMap::new();
    };

    for key in ["mcpServers", "servers"] {
        if let Some(Value::Object(servers)) = root.get(key) {
            return collect(servers.iter());
        }
    }

    let candidates: Vec<(&String, &Value)> = root
        .iter()
        .filter(|(key, _)| !META_KEYS.contains(&key.as_str()))
        .collect();
    if candidates.is_empty() {
        return BTreeMap::new();
    }

    let all_servers = candidates.iter().all(|(_, value)| match value {
        Value::Object(cfg) => ["command", "url", "type"]
            .iter()
            .any(|field| cfg.contains_key(*field)),
        _ => false,
    });
    if all_servers {
        collect(candidates.into_iter())
    } else {
        BTreeMap::new()
    }
}

fn collect<'a>(entries: impl Iterator<Item = (&'a String, &'a Value)>) -> BTreeMap<String, Value> {
    entries.map(|(k, v)| (k.clone(), v.clone())).collect()
}

/// How to reach one MCP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerConfig {
    Stdio {
        command: String,
        args: Vec<String>,
        env: BTreeMap<String, String>,
    },
    Http {
        url: String,
        headers: BTreeMap<String, String>,
    },
    Sse {
        url: String,
        headers: BTreeMap<String, String>,
    },
}

impl ServerConfig {
    /// `command` wins over `url`; a `url` is streamable HTTP unless `type` is `sse`.
    pub fn from_object(cfg: &Map<String, Value>) -> Result<Self, ConfigError> {
        if cfg.contains_key("command") {
            let (command, args) = normalize_stdio_command(cfg.get("command"), cfg.get("args"));
            if command.is_empty() {
                return Err(ConfigError::MissingCommand);
            }
            return Ok(ServerConfig::Stdio {
                command,
                args,
                env: string_map(cfg.get("env")),
            });
        }

        if cfg.contains_key("url") {
            let url = match cfg.get("url") {
                Some(Value::String(url)) if !url.is_empty() => url.clone(),
                _ => return Err(ConfigError::MissingUrl),
            };
            let headers = string_map(cfg.get("headers"));
            return Ok(match cfg.get("type").and_then(Value::as_str) {
                Some("sse") => ServerConfig::Sse { url, headers },
                _ => ServerConfig::Http { url, headers },
            });
        }

        Err(ConfigError::NoTransport)
    }

    pub fn transport_name(&self) -> &'static str {
        match self {
            ServerConfig::Stdio { .. } => "stdio",
            ServerConfig::Http { .. } => "http",
            ServerConfig::Sse { .. } => "sse",
        }
    }
}

/// Accept `"command": "npx -y pkg"` with no `args` by splitting it shell-style.
pub fn normalize_stdio_command(
    raw_command: Option<&Value>,
    raw_args: Option<&Value>,
) -> (String, Vec<String>) {
    let command = raw_command
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let args: Vec<String> = match raw_args {
        Some(Value::Array(items)) => items.iter().map(scalar_to_string).collect(),
        _ => Vec::new(),
    };

    if !command.is_empty() && args.is_empty() && command.chars().any(char::is_whitespace) {
        if let Some(mut parts) = shlex::split(&command) {
            if !parts.is_empty() {
                let program = parts.remove(0);
                return (program, parts);
            }
        }
    }
    (command, args)
}

fn string_map(value: Option<&Value>) -> BTreeMap<String, String> {
    match value {
        Some(Value::Object(map)) => map
            .iter()
            .map(|(k, v)| (k.clone(), scalar_to_string(v)))
            .collect(),
        _ => BTreeMap::new(),
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
