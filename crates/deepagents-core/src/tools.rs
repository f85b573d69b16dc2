//! Tool abstraction shared by the session and tool sources (MCP servers).
//!
//! Parameters are carried as raw JSON Schema so schemas coming from remote
//! servers reach the harness untouched.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Schema definition for a tool as presented to the model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolSchema {
    /// Unique, stable name used by the model for invocation
    pub name: String,

    /// Human-readable description of what this tool does
    pub description: String,

    /// JSON Schema of the input object
    pub parameters: Value,
}

impl ToolSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Schema for a tool that takes no arguments.
    pub fn no_params(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, empty_object_schema())
    }
}

/// `{"type": "object", "properties": {}}`
pub fn empty_object_schema() -> Value {
    serde_json::json!({ "type": "object", "properties": {} })
}

/// Free-form provenance attached to a tool (where it came from, over which
/// transport, under which original name).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolMetadata {
    entries: BTreeMap<String, String>,
}

impl ToolMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Core trait for tool implementations
#[async_trait]
pub trait Tool: Send + Sync {
    fn schema(&self) -> ToolSchema;

    fn metadata(&self) -> ToolMetadata {
        ToolMetadata::default()
    }

    /// Run the tool. A tool-level failure is an `Err` whose message is
    /// suitable for showing to the model.
    async fn execute(&self, args: Value) -> anyhow::Result<String>;
}

pub type ToolBox = Arc<dyn Tool>;

/// Name-indexed set of tools, iterated in name order.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, ToolBox>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. The first tool registered under a name keeps it; a
    /// later one with the same name is handed back as the error.
    pub fn register(&mut self, tool: ToolBox) -> Result<(), ToolBox> {
        match self.tools.entry(tool.schema().name) {
            Entry::Vacant(slot) => {
                slot.insert(tool);
                Ok(())
            }
            Entry::Occupied(taken) => {
                tracing::warn!(tool = %taken.key(), "tool name already registered");
                Err(tool)
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolBox> {
        self.tools.values()
    }

    /// Owned handles in name order, as handed to the agent harness.
    pub fn tools(&self) -> Vec<ToolBox> {
        self.tools.values().cloned().collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}
