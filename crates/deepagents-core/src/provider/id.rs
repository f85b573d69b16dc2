use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a model provider known to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    Ollama,
    #[serde(rename = "lmstudio")]
    LmStudio,
    Azure,
    #[serde(rename = "openai")]
    OpenAi,
    Anthropic,
    Google,
}

impl ProviderId {
    /// Canonical identifier, as used in `provider:model` specs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Ollama => "ollama",
            ProviderId::LmStudio => "lmstudio",
            ProviderId::Azure => "azure",
            ProviderId::OpenAi => "openai",
            ProviderId::Anthropic => "anthropic",
            ProviderId::Google => "google",
        }
    }

    /// Local servers that speak the OpenAI-compatible API.
    pub fn is_local(&self) -> bool {
        matches!(self, ProviderId::Ollama | ProviderId::LmStudio)
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_matches_canonical_id() {
        for id in [
            ProviderId::Ollama,
            ProviderId::LmStudio,
            ProviderId::Azure,
            ProviderId::OpenAi,
            ProviderId::Anthropic,
            ProviderId::Google,
        ] {
            let json = serde_json::to_string(&id).unwrap();
            assert_eq!(json, format!("\"{}\"", id.as_str()));
        }
    }

    #[test]
    fn test_local_providers() {
        assert!(ProviderId::Ollama.is_local());
        assert!(ProviderId::LmStudio.is_local());
        assert!(!ProviderId::Azure.is_local());
    }
}
