use serde::{Serialize, Serializer};
use std::fmt;

use super::id::ProviderId;

const REDACTED: &str = "[redacted]";

/// Credential that never shows up in logs, `Debug` output, or JSON.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw key, for handing to a client. Do not log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey({})", REDACTED)
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl Serialize for ApiKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(REDACTED)
    }
}

/// Normalized connection descriptor produced by the resolver.
///
/// Fields that do not apply to the provider are `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderConfig {
    pub provider: ProviderId,

    /// Model name passed to the provider
    pub model_id: String,

    /// API base URL, or the resource endpoint for Azure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<ApiKey>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment: Option<String>,
}

impl ProviderConfig {
    pub fn new(provider: ProviderId, model_id: impl Into<String>) -> Self {
        Self {
            provider,
            model_id: model_id.into(),
            base_url: None,
            api_key: None,
            api_version: None,
            deployment: None,
        }
    }

    /// Azure's name for the base URL.
    pub fn endpoint(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// `provider:model`, the form accepted back by `--model`.
    pub fn qualified_name(&self) -> String {
        format!("{}:{}", self.provider, self.model_id)
    }

    /// Label/value pairs for human-readable output. The key is redacted.
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        let mut rows = vec![
            ("provider", self.provider.to_string()),
            ("model", self.model_id.clone()),
        ];
        if let Some(url) = &self.base_url {
            rows.push(("base_url", url.clone()));
        }
        if let Some(key) = &self.api_key {
            rows.push(("api_key", key.to_string()));
        }
        if let Some(version) = &self.api_version {
            rows.push(("api_version", version.clone()));
        }
        if let Some(deployment) = &self.deployment {
            rows.push(("deployment", deployment.clone()));
        }
        rows
    }
}

impl fmt::Display for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (label, value) in self.summary() {
            writeln!(f, "{:<12} {}", label, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ProviderConfig {
        ProviderConfig {
            api_key: Some(ApiKey::new("sk-very-secret")),
            base_url: Some("https://api.example.com/v1".into()),
            ..ProviderConfig::new(ProviderId::OpenAi, "gpt-4o")
        }
    }

    #[test]
    fn test_key_is_redacted_everywhere() {
        let config = sample();
        assert!(!format!("{:?}", config).contains("sk-very-secret"));
        assert!(!config.to_string().contains("sk-very-secret"));
        assert!(!serde_json::to_string(&config).unwrap().contains("sk-very-secret"));
        assert_eq!(config.api_key.as_ref().unwrap().expose(), "sk-very-secret");
    }

    #[test]
    fn test_json_skips_absent_fields() {
        let json = serde_json::to_value(ProviderConfig::new(ProviderId::Google, "gemini-pro")).unwrap();
        assert_eq!(json, serde_json::json!({"provider": "google", "model_id": "gemini-pro"}));
    }

    #[test]
    fn test_qualified_name() {
        assert_eq!(sample().qualified_name(), "openai:gpt-4o");
    }
}
