use super::id::ProviderId;

/// Which environment variable feeds which field of a
/// [`ProviderConfig`](super::ProviderConfig).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvBindings {
    pub base_url: Option<&'static str>,
    pub api_key: Option<&'static str>,
    pub api_version: Option<&'static str>,
    pub deployment: Option<&'static str>,
    /// Model used when the spec does not name one
    pub model: Option<&'static str>,
}

impl EnvBindings {
    const NONE: Self = Self {
        base_url: None,
        api_key: None,
        api_version: None,
        deployment: None,
        model: None,
    };
}

/// Static description of one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderEntry {
    pub id: ProviderId,
    pub display_name: &'static str,

    /// Extra spellings accepted in `provider:model`
    pub aliases: &'static [&'static str],

    /// Variables that must be set, checked in this order
    pub required: &'static [&'static str],

    pub bindings: EnvBindings,

    /// Lowercase prefixes of bare model names that select this provider
    pub model_prefixes: &'static [&'static str],

    /// Model used when neither the spec nor the environment names one
    pub default_model: Option<&'static str>,

    /// Whether this provider is picked automatically when `--model` is absent
    pub auto_detect: bool,
}

impl ProviderEntry {
    /// Whether `name` (already lowercased) refers to this provider.
    fn answers_to(&self, name: &str) -> bool {
        self.id.as_str() == name || self.aliases.iter().any(|alias| *alias == name)
    }

    /// Every variable this entry reads, required first.
    pub fn variables(&self) -> Vec<&'static str> {
        let b = &self.bindings;
        let mut vars: Vec<&'static str> = self.required.to_vec();
        for var in [b.base_url, b.api_key, b.api_version, b.deployment, b.model]
            .into_iter()
            .flatten()
        {
            if !vars.contains(&var) {
                vars.push(var);
            }
        }
        vars
    }
}

/// Built-in providers. Order matters: it is the order of `/model` output, and
/// for entries with `model_prefixes` it is the inference priority
/// (`gpt` → openai, `claude` → anthropic, `gemini` → google). Entries with
/// `auto_detect` are tried in the same order.
pub static BUILTIN_PROVIDERS: &[ProviderEntry] = &[
    ProviderEntry {
        id: ProviderId::Ollama,
        display_name: "Ollama",
        aliases: &[],
        required: &["OLLAMA_BASE_URL", "OLLAMA_MODEL"],
        bindings: EnvBindings {
            base_url: Some("OLLAMA_BASE_URL"),
            model: Some("OLLAMA_MODEL"),
            ..EnvBindings::NONE
        },
        model_prefixes: &[],
        default_model: None,
        auto_detect: false,
    },
    ProviderEntry {
        id: ProviderId::LmStudio,
        display_name: "LM Studio",
        aliases: &["lm-studio", "lm_studio"],
        required: &["LMSTUDIO_BASE_URL", "LMSTUDIO_MODEL"],
        bindings: EnvBindings {
            base_url: Some("LMSTUDIO_BASE_URL"),
            api_key: Some("LMSTUDIO_API_KEY"),
            model: Some("LMSTUDIO_MODEL"),
            ..EnvBindings::NONE
        },
        model_prefixes: &[],
        default_model: None,
        auto_detect: false,
    },
    ProviderEntry {
        id: ProviderId::Azure,
        display_name: "Azure OpenAI",
        aliases: &["azure_openai", "azure-openai"],
        required: &[
            "AZURE_OPENAI_ENDPOINT",
            "AZURE_OPENAI_API_KEY",
            "AZURE_OPENAI_API_VERSION",
            "AZURE_OPENAI_DEPLOYMENT",
        ],
        bindings: EnvBindings {
            base_url: Some("AZURE_OPENAI_ENDPOINT"),
            api_key: Some("AZURE_OPENAI_API_KEY"),
            api_version: Some("AZURE_OPENAI_API_VERSION"),
            deployment: Some("AZURE_OPENAI_DEPLOYMENT"),
            model: Some("AZURE_OPENAI_DEPLOYMENT"),
        },
        model_prefixes: &[],
        default_model: None,
        auto_detect: false,
    },
    ProviderEntry {
        id: ProviderId::OpenAi,
        display_name: "OpenAI",
        aliases: &[],
        required: &["OPENAI_API_KEY"],
        bindings: EnvBindings {
            base_url: Some("OPENAI_BASE_URL"),
            api_key: Some("OPENAI_API_KEY"),
            model: Some("OPENAI_MODEL"),
            ..EnvBindings::NONE
        },
        model_prefixes: &["gpt"],
        default_model: Some("gpt-5-mini"),
        auto_detect: true,
    },
    ProviderEntry {
        id: ProviderId::Anthropic,
        display_name: "Anthropic",
        aliases: &[],
        required: &["ANTHROPIC_API_KEY"],
        bindings: EnvBindings {
            base_url: Some("ANTHROPIC_BASE_URL"),
            api_key: Some("ANTHROPIC_API_KEY"),
            model: Some("ANTHROPIC_MODEL"),
            ..EnvBindings::NONE
        },
        model_prefixes: &["claude"],
        default_model: Some("claude-sonnet-4-5-20250929"),
        auto_detect: true,
    },
    ProviderEntry {
        id: ProviderId::Google,
        display_name: "Google Gemini",
        aliases: &["google_genai", "gemini"],
        required: &["GOOGLE_API_KEY"],
        bindings: EnvBindings {
            api_key: Some("GOOGLE_API_KEY"),
            model: Some("GOOGLE_MODEL"),
            ..EnvBindings::NONE
        },
        model_prefixes: &["gemini"],
        default_model: Some("gemini-3-pro-preview"),
        auto_detect: true,
    },
];

/// Lookup table over a fixed set of [`ProviderEntry`] values.
#[derive(Debug, Clone, Copy)]
pub struct ProviderRegistry {
    entries: &'static [ProviderEntry],
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ProviderRegistry {
    pub const fn new(entries: &'static [ProviderEntry]) -> Self {
        Self { entries }
    }

    pub const fn builtin() -> Self {
        Self::new(BUILTIN_PROVIDERS)
    }

    pub fn entries(&self) -> &'static [ProviderEntry] {
        self.entries
    }

    pub fn get(&self, id: ProviderId) -> Option<&'static ProviderEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Case-insensitive lookup by canonical id or alias.
    pub fn lookup(&self, name: &str) -> Option<&'static ProviderEntry> {
        let name = name.trim().to_ascii_lowercase();
        if name.is_empty() {
            return None;
        }
        self.entries.iter().find(|entry| entry.answers_to(&name))
    }

    /// Infer a provider from a bare model name; first matching prefix wins.
    pub fn infer(&self, model: &str) -> Option<&'static ProviderEntry> {
        let model = model.trim().to_ascii_lowercase();
        if model.is_empty() {
            return None;
        }
        self.entries.iter().find(|entry| {
            entry
                .model_prefixes
                .iter()
                .any(|prefix| model.starts_with(prefix))
        })
    }

    /// Canonical ids, comma separated, for error messages.
    pub fn known_ids(&self) -> String {
        self.entries
            .iter()
            .map(|entry| entry.id.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive_and_accepts_aliases() {
        let registry = ProviderRegistry::builtin();
        assert_eq!(registry.lookup("AZURE").map(|e| e.id), Some(ProviderId::Azure));
        assert_eq!(
            registry.lookup("azure_openai").map(|e| e.id),
            Some(ProviderId::Azure)
        );
        assert_eq!(
            registry.lookup("lm-studio").map(|e| e.id),
            Some(ProviderId::LmStudio)
        );
        assert_eq!(
            registry.lookup("google_genai").map(|e| e.id),
            Some(ProviderId::Google)
        );
        assert!(registry.lookup("foo").is_none());
        assert!(registry.lookup("").is_none());
    }

    #[test]
    fn test_infer_by_prefix() {
        let registry = ProviderRegistry::builtin();
        assert_eq!(registry.infer("gpt-4o").map(|e| e.id), Some(ProviderId::OpenAi));
        assert_eq!(
            registry.infer("Claude-3-Opus").map(|e| e.id),
            Some(ProviderId::Anthropic)
        );
        assert_eq!(
            registry.infer("gemini-pro").map(|e| e.id),
            Some(ProviderId::Google)
        );
        assert!(registry.infer("llama3").is_none());
        assert!(registry.infer("my-gpt").is_none());
    }

    #[test]
    fn test_every_required_variable_is_bound_or_listed() {
        for entry in ProviderRegistry::builtin().entries() {
            let vars = entry.variables();
            for required in entry.required {
                assert!(vars.contains(required), "{} lost {}", entry.id, required);
            }
            assert!(
                entry.bindings.model.is_some() || entry.default_model.is_some(),
                "{} has no way to pick a model",
                entry.id
            );
        }
    }

    #[test]
    fn test_azure_variables_are_not_duplicated() {
        let entry = ProviderRegistry::builtin().get(ProviderId::Azure).unwrap();
        assert_eq!(entry.variables().len(), 4);
    }

    #[test]
    fn test_known_ids_in_registry_order() {
        assert_eq!(
            ProviderRegistry::builtin().known_ids(),
            "ollama, lmstudio, azure, openai, anthropic, google"
        );
    }
}
