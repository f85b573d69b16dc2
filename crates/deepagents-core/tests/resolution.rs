use deepagents_core::{
    resolve, EnvSnapshot, ErrorKind, ProviderId, ProviderRegistry, ResolveError,
};

/// Every variable any built-in provider reads, set to a plausible value.
fn full_env() -> EnvSnapshot {
    EnvSnapshot::new()
        .with("OLLAMA_BASE_URL", "http://localhost:11434")
        .with("OLLAMA_MODEL", "llama3")
        .with("LMSTUDIO_BASE_URL", "http://localhost:1234/v1")
        .with("LMSTUDIO_MODEL", "qwen2.5-7b-instruct")
        .with("AZURE_OPENAI_ENDPOINT", "https://example.openai.azure.com/")
        .with("AZURE_OPENAI_API_KEY", "azure-key")
        .with("AZURE_OPENAI_API_VERSION", "2024-10-21")
        .with("AZURE_OPENAI_DEPLOYMENT", "prod-gpt4o")
        .with("OPENAI_API_KEY", "openai-key")
        .with("ANTHROPIC_API_KEY", "anthropic-key")
        .with("GOOGLE_API_KEY", "google-key")
}

#[test]
fn qualified_spec_keeps_the_requested_model() {
    let env = full_env();
    for entry in ProviderRegistry::builtin().entries() {
        let spec = format!("{}:custom-model", entry.id);
        let config = resolve(&spec, &env).unwrap();
        assert_eq!(config.provider, entry.id);
        assert_eq!(config.model_id, "custom-model", "spec {}", spec);
    }
}

#[test]
fn bare_models_follow_the_documented_mapping() {
    let env = full_env();
    let cases = [
        ("gpt-4o", ProviderId::OpenAi),
        ("claude-3", ProviderId::Anthropic),
        ("gemini-pro", ProviderId::Google),
    ];
    for (model, expected) in cases {
        let config = resolve(model, &env).unwrap();
        assert_eq!(config.provider, expected, "model {}", model);
        assert_eq!(config.model_id, model);
    }
}

#[test]
fn each_missing_required_variable_is_named() {
    for entry in ProviderRegistry::builtin().entries() {
        for &variable in entry.required {
            let mut env = full_env();
            env.remove(variable);
            let err = resolve(&format!("{}:m", entry.id), &env).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MissingConfiguration);
            assert_eq!(
                err,
                ResolveError::MissingConfiguration {
                    provider: entry.id,
                    variable
                }
            );
            assert!(err.to_string().contains(variable));
        }
    }
}

#[test]
fn unknown_provider_id_is_rejected() {
    let err = resolve("foo:bar", &full_env()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownProvider);
    assert!(matches!(err, ResolveError::UnknownProvider { ref provider, .. } if provider == "foo"));
}

#[test]
fn resolution_is_deterministic() {
    let env = full_env();
    for spec in ["azure:x", "gpt-4o", "ollama:llama3:8b", "foo:bar", "mistral"] {
        assert_eq!(resolve(spec, &env), resolve(spec, &env), "spec {}", spec);
    }
}

#[test]
fn ollama_tags_survive_the_split() {
    let config = resolve("ollama:llama3:8b", &full_env()).unwrap();
    assert_eq!(config.model_id, "llama3:8b");
    assert_eq!(config.base_url.as_deref(), Some("http://localhost:11434"));
}

#[test]
fn azure_example_from_the_readme() {
    let env = EnvSnapshot::new()
        .with("AZURE_OPENAI_ENDPOINT", "https://x/")
        .with("AZURE_OPENAI_API_KEY", "k")
        .with("AZURE_OPENAI_API_VERSION", "2024-10-21")
        .with("AZURE_OPENAI_DEPLOYMENT", "my-deployment");
    let config = resolve("azure:my-deployment", &env).unwrap();
    assert_eq!(config.provider, ProviderId::Azure);
    assert_eq!(config.endpoint(), Some("https://x/"));
    assert_eq!(config.deployment.as_deref(), Some("my-deployment"));
}
