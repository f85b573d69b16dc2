use tracing::debug;

use super::config::{ApiKey, ProviderConfig};
use super::error::ResolveError;
use super::registry::{ProviderEntry, ProviderRegistry};
use super::spec::ModelSpec;
use crate::env::EnvSnapshot;

/// Resolve a `--model` string against the built-in registry.
pub fn resolve(model_spec: &str, env: &EnvSnapshot) -> Result<ProviderConfig, ResolveError> {
    ProviderRegistry::builtin().resolve(model_spec, env)
}

/// Pick a provider from whichever cloud API key is set.
pub fn detect(env: &EnvSnapshot) -> Result<ProviderConfig, ResolveError> {
    ProviderRegistry::builtin().detect(env)
}

impl ProviderRegistry {
    pub fn resolve(
        &self,
        model_spec: &str,
        env: &EnvSnapshot,
    ) -> Result<ProviderConfig, ResolveError> {
        let spec = ModelSpec::parse(model_spec);
        let (entry, model) = self.select(&spec)?;
        let config = self.resolve_entry(entry, model, env)?;
        debug!(
            spec = %spec,
            provider = %config.provider,
            model = %config.model_id,
            "resolved model provider"
        );
        Ok(config)
    }

    pub fn detect(&self, env: &EnvSnapshot) -> Result<ProviderConfig, ResolveError> {
        let candidates = self.entries().iter().filter(|entry| entry.auto_detect);
        let mut checked = Vec::new();
        for entry in candidates {
            let Some(key_var) = entry.bindings.api_key else {
                continue;
            };
            if env.contains(key_var) {
                debug!(provider = %entry.id, via = key_var, "detected model provider");
                return self.resolve_entry(entry, None, env);
            }
            checked.push(key_var);
        }
        Err(ResolveError::NoProviderDetected { checked })
    }

    /// Read `entry`'s variables from `env` and assemble its config.
    /// `model` overrides the model/deployment variables when given.
    pub fn resolve_entry(
        &self,
        entry: &ProviderEntry,
        model: Option<&str>,
        env: &EnvSnapshot,
    ) -> Result<ProviderConfig, ResolveError> {
        if let Some(variable) = first_missing(entry, env) {
            return Err(ResolveError::MissingConfiguration {
                provider: entry.id,
                variable,
            });
        }

        let bindings = &entry.bindings;
        let read = |var: Option<&'static str>| var.and_then(|v| env.get(v)).map(str::to_string);

        let model_id = model
            .map(str::to_string)
            .or_else(|| read(bindings.model))
            .or_else(|| entry.default_model.map(str::to_string))
            .ok_or(ResolveError::MissingConfiguration {
                provider: entry.id,
                variable: bindings.model.unwrap_or("--model"),
            })?;

        Ok(ProviderConfig {
            provider: entry.id,
            model_id,
            base_url: read(bindings.base_url),
            api_key: read(bindings.api_key).map(ApiKey::new),
            api_version: read(bindings.api_version),
            deployment: read(bindings.deployment),
        })
    }

    /// Every required variable of `entry` that is absent, in registry order.
    pub fn missing_variables(&self, entry: &ProviderEntry, env: &EnvSnapshot) -> Vec<&'static str> {
        entry
            .required
            .iter()
            .copied()
            .filter(|var| !env.contains(var))
            .collect()
    }

    fn select<'s>(
        &self,
        spec: &'s ModelSpec,
    ) -> Result<(&'static ProviderEntry, Option<&'s str>), ResolveError> {
        match spec {
            ModelSpec::Qualified { provider, model } => {
                let entry = self
                    .lookup(provider)
                    .ok_or_else(|| ResolveError::UnknownProvider {
                        provider: provider.clone(),
                        known: self.known_ids(),
                    })?;
                Ok((entry, model.as_deref()))
            }
            ModelSpec::Bare(name) => {
                if let Some(entry) = self.lookup(name) {
                    return Ok((entry, None));
                }
                match self.infer(name) {
                    Some(entry) => Ok((entry, Some(name.as_str()))),
                    None => Err(ResolveError::UnrecognizedModel {
                        model: name.clone(),
                    }),
                }
            }
        }
    }
}

fn first_missing(entry: &ProviderEntry, env: &EnvSnapshot) -> Option<&'static str> {
    entry.required.iter().copied().find(|var| !env.contains(var))
}
