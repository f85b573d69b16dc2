//! Read-only overview of every registered provider, as shown by `/model`.

use std::fmt;

use super::config::ProviderConfig;
use super::error::ResolveError;
use super::id::ProviderId;
use super::registry::ProviderRegistry;
use crate::env::EnvSnapshot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderStatus {
    /// Resolves with no explicit model
    Ready {
        model_id: String,
        base_url: Option<String>,
    },
    /// Required variables that are not set
    Missing { variables: Vec<&'static str> },
}

impl ProviderStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, ProviderStatus::Ready { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderReportRow {
    pub provider: ProviderId,
    pub display_name: &'static str,
    pub status: ProviderStatus,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderReport {
    rows: Vec<ProviderReportRow>,
}

impl ProviderReport {
    /// Resolve every registry entry as `<id>:` and record the outcome.
    pub fn build(
        registry: &ProviderRegistry,
        env: &EnvSnapshot,
        active: Option<&ProviderConfig>,
    ) -> Self {
        let rows = registry
            .entries()
            .iter()
            .map(|entry| {
                let status = match registry.resolve_entry(entry, None, env) {
                    Ok(config) => ProviderStatus::Ready {
                        model_id: config.model_id,
                        base_url: config.base_url,
                    },
                    Err(ResolveError::MissingConfiguration { variable, .. }) => {
                        let mut variables = registry.missing_variables(entry, env);
                        if variables.is_empty() {
                            variables.push(variable);
                        }
                        ProviderStatus::Missing { variables }
                    }
                    // resolve_entry only fails on missing configuration
                    Err(_) => ProviderStatus::Missing {
                        variables: entry.required.to_vec(),
                    },
                };
                ProviderReportRow {
                    provider: entry.id,
                    display_name: entry.display_name,
                    status,
                    active: active.map(|c| c.provider) == Some(entry.id),
                }
            })
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[ProviderReportRow] {
        &self.rows
    }

    pub fn ready(&self) -> impl Iterator<Item = &ProviderReportRow> {
        self.rows.iter().filter(|row| row.status.is_ready())
    }
}

impl fmt::Display for ProviderReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  {:<10} {:<15} {}", "PROVIDER", "NAME", "STATUS")?;
        for row in &self.rows {
            let marker = if row.active { '*' } else { ' ' };
            let status = match &row.status {
                ProviderStatus::Ready { model_id, base_url } => match base_url {
                    Some(url) => format!("ready  {} @ {}", model_id, url),
                    None => format!("ready  {}", model_id),
                },
                ProviderStatus::Missing { variables } => {
                    format!("missing {}", variables.join(", "))
                }
            };
            writeln!(
                f,
                "{} {:<10} {:<15} {}",
                marker,
                row.provider.as_str(),
                row.display_name,
                status
            )?;
        }
        Ok(())
    }
}
