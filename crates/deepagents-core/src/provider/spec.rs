use std::fmt;

/// Parsed form of the `--model` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSpec {
    /// `provider:model`. `model` is `None` for `provider:`.
    Qualified {
        provider: String,
        model: Option<String>,
    },
    /// A model name with no provider prefix, e.g. `gpt-4o`.
    Bare(String),
}

impl ModelSpec {
    /// Split at the first `:`, so `ollama:llama3:8b` keeps its tag.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        match raw.split_once(':') {
            Some((provider, model)) => {
                let model = model.trim();
                ModelSpec::Qualified {
                    provider: provider.trim().to_string(),
                    model: (!model.is_empty()).then(|| model.to_string()),
                }
            }
            None => ModelSpec::Bare(raw.to_string()),
        }
    }

    /// The explicitly requested model, if any.
    pub fn model(&self) -> Option<&str> {
        match self {
            ModelSpec::Qualified { model, .. } => model.as_deref(),
            ModelSpec::Bare(name) if !name.is_empty() => Some(name),
            ModelSpec::Bare(_) => None,
        }
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSpec::Qualified { provider, model } => {
                write!(f, "{}:{}", provider, model.as_deref().unwrap_or(""))
            }
            ModelSpec::Bare(name) => f.write_str(name),
        }
    }
}
