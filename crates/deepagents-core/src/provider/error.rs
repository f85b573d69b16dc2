use thiserror::Error;

use super::id::ProviderId;

/// The two user-facing failure classes of resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unrecognized provider id, or a bare model name no rule matches
    UnknownProvider,
    /// A required environment variable is absent
    MissingConfiguration,
}

/// Provider resolution failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("unknown provider '{provider}' (known providers: {known})")]
    UnknownProvider { provider: String, known: String },

    #[error(
        "cannot infer a provider for model '{model}': use provider:model, or a model name starting with gpt, claude, or gemini"
    )]
    UnrecognizedModel { model: String },

    #[error("provider '{provider}' requires environment variable {variable}, which is not set")]
    MissingConfiguration {
        provider: ProviderId,
        variable: &'static str,
    },

    #[error(
        "no model provider configured: set one of {} or pass --model provider:model",
        .checked.join(", ")
    )]
    NoProviderDetected { checked: Vec<&'static str> },
}

impl ResolveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResolveError::UnknownProvider { .. } | ResolveError::UnrecognizedModel { .. } => {
                ErrorKind::UnknownProvider
            }
            ResolveError::MissingConfiguration { .. } | ResolveError::NoProviderDetected { .. } => {
                ErrorKind::MissingConfiguration
            }
        }
    }

    /// The missing variable, for `MissingConfiguration`.
    pub fn variable(&self) -> Option<&'static str> {
        match self {
            ResolveError::MissingConfiguration { variable, .. } => Some(*variable),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ResolveError::MissingConfiguration {
            provider: ProviderId::Azure,
            variable: "AZURE_OPENAI_API_VERSION",
        };
        assert_eq!(
            err.to_string(),
            "provider 'azure' requires environment variable AZURE_OPENAI_API_VERSION, which is not set"
        );
        assert_eq!(err.variable(), Some("AZURE_OPENAI_API_VERSION"));
    }

    #[test]
    fn test_kinds() {
        let unknown = ResolveError::UnknownProvider {
            provider: "foo".into(),
            known: String::new(),
        };
        let unmatched = ResolveError::UnrecognizedModel {
            model: "llama3".into(),
        };
        let none = ResolveError::NoProviderDetected {
            checked: vec!["OPENAI_API_KEY", "ANTHROPIC_API_KEY"],
        };
        assert_eq!(unknown.kind(), ErrorKind::UnknownProvider);
        assert_eq!(unmatched.kind(), ErrorKind::UnknownProvider);
        assert_eq!(none.kind(), ErrorKind::MissingConfiguration);
        assert!(none.to_string().contains("OPENAI_API_KEY, ANTHROPIC_API_KEY"));
    }
}
