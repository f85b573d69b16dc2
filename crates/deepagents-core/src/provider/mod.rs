//! Provider resolution.
//!
//! A `--model` string plus an [`EnvSnapshot`](crate::env::EnvSnapshot) is
//! turned into a [`ProviderConfig`] by looking the provider up in a static
//! [`ProviderRegistry`]. Resolution is a pure function of its inputs.
//!
//! ```rust
//! use deepagents_core::{resolve, EnvSnapshot, ProviderId};
//!
//! let env = EnvSnapshot::new()
//!     .with("OLLAMA_BASE_URL", "http://localhost:11434")
//!     .with("OLLAMA_MODEL", "llama3");
//! let config = resolve("ollama:qwen2.5-coder", &env).unwrap();
//! assert_eq!(config.provider, ProviderId::Ollama);
//! assert_eq!(config.model_id, "qwen2.5-coder");
//! ```

mod config;
mod error;
mod id;
mod registry;
mod report;
mod resolver;
mod spec;

pub use config::{ApiKey, ProviderConfig};
pub use error::{ErrorKind, ResolveError};
pub use id::ProviderId;
pub use registry::{EnvBindings, ProviderEntry, ProviderRegistry, BUILTIN_PROVIDERS};
pub use report::{ProviderReport, ProviderReportRow, ProviderStatus};
pub use resolver::{detect, resolve};
pub use spec::ModelSpec;
