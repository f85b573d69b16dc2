use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "deepagents-custom")]
#[command(version, about = "Deep Agents CLI with a pluggable LLM provider")]
pub struct Cli {
    /// Model spec: `provider:model`, a bare model name, or a provider id.
    /// Omit to pick the first provider with an API key in the environment.
    #[arg(short, long, value_name = "SPEC")]
    pub model: Option<String>,

    /// Print provider availability and exit
    #[arg(long)]
    pub list_providers: bool,

    /// Resolve the provider, print its configuration (key redacted) and exit
    #[arg(long)]
    pub print_config: bool,

    /// With --print-config, emit JSON
    #[arg(long, requires = "print_config")]
    pub json: bool,

    /// Do not load MCP servers from .mcp.json
    #[arg(long)]
    pub no_mcp: bool,

    /// Where to start looking for .mcp.json; also the working directory of stdio servers
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_model_and_flags() {
        let cli = Cli::try_parse_from([
            "deepagents-custom",
            "-m",
            "ollama:llama3:8b",
            "--no-mcp",
            "--cwd",
            "/work",
        ])
        .unwrap();
        assert_eq!(cli.model.as_deref(), Some("ollama:llama3:8b"));
        assert!(cli.no_mcp);
        assert_eq!(cli.cwd, Some(PathBuf::from("/work")));
        assert!(!cli.print_config);
    }

    #[test]
    fn json_requires_print_config() {
        assert!(Cli::try_parse_from(["deepagents-custom", "--json"]).is_err());
        let cli =
            Cli::try_parse_from(["deepagents-custom", "--print-config", "--json"]).unwrap();
        assert!(cli.print_config && cli.json);
    }
}
