//! `deepagents-custom`: resolve an LLM provider from `--model` and the
//! environment, load MCP tools from `.mcp.json`, and start a session.
//!
//! ```text
//! deepagents-custom --model ollama:llama3:8b
//! deepagents-custom --model claude-sonnet-4-5-20250929 --no-mcp
//! deepagents-custom --list-providers
//! deepagents-custom --model azure:my-deployment --print-config --json
//! ```

mod args;
mod commands;
mod harness;
mod logging;
mod session;

use anyhow::Context;
use clap::Parser;
use deepagents_core::{
    detect, resolve, EnvSnapshot, ProviderConfig, ProviderRegistry, ProviderReport, ResolveError,
};
use deepagents_mcp::McpToolset;

use crate::args::Cli;
use crate::harness::DetachedHarness;
use crate::session::Session;

fn resolve_provider(cli: &Cli, env: &EnvSnapshot) -> Result<ProviderConfig, ResolveError> {
    match cli.model.as_deref() {
        Some(spec) => resolve(spec, env),
        None => detect(env),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env never overrides variables that are already set
    let _ = dotenvy::dotenv();
    logging::init();
    let cli = Cli::parse();
    let env = EnvSnapshot::from_process();

    if cli.list_providers {
        let active = resolve_provider(&cli, &env).ok();
        print!(
            "{}",
            ProviderReport::build(&ProviderRegistry::builtin(), &env, active.as_ref())
        );
        return Ok(());
    }

    let provider = resolve_provider(&cli, &env)?;
    tracing::info!(provider = %provider.provider, model = %provider.model_id, "provider resolved");

    if cli.print_config {
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&provider)?);
        } else {
            print!("{}", provider);
        }
        return Ok(());
    }

    let cwd = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir().context("cannot determine the working directory")?,
    };
    let toolset = if cli.no_mcp {
        McpToolset::empty()
    } else {
        McpToolset::open(&cwd).await
    };

    let harness = DetachedHarness;
    let session = Session::new(&harness, &provider, &env, &toolset);
    let outcome = session
        .run(std::io::stdin().lock(), std::io::stdout().lock())
        .await;
    toolset.close().await;
    outcome
}
