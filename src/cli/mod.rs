//! CLI module for the PCP orchestrator
//!
//! Every subcommand loads the catalog and works against in-memory
//! repositories:
//! - `render`: render a prompt, optionally in a subject's context
//! - `run`: run a workflow
//! - `context`: show a subject's effective policies and objectives
//! - `tools` / `invoke`: list and call the per-prompt tools

pub mod context;
pub mod render;
pub mod run;
pub mod tools;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde_json::Value;

use crate::config::AppConfig;
use crate::domain::prompt::Bindings;
use crate::infrastructure::logging;
use crate::AppState;

/// PCP - Prompt composition, workflows and organizational policies
#[derive(Parser)]
#[command(name = "pcp")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Catalog file, overriding the configured path
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Render a prompt
    Render(render::RenderArgs),

    /// Run a workflow
    Run(run::RunArgs),

    /// Show the effective policies and objectives of a subject
    Context(context::ContextArgs),

    /// List or search the per-prompt tools
    Tools(tools::ToolsArgs),

    /// Invoke a per-prompt tool
    Invoke(tools::InvokeArgs),
}

/// Load `.env`, configuration and logging, then build the services
pub async fn bootstrap(catalog: Option<PathBuf>) -> anyhow::Result<AppState> {
    dotenvy::dotenv().ok();

    let mut config = AppConfig::load().unwrap_or_default();
    logging::init_logging(&config.logging);

    if let Some(path) = catalog {
        config.catalog.path = path;
    }

    crate::create_app_state(&config).await
}

/// Parse a `--input` argument as JSON
pub fn parse_json_input(raw: Option<&str>) -> anyhow::Result<Value> {
    match raw {
        Some(raw) => serde_json::from_str(raw).context("--input must be valid JSON"),
        None => Ok(Value::Object(Bindings::new())),
    }
}

/// Parse a `--input` argument as a JSON object of bindings
pub fn parse_bindings(raw: Option<&str>) -> anyhow::Result<Bindings> {
    match parse_json_input(raw)? {
        Value::Object(bindings) => Ok(bindings),
        other => anyhow::bail!("--input must be a JSON object, got {}", other),
    }
}
