//! # access-probe
//!
//! Signs in against the admin backend with a bearer token, loads the module
//! catalog and permission snapshot, and prints access decisions as JSON.
//!
//! ## Configuration
//!
//! - `--config` / `ACCESS_CONFIG` - TOML file (optional; defaults otherwise)
//! - `ACCESS_BACKEND_URL`, `ACCESS_TIMEOUT_MS`, `ACCESS_CACHE_CAPACITY` - overrides
//! - `--token` / `ACCESS_TOKEN` - bearer credential
//! - `RUST_LOG` - log filter (default: info)

use adminkit_access::{AccessConfig, AccessSession, Credential};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "access-probe")]
#[command(about = "Inspect the module permissions a token resolves to")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "ACCESS_CONFIG")]
    config: Option<PathBuf>,

    /// Bearer token
    #[arg(short, long, env = "ACCESS_TOKEN", hide_env_values = true)]
    token: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print decisions for the given modules (names or ids)
    Check {
        #[arg(required = true)]
        modules: Vec<String>,
    },

    /// Print every catalog module with its decision
    Modules,

    /// Print session status, staleness and sync diagnostics
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{},adminkit_access={}", log_level, log_level).into()),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => AccessConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => AccessConfig::default(),
    }
    .with_env_overrides()
    .context("Invalid environment override")?;

    config.validate().context("Invalid configuration")?;

    let session = AccessSession::connect(&config).context("Failed to build backend client")?;
    session.sign_in(Credential::new(cli.token.clone()));

    info!(backend = %config.backend.base_url, "bootstrapping session");
    if !session.bootstrap().await {
        let cause = session
            .diagnostics()
            .last_failure()
            .and_then(|record| record.cause)
            .unwrap_or_else(|| "unknown".to_string());
        warn!(%cause, "snapshot sync failed");
    }

    let output = match cli.command {
        Command::Check { modules } => {
            let decisions: Vec<_> = modules
                .iter()
                .map(|module| {
                    let (decision, basis) = session.explain(module);
                    json!({ "module": module, "decision": decision, "basis": basis })
                })
                .collect();
            json!(decisions)
        }
        Command::Modules => {
            let decisions: Vec<_> = session
                .decide_all()
                .into_iter()
                .map(|(module, decision)| {
                    json!({ "id": module.id, "name": module.name, "decision": decision })
                })
                .collect();
            json!(decisions)
        }
        Command::Status => {
            let snapshot = session.snapshot();
            json!({
                "authenticated": session.is_authenticated(),
                "admin": session.is_admin(),
                "user": snapshot.as_ref().map(|s| s.user().name.clone()),
                "role": snapshot.as_ref().map(|s| s.role().name.clone()),
                "grants": snapshot.as_ref().map(|s| s.grants().len()),
                "modules": session.resolver().len(),
                "staleness": session.staleness(),
                "sync_state": session.sync_state(),
                "sync_records": session.diagnostics().records(),
            })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
