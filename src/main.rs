// Copyright 2026 BadCompany
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Main entry point for the mcp-guard proxy
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

use mcp_guard::config::{Config, PolicyConfig};
use mcp_guard::engine::policy::Policy;
use mcp_guard::engine_core::audit::AuditLogger;
use mcp_guard::engine_core::models::EntityType;
use mcp_guard::mcp::server::{McpGuard, SessionOutcome};

const EXIT_FAILURE: u8 = 1;
const EXIT_USAGE: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "mcp-guard",
    version,
    about = "mcp-guard: restrict the tools, prompts and resources an MCP server exposes"
)]
struct Cli {
    /// Path to a YAML policy file with `allow` and `deny` maps
    #[arg(long)]
    policy: Option<PathBuf>,

    /// Allow pattern, e.g. `tool:read_*` (repeatable)
    #[arg(long, value_name = "TYPE:PATTERN")]
    allow: Vec<String>,

    /// Deny pattern, e.g. `resource:secret.*` (repeatable, overrides allow)
    #[arg(long, value_name = "TYPE:PATTERN")]
    deny: Vec<String>,

    /// Append-only guard log (defaults to ~/.mcp-guard/logs/guard.log)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Server command and its arguments, after `--`
    #[arg(last = true, required = true, value_name = "COMMAND")]
    command: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    install_panic_hook();

    let mut config = Config::from_env();
    if let Some(p) = &cli.log_file {
        config.log_file = Some(p.clone());
    }
    if let Some(p) = &cli.policy {
        config.policy_path = Some(p.clone());
    }

    if let Err(e) = init_tracing(&config) {
        eprintln!("Failed to init tracing: {}", e);
    }

    let policy = match build_policy(&config, &cli) {
        Ok(policy) => policy,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::from(EXIT_USAGE);
        }
    };

    let log_file = match config.resolve_log_file() {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_USAGE);
        }
    };

    let audit = match AuditLogger::open(&log_file)
        .with_context(|| format!("cannot open guard log {}", log_file.display()))
    {
        Ok(audit) => audit,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    info!("Starting mcp-guard v{}", env!("CARGO_PKG_VERSION"));
    info!("Guard log: {}", audit.path().display());

    match McpGuard::new(cli.command, policy, audit).run().await {
        Ok(SessionOutcome::ClientDisconnected) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Session terminated: {}", e);
            eprintln!("mcp-guard: {}", e);
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn build_policy(config: &Config, cli: &Cli) -> anyhow::Result<Policy> {
    let mut policy_config = match &config.policy_path {
        Some(path) => PolicyConfig::from_file(path)?,
        None => PolicyConfig::default(),
    };
    for rule in &cli.allow {
        policy_config.add_allow(rule)?;
    }
    for rule in &cli.deny {
        policy_config.add_deny(rule)?;
    }

    let policy = policy_config.build().context("invalid policy")?;

    for entity in EntityType::ALL {
        let (allow, deny) = policy.patterns(entity);
        if !allow.is_empty() || !deny.is_empty() {
            info!("Policy for {}: allow={:?} deny={:?}", entity, allow, deny);
        }
    }
    if policy.is_empty() {
        info!("No patterns configured; all entities pass through.");
    }
    Ok(policy)
}

fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());

        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("PANIC: {} at {}", message, location);
    }));
}

fn init_tracing(config: &Config) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout carries the protocol; diagnostics go to stderr only.
    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    if config.log_format == "json" {
        subscriber.json().try_init()?;
    } else {
        subscriber.try_init()?;
    }

    Ok(())
}
