//! # afs-cli
//!
//! Command-line front end for the Agent File Sandbox tools:
//! - `afs init` — set up the sandbox root and its support directories
//! - `afs validate/read/list/write` — the agent tools, with their string results
//! - `afs audit verify/tail` — inspect the hash-chained audit log

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use afs_connector_fs::SandboxConfig;

/// Agent File Sandbox — confined, audited file tools for agents.
#[derive(Parser)]
#[command(name = "afs", version, about)]
struct Cli {
    /// Project root directory (defaults to current directory).
    #[arg(long, default_value = ".")]
    project_root: PathBuf,

    /// Agent name recorded in the audit log (overrides .afs/config.toml).
    #[arg(long)]
    agent: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Fs(commands::fs::FsCommands),
    /// Inspect the audit trail.
    Audit {
        #[command(subcommand)]
        command: commands::audit::AuditCommands,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("afs=info".parse()?))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    let mut config = SandboxConfig::for_project(&cli.project_root);
    if let Some(agent) = &cli.agent {
        config.agent_name = agent.clone();
    }
    tracing::debug!(agent = %config.agent_name, audit_log = config.audit_log, "config loaded");

    match &cli.command {
        Commands::Fs(command) => commands::fs::execute(command, &cli.project_root, config),
        Commands::Audit { command } => commands::audit::execute(command, &cli.project_root),
    }
}
