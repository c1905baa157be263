// audit.rs — `afs audit verify|tail` over <root>/logs/audit.jsonl.

use std::path::{Path, PathBuf};

use clap::Subcommand;

use afs_audit::{AuditError, AuditEvent, AuditLog, AUDIT_LOG_FILE};

#[derive(Subcommand)]
pub enum AuditCommands {
    /// Check that no line of the audit log was inserted, removed or edited.
    Verify {
        /// Log file to check instead of <root>/logs/audit.jsonl.
        #[arg(long)]
        log: Option<PathBuf>,
    },
    /// Print the most recent audit events.
    Tail {
        /// Log file to read instead of <root>/logs/audit.jsonl.
        #[arg(long)]
        log: Option<PathBuf>,
        /// How many events to print.
        #[arg(short, default_value = "10")]
        n: usize,
    },
}

pub fn execute(cmd: &AuditCommands, project_root: &Path) -> anyhow::Result<()> {
    let (AuditCommands::Verify { log } | AuditCommands::Tail { log, .. }) = cmd;
    let path = log
        .clone()
        .unwrap_or_else(|| project_root.join("logs").join(AUDIT_LOG_FILE));

    if !path.exists() {
        println!("No audit log at {}", path.display());
        return Ok(());
    }

    match cmd {
        AuditCommands::Verify { .. } => verify(&path),
        AuditCommands::Tail { n, .. } => tail(&path, *n),
    }
}

fn verify(path: &Path) -> anyhow::Result<()> {
    match AuditLog::verify_chain(path) {
        Ok(count) => {
            println!("{}: {} event(s), hash chain intact", path.display(), count);
            Ok(())
        }
        Err(AuditError::IntegrityViolation {
            line,
            expected,
            actual,
        }) => {
            println!("INTEGRITY VIOLATION in {} at line {}", path.display(), line);
            println!("  previous_hash should be {}", expected);
            println!("  previous_hash found     {}", actual);
            anyhow::bail!("audit log has been altered");
        }
        Err(e) => Err(e.into()),
    }
}

fn tail(path: &Path, n: usize) -> anyhow::Result<()> {
    let events = AuditLog::read_all(path)?;
    let recent = &events[events.len().saturating_sub(n)..];
    if recent.is_empty() {
        println!("Audit log is empty.");
        return Ok(());
    }
    for event in recent {
        println!("{}", summary_line(event));
    }
    Ok(())
}

/// `2024-03-09 07:05:01  bot  Write    Success   pkg/m.py`
fn summary_line(event: &AuditEvent) -> String {
    format!(
        "{}  {}  {:<8} {:<9} {}",
        event.timestamp.format("%Y-%m-%d %H:%M:%S"),
        event.agent_name,
        format!("{:?}", event.action),
        format!("{:?}", event.status),
        event.target.as_deref().unwrap_or("-"),
    )
}
