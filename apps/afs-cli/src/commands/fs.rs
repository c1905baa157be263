// fs.rs — File tool subcommands: init, validate, read, list, write.

use std::io::Read;
use std::path::Path;

use anyhow::Context;
use clap::Subcommand;

use afs_connector_fs::{FsTools, SandboxConfig};

#[derive(Subcommand)]
pub enum FsCommands {
    /// Initialize the sandbox root (creates _sandbox_backup/ and logs/).
    Init,
    /// Check whether a path is a safe .py path inside the sandbox.
    Validate {
        /// Path relative to the project root.
        path: String,
    },
    /// Print a .py file from the sandbox.
    Read {
        /// Path relative to the project root.
        path: String,
    },
    /// List a directory in the sandbox, one sorted name per line.
    List {
        /// Directory relative to the project root (defaults to the root).
        #[arg(default_value = "")]
        path: String,
    },
    /// Atomically write a .py file in the sandbox.
    Write {
        /// Path relative to the project root.
        path: String,
        /// Content to write (read from stdin when omitted).
        #[arg(long)]
        content: Option<String>,
    },
}

pub fn execute(cmd: &FsCommands, project_root: &Path, config: SandboxConfig) -> anyhow::Result<()> {
    let mut tools = FsTools::new(config);
    let root = tools
        .initialize(project_root)
        .with_context(|| format!("cannot initialize sandbox at {}", project_root.display()))?;

    match cmd {
        FsCommands::Init => {
            println!("{}", root.display());
            Ok(())
        }
        FsCommands::Validate { path } => {
            println!("{}", tools.validate(path)?);
            Ok(())
        }
        FsCommands::Read { path } => {
            print_block(&tools.read_file(path)?);
            Ok(())
        }
        FsCommands::List { path } => {
            print_block(&tools.list_dir(path)?.join("\n"));
            Ok(())
        }
        FsCommands::Write { path, content } => {
            let content = match content {
                Some(content) => content.clone(),
                None => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("failed to read content from stdin")?;
                    buf
                }
            };
            let outcome = tools.write_file(path, &content)?;
            println!("{}", tools.write_message(&outcome));
            Ok(())
        }
    }
}

/// Print `text` as-is, ending with exactly the newline it already has or one more.
fn print_block(text: &str) {
    if text.is_empty() || text.ends_with('\n') {
        print!("{}", text);
    } else {
        println!("{}", text);
    }
}
