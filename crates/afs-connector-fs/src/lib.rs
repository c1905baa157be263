//! # afs-connector-fs
//!
//! Sandboxed file tools for an autonomous agent.
//!
//! [`FsTools`] confines every read, list and write to one project root (see
//! `afs-sandbox`), writes atomically through a temp file and rename with an
//! optional timestamped backup, checks Python syntax before writing `.py`
//! files, and records every decision in the `afs-audit` log.
//!
//! Each tool has a typed form returning [`FsToolError`] and a string form
//! returning what an agent sees: content or `Success: ...`, else `Error: ...`.
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use afs_connector_fs::{FsTools, SandboxConfig};
//!
//! let mut tools = FsTools::new(SandboxConfig::default());
//! tools.initialize("/tmp/project").unwrap();
//!
//! println!("{}", tools.write("pkg/module.py", "x = 1\n"));
//! println!("{}", tools.read("pkg/module.py"));
//! println!("{}", tools.list("pkg"));
//! ```

pub mod config;
pub mod error;
pub mod syntax;
pub mod tools;
pub mod writer;

pub use config::{SandboxConfig, WriteOptions, CONFIG_DIR, CONFIG_FILE, DEFAULT_MAX_FILE_SIZE};
pub use error::{FsToolError, IoOp};
pub use syntax::{PythonSyntax, SyntaxChecker};
pub use tools::{render_error, FsTools};
pub use writer::{
    backup_path_for, format_size, AtomicFileWriter, BackupStatus, StagedWrite, WriteOutcome,
};
