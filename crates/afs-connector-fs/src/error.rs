// error.rs — Error types for the sandboxed file tools.
//
// Each variant is one user-visible failure mode. The tools render them as
// "Error: <display>" strings, so the Display text is part of the contract
// with the calling agent.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use afs_sandbox::SandboxError;
use thiserror::Error;

use crate::writer::format_size;

/// The filesystem operation that failed, for error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOp {
    Read,
    List,
    Write,
    CreateDir,
}

impl fmt::Display for IoOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            IoOp::Read => "reading file",
            IoOp::List => "listing directory",
            IoOp::Write => "writing file",
            IoOp::CreateDir => "creating directory",
        };
        f.write_str(verb)
    }
}

/// Errors returned by the file tools.
#[derive(Debug, Error)]
pub enum FsToolError {
    /// Not initialized, outside the sandbox, wrong extension, or resolution failure.
    #[error(transparent)]
    Sandbox(#[from] SandboxError),

    /// The resolved path does not exist.
    #[error("path does not exist: {path}")]
    NotFound { path: String },

    /// A file was expected but something else is there.
    #[error("path is not a file: {path}")]
    NotAFile { path: String },

    /// A directory was expected but something else is there.
    #[error("path is not a directory: {path}")]
    NotADirectory { path: String },

    /// Content is larger than the configured limit; nothing was written.
    #[error("content too large: {} exceeds the {} limit", format_size(*.actual), format_size(*.limit))]
    TooLarge { actual: u64, limit: u64 },

    /// Content failed the syntax check; nothing was written.
    #[error("invalid Python syntax: {0}")]
    InvalidSyntax(String),

    /// The OS refused access.
    #[error("permission denied {op} {path}: {source}")]
    PermissionDenied {
        op: IoOp,
        path: String,
        source: io::Error,
    },

    /// Any other OS-level failure, with the original error text.
    #[error("error {op} {path}: {source}")]
    Io {
        op: IoOp,
        path: String,
        source: io::Error,
    },

    /// The tools configuration file could not be read or parsed.
    #[error("invalid config at {path}: {reason}")]
    Config { path: PathBuf, reason: String },
}

impl FsToolError {
    /// Wrap an I/O error, singling out permission failures.
    pub fn io(op: IoOp, path: &Path, source: io::Error) -> Self {
        let path = path.display().to_string();
        if source.kind() == io::ErrorKind::PermissionDenied {
            FsToolError::PermissionDenied { op, path, source }
        } else {
            FsToolError::Io { op, path, source }
        }
    }

    /// True when the request was refused before touching the target
    /// (policy, preconditions); false for OS-level failures.
    pub fn is_rejection(&self) -> bool {
        match self {
            FsToolError::Sandbox(SandboxError::Io { .. }) => false,
            FsToolError::Sandbox(_)
            | FsToolError::NotFound { .. }
            | FsToolError::NotAFile { .. }
            | FsToolError::NotADirectory { .. }
            | FsToolError::TooLarge { .. }
            | FsToolError::InvalidSyntax(_) => true,
            FsToolError::PermissionDenied { .. }
            | FsToolError::Io { .. }
            | FsToolError::Config { .. } => false,
        }
    }
}
