// error.rs — Error types for sandbox setup and path validation.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while setting up the sandbox or checking a path.
#[derive(Debug, Error)]
pub enum SandboxError {
    /// A file operation was attempted before any root was initialized.
    #[error("sandbox not initialized: call initialize() with a project root first")]
    NotInitialized,

    /// The project root does not exist or is not a directory.
    #[error("project root does not exist: {path}")]
    NotFound { path: PathBuf },

    /// The candidate resolves outside the sandbox root.
    #[error("unsafe path '{path}': resolves outside the sandbox root")]
    OutsideSandbox { path: String },

    /// The candidate has an extension the policy does not admit.
    #[error("unsafe path '{path}': extension '{extension}' is not allowed (only .py files)")]
    DisallowedExtension { path: String, extension: String },

    /// Resolving or creating a path failed at the OS level.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl SandboxError {
    /// True for the two policy rejections (as opposed to setup or OS failures).
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            SandboxError::OutsideSandbox { .. } | SandboxError::DisallowedExtension { .. }
        )
    }
}
