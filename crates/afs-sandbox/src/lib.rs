//! # afs-sandbox
//!
//! Sandbox root and path containment policy for Agent File Sandbox.
//!
//! An agent names files with plain strings. Before any of those strings is
//! used for I/O it is joined onto the sandbox root, canonically resolved
//! (symlinks followed, `..` collapsed), and checked against a [`PathPolicy`].
//!
//! ## Key components
//!
//! - [`SandboxRoot`] — the resolved root directory plus its reserved
//!   `_sandbox_backup/` and `logs/` children. Passed explicitly to every check.
//! - [`SandboxRegistry`] — an owned slot holding the current root. Reports
//!   [`SandboxError::NotInitialized`] until a root has been set.
//! - [`PathPolicy`] — `ContainmentOnly` (listing) or
//!   `ContainmentPlusExtension` (read/write of `.py` sources).
//! - [`validate`] / [`check`] — the admissibility decision itself.

pub mod error;
pub mod policy;
pub mod resolve;
pub mod root;

pub use error::SandboxError;
pub use policy::{check, validate, validate_with, PathPolicy, ALLOWED_EXTENSION};
pub use resolve::resolve_lenient;
pub use root::{SandboxRegistry, SandboxRoot, BACKUP_DIR_NAME, LOGS_DIR_NAME};
