// root.rs — The sandbox root and the registry that holds the current one.
//
// A SandboxRoot is the sole trust anchor: every candidate path is meaningless
// without it. Initialization resolves the project root canonically, refuses
// anything that is not an existing directory, and eagerly creates the two
// reserved children (`_sandbox_backup/` and `logs/`).

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SandboxError;
use crate::policy::{self, PathPolicy};
use crate::resolve::resolve_lenient;

/// Name of the reserved backup directory created under every root.
pub const BACKUP_DIR_NAME: &str = "_sandbox_backup";

/// Name of the reserved log directory created under every root.
pub const LOGS_DIR_NAME: &str = "logs";

/// A resolved, existing sandbox root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxRoot {
    root: PathBuf,
    backup_dir: PathBuf,
    logs_dir: PathBuf,
}

impl SandboxRoot {
    /// Resolve `project_root` and set it up as a sandbox.
    ///
    /// Fails with [`SandboxError::NotFound`] when the resolved path is missing
    /// or is not a directory; the root itself is never created. Safe to call
    /// repeatedly on the same directory.
    pub fn initialize(project_root: impl AsRef<Path>) -> Result<Self, SandboxError> {
        let requested = project_root.as_ref();
        let root = resolve_lenient(requested).map_err(|source| SandboxError::Io {
            path: requested.to_path_buf(),
            source,
        })?;

        if !root.is_dir() {
            return Err(SandboxError::NotFound { path: root });
        }

        let backup_dir = root.join(BACKUP_DIR_NAME);
        let logs_dir = root.join(LOGS_DIR_NAME);
        ensure_dir(&backup_dir)?;
        ensure_dir(&logs_dir)?;

        tracing::info!(root = %root.display(), "sandbox initialized");

        Ok(Self {
            root,
            backup_dir,
            logs_dir,
        })
    }

    /// The resolved root directory.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// The reserved `_sandbox_backup/` directory.
    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// The `logs/` directory reserved for the audit log.
    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    /// Resolve `candidate` under this root and apply `policy`.
    pub fn check(&self, candidate: &str, policy: PathPolicy) -> Result<PathBuf, SandboxError> {
        policy::check(candidate, &self.root, policy)
    }

    /// [`policy::validate`] against this root.
    pub fn validate(&self, candidate: &str) -> Result<bool, SandboxError> {
        policy::validate(candidate, &self.root)
    }

    /// Render `path` relative to the root for user-facing messages.
    ///
    /// The root itself renders as `.`; paths outside the root render in full.
    pub fn relative_display(&self, path: &Path) -> String {
        match path.strip_prefix(&self.root) {
            Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
            Ok(rel) => rel.display().to_string(),
            Err(_) => path.display().to_string(),
        }
    }
}

impl AsRef<Path> for SandboxRoot {
    fn as_ref(&self) -> &Path {
        &self.root
    }
}

/// Create `dir` unless it already exists as a directory.
fn ensure_dir(dir: &Path) -> Result<(), SandboxError> {
    if dir.is_dir() {
        return Ok(());
    }
    fs::create_dir(dir).map_err(|source| SandboxError::Io {
        path: dir.to_path_buf(),
        source,
    })
}

/// Holds the currently active sandbox root, if any.
///
/// Re-initializing replaces the previous root (last writer wins). There is
/// no global instance: whoever owns the registry decides how to share it.
#[derive(Debug, Default)]
pub struct SandboxRegistry {
    current: Option<SandboxRoot>,
}

impl SandboxRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize `project_root` and make it the current root.
    ///
    /// On failure the previously active root, if any, stays in place.
    pub fn initialize(
        &mut self,
        project_root: impl AsRef<Path>,
    ) -> Result<&SandboxRoot, SandboxError> {
        let root = SandboxRoot::initialize(project_root)?;
        if let Some(previous) = &self.current {
            if previous != &root {
                tracing::debug!(
                    previous = %previous.path().display(),
                    next = %root.path().display(),
                    "replacing sandbox root"
                );
            }
        }
        Ok(self.current.insert(root))
    }

    /// The current root, or [`SandboxError::NotInitialized`].
    pub fn root(&self) -> Result<&SandboxRoot, SandboxError> {
        self.current.as_ref().ok_or(SandboxError::NotInitialized)
    }

    /// Whether a root has been initialized.
    pub fn is_initialized(&self) -> bool {
        self.current.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn initialize_creates_reserved_dirs() {
        let dir = tempdir().unwrap();
        let root = SandboxRoot::initialize(dir.path()).unwrap();

        assert_eq!(root.path(), fs::canonicalize(dir.path()).unwrap());
        assert!(root.backup_dir().is_dir());
        assert!(root.logs_dir().is_dir());
        assert!(dir.path().join("_sandbox_backup").is_dir());
        assert!(dir.path().join("logs").is_dir());
    }

    #[test]
    fn initialize_is_idempotent() {
        let dir = tempdir().unwrap();
        let first = SandboxRoot::initialize(dir.path()).unwrap();
        fs::write(first.logs_dir().join("keep.txt"), "x").unwrap();

        let second = SandboxRoot::initialize(dir.path()).unwrap();
        assert_eq!(first, second);
        assert!(second.logs_dir().join("keep.txt").exists());
    }

    #[test]
    fn initialize_missing_root_fails() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("does_not_exist");

        let result = SandboxRoot::initialize(&missing);
        assert!(matches!(result, Err(SandboxError::NotFound { .. })));
        assert!(!missing.exists());
    }

    #[test]
    fn initialize_file_root_fails() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("file.py");
        fs::write(&file, "").unwrap();

        let result = SandboxRoot::initialize(&file);
        assert!(matches!(result, Err(SandboxError::NotFound { .. })));
    }

    #[test]
    fn initialize_handles_spaces() {
        let dir = tempdir().unwrap();
        let spaced = dir.path().join("dir with spaces");
        fs::create_dir(&spaced).unwrap();

        let root = SandboxRoot::initialize(&spaced).unwrap();
        assert_eq!(root.path(), fs::canonicalize(&spaced).unwrap());
        assert!(root.backup_dir().is_dir());
        assert!(root.logs_dir().is_dir());
    }

    #[test]
    fn relative_display_strips_root() {
        let dir = tempdir().unwrap();
        let root = SandboxRoot::initialize(dir.path()).unwrap();

        assert_eq!(root.relative_display(&root.path().join("pkg/a.py")), "pkg/a.py");
        assert_eq!(root.relative_display(root.path()), ".");
    }

    #[test]
    fn registry_reports_not_initialized() {
        let registry = SandboxRegistry::new();
        assert!(!registry.is_initialized());
        assert!(matches!(registry.root(), Err(SandboxError::NotInitialized)));
    }

    #[test]
    fn registry_reinitialize_overwrites() {
        let a = tempdir().unwrap();
        let b = tempdir().unwrap();
        let mut registry = SandboxRegistry::new();

        registry.initialize(a.path()).unwrap();
        registry.initialize(b.path()).unwrap();

        assert_eq!(
            registry.root().unwrap().path(),
            fs::canonicalize(b.path()).unwrap()
        );
    }

    #[test]
    fn registry_keeps_previous_root_on_failure() {
        let a = tempdir().unwrap();
        let mut registry = SandboxRegistry::new();
        registry.initialize(a.path()).unwrap();

        assert!(registry.initialize(a.path().join("nope")).is_err());
        assert_eq!(
            registry.root().unwrap().path(),
            fs::canonicalize(a.path()).unwrap()
        );
    }
}
