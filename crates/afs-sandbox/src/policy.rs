// policy.rs — Path admissibility: containment plus an optional extension rule.
//
// Every candidate is joined onto the root and resolved canonically before any
// decision is made, so `..` segments, absolute overrides and symlinks that
// point out of the tree are all judged by where they actually land.

use std::path::{Path, PathBuf};

use crate::error::SandboxError;
use crate::resolve::resolve_lenient;

/// The only extension admitted by [`PathPolicy::ContainmentPlusExtension`].
pub const ALLOWED_EXTENSION: &str = "py";

/// Which checks a candidate path must pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathPolicy {
    /// The resolved path must lie inside the root. Used for directory listing.
    ContainmentOnly,
    /// Containment, and the resolved path must end in `.py` (case-sensitive).
    /// Used for reads and writes.
    #[default]
    ContainmentPlusExtension,
}

impl PathPolicy {
    /// Stable name for logs and audit records.
    pub fn as_str(&self) -> &'static str {
        match self {
            PathPolicy::ContainmentOnly => "containment_only",
            PathPolicy::ContainmentPlusExtension => "containment_plus_extension",
        }
    }
}

impl std::fmt::Display for PathPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve `candidate` under `root` and apply `policy`.
///
/// Returns the resolved absolute path on success. Policy failures come back
/// as [`SandboxError::OutsideSandbox`] or [`SandboxError::DisallowedExtension`];
/// failures of the resolution itself come back as [`SandboxError::Io`].
///
/// The root is resolved with the same rules as the candidate, so a root that
/// is itself reached through a symlink still contains its own files. Both
/// rules look at the resolved path: `notes.py -> secrets.txt` fails the
/// extension rule even though the candidate text ends in `.py`.
pub fn check(
    candidate: &str,
    root: impl AsRef<Path>,
    policy: PathPolicy,
) -> Result<PathBuf, SandboxError> {
    let root = root.as_ref();
    let root = resolve_lenient(root).map_err(|source| SandboxError::Io {
        path: root.to_path_buf(),
        source,
    })?;

    let joined = root.join(candidate);
    let resolved = resolve_lenient(&joined).map_err(|source| SandboxError::Io {
        path: joined.clone(),
        source,
    })?;

    // Component-wise prefix check: "/tmp/proj2" is not inside "/tmp/proj".
    if !resolved.starts_with(&root) {
        tracing::debug!(candidate, resolved = %resolved.display(), "path rejected: outside sandbox");
        return Err(SandboxError::OutsideSandbox {
            path: candidate.to_string(),
        });
    }

    if policy == PathPolicy::ContainmentPlusExtension {
        let extension = resolved.extension().and_then(|ext| ext.to_str());
        if extension != Some(ALLOWED_EXTENSION) {
            let extension = extension
                .map(|ext| format!(".{}", ext))
                .unwrap_or_else(|| "(none)".to_string());
            tracing::debug!(candidate, %extension, "path rejected: extension not allowed");
            return Err(SandboxError::DisallowedExtension {
                path: candidate.to_string(),
                extension,
            });
        }
    }

    Ok(resolved)
}

/// Decide whether `candidate` is a safe `.py` path inside `root`.
///
/// `Ok(false)` means the path was judged and rejected. `Err` means the
/// judgement could not be made because resolution failed.
pub fn validate(candidate: &str, root: impl AsRef<Path>) -> Result<bool, SandboxError> {
    validate_with(candidate, root, PathPolicy::ContainmentPlusExtension)
}

/// [`validate`] with an explicit policy.
pub fn validate_with(
    candidate: &str,
    root: impl AsRef<Path>,
    policy: PathPolicy,
) -> Result<bool, SandboxError> {
    match check(candidate, root, policy) {
        Ok(_) => Ok(true),
        Err(e) if e.is_rejection() => Ok(false),
        Err(e) => Err(e),
    }
}
