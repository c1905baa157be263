// resolve.rs — Canonical path resolution that tolerates missing components.
//
// `fs::canonicalize` refuses paths that do not exist yet, but a write target
// usually does not exist. resolve_lenient therefore walks the path one
// component at a time and builds the answer itself:
//
//   - `.` is dropped.
//   - `..` pops the last resolved component. Because every component already
//     in the buffer has had its symlinks replaced, popping moves to the real
//     parent, the same way the kernel would.
//   - A normal component is looked up with `symlink_metadata`. A symlink is
//     replaced by its (recursively resolved) target; anything else is kept.
//   - A component that does not exist is kept as plain text.
//
// Every component is looked up, including ones that follow a missing one.
// Below a missing directory the lookup just reports NotFound again, but a
// `..` can climb back out of the missing part into real directories, and from
// there a symlink must be followed again. Taking the remainder lexically
// would let `ghost/../link/x.py` slip through a link that points outside
// the sandbox.
//
// Symlink chains are bounded by MAX_SYMLINK_HOPS across the whole walk,
// matching the kernel's ELOOP limit; a loop surfaces as an I/O error so that
// callers can tell "could not decide" apart from "rejected".

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Upper bound on symlinks followed during a single resolution.
const MAX_SYMLINK_HOPS: usize = 40;

/// Resolve `path` to an absolute path with symlinks and `.`/`..` collapsed.
///
/// Relative inputs are taken relative to the current directory. Components
/// that do not exist are kept as-is, with any later `..` popping them
/// lexically. Fails on symlink loops and on OS errors other than "not found".
pub fn resolve_lenient(path: &Path) -> io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    let mut hops = 0;
    resolve_components(&absolute, &mut hops)
}

fn resolve_components(path: &Path, hops: &mut usize) -> io::Result<PathBuf> {
    let mut resolved = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => resolved.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                // At the filesystem root this is a no-op, as in the kernel.
                resolved.pop();
            }
            Component::Normal(name) => {
                let next = resolved.join(name);
                match fs::symlink_metadata(&next) {
                    Ok(meta) if meta.file_type().is_symlink() => {
                        *hops += 1;
                        if *hops > MAX_SYMLINK_HOPS {
                            return Err(io::Error::other(format!(
                                "too many levels of symbolic links at {}",
                                next.display()
                            )));
                        }
                        let target = fs::read_link(&next)?;
                        // Relative link targets are interpreted from the link's directory.
                        let target = if target.is_absolute() {
                            target
                        } else {
                            resolved.join(target)
                        };
                        resolved = resolve_components(&target, hops)?;
                    }
                    Ok(_) => resolved = next,
                    // Below a regular file nothing can exist either.
                    Err(e)
                        if matches!(
                            e.kind(),
                            io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
                        ) =>
                    {
                        resolved = next
                    }
                    Err(e) => return Err(e),
                }
            }
        }
    }

    Ok(resolved)
}
