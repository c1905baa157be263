// writer.rs — Gated, atomic replacement of a single file.
//
// A write passes four gates in order: size limit, syntax check, backup of the
// previous content, then the atomic replace. The replace stages content in a
// temp file in the target's own directory (same filesystem, so the final
// rename is atomic), syncs it, and renames it over the target. A reader of the
// target sees either the old bytes or the new bytes, never a mix.
//
// A StagedWrite that is dropped without commit() removes its temp file and
// leaves the target untouched.
//
// Backups sit beside the target as <stem>.backup_<YYYYMMDD_HHMMSS><suffix>.
// A second backup within the same second gets _1, _2, ... after the stamp;
// an existing backup is never overwritten. A failed backup does not stop
// the write, it only turns into a warning on the outcome.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use afs_sandbox::ALLOWED_EXTENSION;
use chrono::{Local, NaiveDateTime};
use tempfile::NamedTempFile;

use crate::config::WriteOptions;
use crate::error::{FsToolError, IoOp};
use crate::syntax::{PythonSyntax, SyntaxChecker};

/// What happened to the backup of the previous content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupStatus {
    /// Backups disabled, or there was no previous file.
    Skipped,
    /// The previous content was copied here.
    Created(PathBuf),
    /// The copy failed; the write went ahead anyway.
    Failed(String),
}

/// Result of a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    pub path: PathBuf,
    /// Size of the target on disk after the replace.
    pub bytes_written: u64,
    pub backup: BackupStatus,
}

/// Applies [`WriteOptions`] and performs the atomic replace.
pub struct AtomicFileWriter {
    options: WriteOptions,
    checker: Box<dyn SyntaxChecker>,
}

impl AtomicFileWriter {
    /// Writer with the Python syntax checker.
    pub fn new(options: WriteOptions) -> Self {
        Self {
            options,
            checker: Box::new(PythonSyntax),
        }
    }

    /// Replace the syntax checker.
    pub fn with_checker(mut self, checker: Box<dyn SyntaxChecker>) -> Self {
        self.checker = checker;
        self
    }

    pub fn options(&self) -> &WriteOptions {
        &self.options
    }

    /// Write `content` to the already-validated absolute path `target`.
    pub fn write(&self, target: &Path, content: &str) -> Result<WriteOutcome, FsToolError> {
        let actual = content.len() as u64;
        if actual > self.options.max_file_size {
            return Err(FsToolError::TooLarge {
                actual,
                limit: self.options.max_file_size,
            });
        }

        if self.options.validate_syntax && is_python(target) {
            self.checker
                .check(content)
                .map_err(FsToolError::InvalidSyntax)?;
        }

        if target.exists() && !target.is_file() {
            return Err(FsToolError::NotAFile {
                path: target.display().to_string(),
            });
        }

        let backup = if self.options.create_backup && target.is_file() {
            match create_backup(target) {
                Ok(path) => {
                    tracing::debug!(backup = %path.display(), "backup created");
                    BackupStatus::Created(path)
                }
                Err(e) => {
                    tracing::warn!(target = %target.display(), "backup failed: {}", e);
                    BackupStatus::Failed(e.to_string())
                }
            }
        } else {
            BackupStatus::Skipped
        };

        self.stage(target, content)?.commit()?;

        let bytes_written = match fs::metadata(target) {
            Ok(meta) => meta.len(),
            Err(e) => {
                tracing::debug!(target = %target.display(), "size after write unavailable: {}", e);
                actual
            }
        };
        tracing::info!(target = %target.display(), bytes = bytes_written, "file written");

        Ok(WriteOutcome {
            path: target.to_path_buf(),
            bytes_written,
            backup,
        })
    }

    /// Stage `content` for `target` without touching the target.
    ///
    /// No gates apply here; [`Self::write`] runs them before staging.
    pub fn stage(&self, target: &Path, content: &str) -> Result<StagedWrite, FsToolError> {
        StagedWrite::prepare(target, content.as_bytes())
    }
}

/// Content synced to a temp file next to its target, awaiting the rename.
#[derive(Debug)]
pub struct StagedWrite {
    temp: NamedTempFile,
    target: PathBuf,
}

impl StagedWrite {
    fn prepare(target: &Path, content: &[u8]) -> Result<Self, FsToolError> {
        let parent = target.parent().ok_or_else(|| FsToolError::NotAFile {
            path: target.display().to_string(),
        })?;
        fs::create_dir_all(parent).map_err(|e| FsToolError::io(IoOp::CreateDir, parent, e))?;

        let prefix = format!(
            ".{}.",
            target
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        );
        let mut temp = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(".tmp")
            .tempfile_in(parent)
            .map_err(|e| FsToolError::io(IoOp::Write, target, e))?;

        temp.write_all(content)
            .and_then(|_| temp.as_file().sync_all())
            .map_err(|e| FsToolError::io(IoOp::Write, target, e))?;

        match fs::metadata(target) {
            Ok(meta) => fs::set_permissions(temp.path(), meta.permissions())
                .map_err(|e| FsToolError::io(IoOp::Write, target, e))?,
            Err(_) => set_new_file_mode(temp.path())
                .map_err(|e| FsToolError::io(IoOp::Write, target, e))?,
        }

        Ok(Self {
            temp,
            target: target.to_path_buf(),
        })
    }

    /// Path of the staged temp file.
    pub fn temp_path(&self) -> &Path {
        self.temp.path()
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Atomically rename the staged file over the target.
    pub fn commit(self) -> Result<(), FsToolError> {
        let Self { temp, target } = self;
        // On failure the PersistError still owns the temp file and removes it on drop.
        temp.persist(&target)
            .map_err(|e| FsToolError::io(IoOp::Write, &target, e.error))?;
        sync_parent(&target);
        Ok(())
    }
}

fn is_python(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(ALLOWED_EXTENSION)
}

/// `<stem>.backup_<YYYYMMDD_HHMMSS><suffix>` next to `target`.
pub fn backup_path_for(target: &Path, at: NaiveDateTime) -> PathBuf {
    numbered_backup_path(target, at, 0)
}

/// [`backup_path_for`] with `_<n>` appended to the stamp when `n > 0`.
fn numbered_backup_path(target: &Path, at: NaiveDateTime, n: u32) -> PathBuf {
    let stem = target
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix = target
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let stamp = at.format("%Y%m%d_%H%M%S");
    let name = if n == 0 {
        format!("{}.backup_{}{}", stem, stamp, suffix)
    } else {
        format!("{}.backup_{}_{}{}", stem, stamp, n, suffix)
    };
    target.with_file_name(name)
}

/// Attempts at a free backup name within one second before giving up.
const MAX_BACKUP_ATTEMPTS: u32 = 1000;

/// Copy `target` to a backup name that is not taken yet.
///
/// The stamp only has one-second resolution, so several overwrites in the
/// same second would collide. Each candidate name is claimed with
/// `create_new`, which never replaces an existing file: earlier backups are
/// never lost, later ones get `_1`, `_2`, ... appended to the stamp.
fn create_backup(target: &Path) -> io::Result<PathBuf> {
    let at = Local::now().naive_local();
    let mut source = fs::File::open(target)?;

    for n in 0..MAX_BACKUP_ATTEMPTS {
        let path = numbered_backup_path(target, at, n);
        let mut backup = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        };

        let copied = io::copy(&mut source, &mut backup)
            .and_then(|_| backup.sync_all())
            .and_then(|_| source.metadata())
            .and_then(|meta| fs::set_permissions(&path, meta.permissions()));
        if let Err(e) = copied {
            // A half-written backup is worse than none.
            let _ = fs::remove_file(&path);
            return Err(e);
        }
        return Ok(path);
    }

    Err(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free backup name for {}", target.display()),
    ))
}

/// Human-readable size: `512 B`, `1.5 KB`, `10.0 MB` (base 1024).
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

#[cfg(unix)]
fn set_new_file_mode(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    // Temp files start at 0600; a fresh target gets rw-r--r--.
    fs::set_permissions(path, fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_new_file_mode(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn sync_parent(target: &Path) {
    if let Some(parent) = target.parent() {
        if let Ok(dir) = fs::File::open(parent) {
            let _ = dir.sync_all();
        }
    }
}

#[cfg(not(unix))]
fn sync_parent(_target: &Path) {}
