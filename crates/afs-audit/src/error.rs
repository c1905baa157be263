// error.rs — Audit log and observer errors.
//
// None of these ever fail a file operation: the tools log them and move on.
// They surface only to direct users of AuditLog (tests, `afs audit`).

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    /// The log file could not be opened or created.
    #[error("cannot open audit log {path}: {source}")]
    Open { path: PathBuf, source: io::Error },

    /// Reading or appending a line failed.
    #[error("audit log I/O: {0}")]
    Io(#[from] io::Error),

    /// A line is not a valid event.
    #[error("malformed audit event: {0}")]
    Json(#[from] serde_json::Error),

    /// The hash chain is broken: a line was inserted, removed or edited.
    #[error("integrity check failed at line {line}: expected previous_hash {expected}, found {actual}")]
    IntegrityViolation {
        line: usize,
        expected: String,
        actual: String,
    },

    /// An observer could not take the event.
    #[error("observer unavailable: {0}")]
    Observer(String),
}
