// log.rs — Append-only JSONL audit log with a hash chain.
//
// One JSON object per line. Each event's `previous_hash` is the SHA-256 of
// the raw previous line, so inserting, deleting or editing a line breaks the
// chain and `verify_chain` reports where. Blank lines are ignored.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::error::AuditError;
use crate::event::AuditEvent;
use crate::hasher;

/// File name of the audit log inside the sandbox `logs/` directory.
pub const AUDIT_LOG_FILE: &str = "audit.jsonl";

/// An open audit log, positioned at the end of its chain.
pub struct AuditLog {
    file: File,
    path: PathBuf,
    head: Option<String>,
}

impl AuditLog {
    /// Open (or create) the log at `path`. An existing log's last line
    /// becomes the head of the chain.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();

        let mut head = None;
        if path.exists() {
            for entry in numbered_lines(&path)? {
                let (_, line) = entry?;
                head = Some(hasher::hash_str(&line));
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| AuditError::Open {
                path: path.clone(),
                source,
            })?;

        Ok(Self { file, path, head })
    }

    /// Stamp `event` with the current head, write it as one line and advance the head.
    pub fn append(&mut self, event: &mut AuditEvent) -> Result<(), AuditError> {
        event.previous_hash = self.head.clone();
        let mut line = serde_json::to_string(event)?;
        let hash = hasher::hash_str(&line);

        line.push('\n');
        self.file.write_all(line.as_bytes())?;
        self.head = Some(hash);
        Ok(())
    }

    /// Hash of the last line, or None for an empty log.
    pub fn head(&self) -> Option<&str> {
        self.head.as_deref()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every event in the log, oldest first.
    pub fn read_all(path: impl AsRef<Path>) -> Result<Vec<AuditEvent>, AuditError> {
        numbered_lines(path.as_ref())?
            .map(|entry| {
                let (_, line) = entry?;
                Ok(serde_json::from_str(&line)?)
            })
            .collect()
    }

    /// Check every link of the chain. Returns the number of events.
    pub fn verify_chain(path: impl AsRef<Path>) -> Result<usize, AuditError> {
        let mut expected: Option<String> = None;
        let mut count = 0;

        for entry in numbered_lines(path.as_ref())? {
            let (number, line) = entry?;
            let event: AuditEvent = serde_json::from_str(&line)?;
            if event.previous_hash != expected {
                let show = |h: Option<String>| h.unwrap_or_else(|| "None".to_string());
                return Err(AuditError::IntegrityViolation {
                    line: number,
                    expected: show(expected),
                    actual: show(event.previous_hash),
                });
            }
            // The raw line, not a re-serialization: field order must not matter.
            expected = Some(hasher::hash_str(&line));
            count += 1;
        }

        Ok(count)
    }
}

/// Non-blank lines of `path` with their 1-based line numbers.
fn numbered_lines(
    path: &Path,
) -> Result<impl Iterator<Item = Result<(usize, String), AuditError>>, AuditError> {
    let file = File::open(path).map_err(|source| AuditError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file)
        .lines()
        .enumerate()
        .filter_map(|(index, line)| match line {
            Ok(line) if line.trim().is_empty() => None,
            Ok(line) => Some(Ok((index + 1, line))),
            Err(e) => Some(Err(AuditError::from(e))),
        }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{ActionKind, ActionStatus};
    use std::fs;
    use tempfile::tempdir;

    fn event(action: ActionKind) -> AuditEvent {
        AuditEvent::new("agent-1", action, ActionStatus::Success)
    }

    #[test]
    fn append_and_read_back() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join(AUDIT_LOG_FILE);

        {
            let mut log = AuditLog::open(&log_path).unwrap();
            log.append(&mut event(ActionKind::Setup)).unwrap();
            log.append(&mut event(ActionKind::Write).with_target("a.py"))
                .unwrap();
        }

        let events = AuditLog::read_all(&log_path).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].action, ActionKind::Setup);
        assert!(events[0].previous_hash.is_none());
        assert_eq!(events[1].target.as_deref(), Some("a.py"));
        assert!(events[1].previous_hash.is_some());
    }

    #[test]
    fn reopen_continues_chain() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join(AUDIT_LOG_FILE);

        let mut heads = Vec::new();
        for action in [ActionKind::Setup, ActionKind::Read, ActionKind::Write] {
            let mut log = AuditLog::open(&log_path).unwrap();
            heads.push(log.head().map(str::to_string));
            log.append(&mut event(action)).unwrap();
            assert_eq!(log.path(), log_path.as_path());
        }

        assert!(heads[0].is_none());
        assert!(heads[1].is_some() && heads[1] != heads[2]);

        assert_eq!(AuditLog::verify_chain(&log_path).unwrap(), 3);
    }

    #[test]
    fn tampering_is_detected() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join(AUDIT_LOG_FILE);

        {
            let mut log = AuditLog::open(&log_path).unwrap();
            for _ in 0..3 {
                log.append(&mut event(ActionKind::Write)).unwrap();
            }
        }

        // Drop the middle line.
        let content = fs::read_to_string(&log_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        fs::write(&log_path, format!("{}\n{}\n", lines[0], lines[2])).unwrap();

        match AuditLog::verify_chain(&log_path) {
            Err(AuditError::IntegrityViolation { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected IntegrityViolation, got {:?}", other),
        }
    }

    #[test]
    fn blank_lines_are_skipped() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join(AUDIT_LOG_FILE);
        {
            let mut log = AuditLog::open(&log_path).unwrap();
            log.append(&mut event(ActionKind::Setup)).unwrap();
        }
        let mut content = fs::read_to_string(&log_path).unwrap();
        content.push_str("\n   \n");
        fs::write(&log_path, content).unwrap();

        let mut log = AuditLog::open(&log_path).unwrap();
        log.append(&mut event(ActionKind::List)).unwrap();
        assert_eq!(AuditLog::verify_chain(&log_path).unwrap(), 2);
    }

    #[test]
    fn garbage_line_is_malformed() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join(AUDIT_LOG_FILE);
        fs::write(&log_path, "not json\n").unwrap();
        assert!(matches!(
            AuditLog::read_all(&log_path),
            Err(AuditError::Json(_))
        ));
    }

    #[test]
    fn open_in_missing_dir_fails() {
        let dir = tempdir().unwrap();
        let result = AuditLog::open(dir.path().join("no/such/dir/audit.jsonl"));
        assert!(matches!(result, Err(AuditError::Open { .. })));
    }
}
