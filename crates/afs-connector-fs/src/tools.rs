// tools.rs — The agent-facing file tools.
//
// FsTools owns the sandbox registry, the atomic writer and the event
// dispatcher. Typed operations return Result; the string operations wrap them
// in the contract agents see: content or "Success: ..." on success,
// "Error: <reason>" on failure. Every operation reports its outcome to the
// audit log (when enabled) and to registered observers.

use std::fs;
use std::path::{Path, PathBuf};

use afs_audit::{
    hasher, ActionKind, ActionStatus, AuditEvent, AuditLogSink, EventDispatcher, SandboxObserver,
    AUDIT_LOG_FILE,
};
use afs_sandbox::{PathPolicy, SandboxError, SandboxRegistry, SandboxRoot};

use crate::config::SandboxConfig;
use crate::error::{FsToolError, IoOp};
use crate::writer::{AtomicFileWriter, BackupStatus, WriteOutcome};

/// Sandboxed read, list and write tools for one agent.
pub struct FsTools {
    registry: SandboxRegistry,
    writer: AtomicFileWriter,
    dispatcher: EventDispatcher,
    audit_sink: Option<(PathBuf, AuditLogSink)>,
    agent_name: String,
    audit_log: bool,
}

impl FsTools {
    /// Uninitialized tools; call [`Self::initialize`] before any operation.
    pub fn new(config: SandboxConfig) -> Self {
        Self {
            registry: SandboxRegistry::new(),
            writer: AtomicFileWriter::new(config.write),
            dispatcher: EventDispatcher::new(),
            audit_sink: None,
            agent_name: config.agent_name,
            audit_log: config.audit_log,
        }
    }

    /// Replace the writer (custom options or syntax checker).
    pub fn with_writer(mut self, writer: AtomicFileWriter) -> Self {
        self.writer = writer;
        self
    }

    /// Register an observer for every subsequent event.
    pub fn add_observer(&mut self, observer: Box<dyn SandboxObserver>) {
        self.dispatcher.add_observer(observer);
    }

    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    /// The active sandbox root.
    pub fn root(&self) -> Result<&SandboxRoot, SandboxError> {
        self.registry.root()
    }

    /// Path of the attached audit log, if any.
    pub fn audit_log_path(&self) -> Option<&Path> {
        self.audit_sink.as_ref().map(|(path, _)| path.as_path())
    }

    /// Make `project_root` the sandbox root and create its support directories.
    ///
    /// Calling again replaces the root. Returns the resolved root path.
    pub fn initialize(&mut self, project_root: impl AsRef<Path>) -> Result<PathBuf, SandboxError> {
        let requested = project_root.as_ref().display().to_string();
        let root = match self.registry.initialize(project_root) {
            Ok(root) => root.clone(),
            Err(e) => {
                self.emit(
                    AuditEvent::new(&self.agent_name, ActionKind::Setup, status_of_sandbox(&e))
                        .with_target(requested)
                        .with_detail("error", e.to_string()),
                );
                return Err(e);
            }
        };

        if self.audit_log {
            self.attach_audit_log(root.logs_dir().join(AUDIT_LOG_FILE));
        }

        self.emit(
            AuditEvent::new(&self.agent_name, ActionKind::Setup, ActionStatus::Success)
                .with_target(requested)
                .with_detail("root", root.path().display().to_string()),
        );
        Ok(root.path().to_path_buf())
    }

    fn attach_audit_log(&mut self, path: PathBuf) {
        if matches!(&self.audit_sink, Some((current, _)) if *current == path) {
            return;
        }
        match AuditLogSink::open(&path) {
            Ok(sink) => self.audit_sink = Some((path, sink)),
            Err(e) => {
                tracing::warn!(path = %path.display(), "audit log unavailable: {}", e);
                self.audit_sink = None;
            }
        }
    }

    /// Whether `candidate` is a safe `.py` path inside the sandbox.
    pub fn validate(&self, candidate: &str) -> Result<bool, FsToolError> {
        let result = self
            .registry
            .root()
            .and_then(|root| root.validate(candidate))
            .map_err(FsToolError::from);

        let status = match &result {
            Ok(true) => ActionStatus::Success,
            Ok(false) => ActionStatus::Rejected,
            Err(e) => status_of(e),
        };
        let mut event =
            AuditEvent::new(&self.agent_name, ActionKind::Validate, status).with_target(candidate);
        if let Err(e) = &result {
            event = event.with_detail("error", e.to_string());
        }
        self.emit(event);
        result
    }

    /// Read a `.py` file inside the sandbox as UTF-8 text.
    pub fn read_file(&self, candidate: &str) -> Result<String, FsToolError> {
        let result = self.read_inner(candidate);
        self.record(ActionKind::Read, candidate, &result, |text, event| {
            event
                .with_content_hash(hasher::hash_str(text))
                .with_detail("bytes", text.len())
        });
        result
    }

    fn read_inner(&self, candidate: &str) -> Result<String, FsToolError> {
        let path = self
            .registry
            .root()?
            .check(candidate, PathPolicy::ContainmentPlusExtension)?;

        if !path.exists() {
            return Err(FsToolError::NotFound {
                path: candidate.to_string(),
            });
        }
        if !path.is_file() {
            return Err(FsToolError::NotAFile {
                path: candidate.to_string(),
            });
        }
        fs::read_to_string(&path).map_err(|e| FsToolError::io(IoOp::Read, Path::new(candidate), e))
    }

    /// Names of the entries in a directory inside the sandbox, sorted.
    pub fn list_dir(&self, candidate: &str) -> Result<Vec<String>, FsToolError> {
        let result = self.list_inner(candidate);
        self.record(ActionKind::List, candidate, &result, |names, event| {
            event.with_detail("entries", names.len())
        });
        result
    }

    fn list_inner(&self, candidate: &str) -> Result<Vec<String>, FsToolError> {
        let path = self
            .registry
            .root()?
            .check(candidate, PathPolicy::ContainmentOnly)?;

        if !path.exists() {
            return Err(FsToolError::NotFound {
                path: candidate.to_string(),
            });
        }
        if !path.is_dir() {
            return Err(FsToolError::NotADirectory {
                path: candidate.to_string(),
            });
        }

        let list_err = |e| FsToolError::io(IoOp::List, Path::new(candidate), e);
        let mut names = fs::read_dir(&path)
            .map_err(list_err)?
            .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(list_err)?;
        names.sort();
        Ok(names)
    }

    /// Atomically write a `.py` file inside the sandbox.
    pub fn write_file(&self, candidate: &str, content: &str) -> Result<WriteOutcome, FsToolError> {
        let result = self
            .registry
            .root()
            .map_err(FsToolError::from)
            .and_then(|root| {
                root.check(candidate, PathPolicy::ContainmentPlusExtension)
                    .map_err(FsToolError::from)
            })
            .and_then(|path| self.writer.write(&path, content));

        if let Ok(outcome) = &result {
            match &outcome.backup {
                BackupStatus::Skipped => {}
                BackupStatus::Created(backup) => self.emit(
                    AuditEvent::new(&self.agent_name, ActionKind::Backup, ActionStatus::Success)
                        .with_target(candidate)
                        .with_detail("backup", self.display(backup)),
                ),
                BackupStatus::Failed(reason) => self.emit(
                    AuditEvent::new(&self.agent_name, ActionKind::Backup, ActionStatus::Error)
                        .with_target(candidate)
                        .with_detail("error", reason.clone()),
                ),
            }
        }

        self.record(ActionKind::Write, candidate, &result, |outcome, event| {
            event
                .with_content_hash(hasher::hash_str(content))
                .with_detail("bytes", outcome.bytes_written)
        });
        result
    }

    /// Read tool: file content, or `Error: <reason>`.
    pub fn read(&self, candidate: &str) -> String {
        self.read_file(candidate)
            .unwrap_or_else(|e| render_error(&e))
    }

    /// List tool: newline-separated sorted names, or `Error: <reason>`.
    pub fn list(&self, candidate: &str) -> String {
        match self.list_dir(candidate) {
            Ok(names) => names.join("\n"),
            Err(e) => render_error(&e),
        }
    }

    /// Write tool: `Success: Wrote <n> bytes to <path>`, or `Error: <reason>`.
    pub fn write(&self, candidate: &str, content: &str) -> String {
        match self.write_file(candidate, content) {
            Ok(outcome) => self.write_message(&outcome),
            Err(e) => render_error(&e),
        }
    }

    /// Async form of [`Self::read`].
    pub async fn read_async(&self, candidate: &str) -> String {
        self.read(candidate)
    }

    /// Async form of [`Self::list`].
    pub async fn list_async(&self, candidate: &str) -> String {
        self.list(candidate)
    }

    /// Async form of [`Self::write`].
    pub async fn write_async(&self, candidate: &str, content: &str) -> String {
        self.write(candidate, content)
    }

    /// The `Success: ...` line for a completed write.
    ///
    /// Paths are shown relative to the sandbox root. A failed backup is a
    /// warning inside the success line, since the write itself went through.
    pub fn write_message(&self, outcome: &WriteOutcome) -> String {
        let mut message = format!(
            "Success: Wrote {} bytes to {}",
            outcome.bytes_written,
            self.display(&outcome.path)
        );
        match &outcome.backup {
            BackupStatus::Skipped => {}
            BackupStatus::Created(backup) => {
                message.push_str(&format!(" (backup: {})", self.display(backup)))
            }
            BackupStatus::Failed(reason) => {
                message.push_str(&format!(" (warning: backup failed: {})", reason))
            }
        }
        message
    }

    fn display(&self, path: &Path) -> String {
        match self.registry.root() {
            Ok(root) => root.relative_display(path),
            Err(_) => path.display().to_string(),
        }
    }

    fn record<T>(
        &self,
        action: ActionKind,
        candidate: &str,
        result: &Result<T, FsToolError>,
        on_success: impl FnOnce(&T, AuditEvent) -> AuditEvent,
    ) {
        let event = match result {
            Ok(value) => on_success(
                value,
                AuditEvent::new(&self.agent_name, action, ActionStatus::Success).with_target(candidate),
            ),
            Err(e) => AuditEvent::new(&self.agent_name, action, status_of(e))
                .with_target(candidate)
                .with_detail("error", e.to_string()),
        };
        self.emit(event);
    }

    fn emit(&self, event: AuditEvent) {
        if let Some((_, sink)) = &self.audit_sink {
            if let Err(e) = sink.notify(&event) {
                tracing::warn!(action = ?event.action, "audit log error: {}", e);
            }
        }
        self.dispatcher.dispatch(&event);
    }
}

/// `Error: <reason>`, the failure form of every string tool.
pub fn render_error(err: &FsToolError) -> String {
    format!("Error: {}", err)
}

fn status_of(err: &FsToolError) -> ActionStatus {
    if err.is_rejection() {
        ActionStatus::Rejected
    } else {
        ActionStatus::Error
    }
}

fn status_of_sandbox(err: &SandboxError) -> ActionStatus {
    match err {
        SandboxError::Io { .. } => ActionStatus::Error,
        _ => ActionStatus::Rejected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use afs_audit::{AuditError, AuditLog};
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<AuditEvent>>>);

    impl Recorder {
        fn actions(&self) -> Vec<(ActionKind, ActionStatus)> {
            self.0
                .lock()
                .unwrap()
                .iter()
                .map(|e| (e.action, e.status))
                .collect()
        }
    }

    impl SandboxObserver for Recorder {
        fn notify(&self, event: &AuditEvent) -> Result<(), AuditError> {
            self.0.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    fn tools_in(dir: &Path) -> FsTools {
        let mut tools = FsTools::new(SandboxConfig::default());
        tools.initialize(dir).unwrap();
        tools
    }

    #[test]
    fn operations_before_initialize_fail() {
        let tools = FsTools::new(SandboxConfig::default());
        assert!(tools.read("a.py").starts_with("Error: "));
        assert!(tools.list(".").starts_with("Error: "));
        assert!(tools.write("a.py", "x = 1").starts_with("Error: "));
        assert!(matches!(
            tools.validate("a.py"),
            Err(FsToolError::Sandbox(SandboxError::NotInitialized))
        ));
    }

    #[test]
    fn write_then_read() {
        let dir = tempdir().unwrap();
        let tools = tools_in(dir.path());

        let message = tools.write("a.py", "x=1");
        assert_eq!(message, "Success: Wrote 3 bytes to a.py");
        assert_eq!(tools.read("a.py"), "x=1");
    }

    #[test]
    fn second_write_reports_backup() {
        let dir = tempdir().unwrap();
        let tools = tools_in(dir.path());

        tools.write("pkg/m.py", "a = 1\n");
        let message = tools.write("pkg/m.py", "a = 2\n");
        assert!(message.starts_with("Success: Wrote 6 bytes to pkg/m.py (backup: pkg/m.backup_"), "{message}");
        assert!(message.ends_with(".py)"), "{message}");
    }

    #[test]
    fn read_failures() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("dir.py")).unwrap();
        fs::write(dir.path().join("notes.txt"), "hi").unwrap();
        let tools = tools_in(dir.path());

        assert!(matches!(tools.read_file("missing.py"), Err(FsToolError::NotFound { .. })));
        assert!(matches!(tools.read_file("dir.py"), Err(FsToolError::NotAFile { .. })));
        assert!(matches!(
            tools.read_file("notes.txt"),
            Err(FsToolError::Sandbox(SandboxError::DisallowedExtension { .. }))
        ));
        assert!(matches!(
            tools.read_file("../outside.py"),
            Err(FsToolError::Sandbox(SandboxError::OutsideSandbox { .. }))
        ));
        assert_eq!(tools.read("missing.py"), "Error: path does not exist: missing.py");
    }

    #[test]
    fn read_rejects_invalid_utf8() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("bin.py"), [0xff, 0xfe, 0x00]).unwrap();
        let tools = tools_in(dir.path());
        assert!(matches!(tools.read_file("bin.py"), Err(FsToolError::Io { op: IoOp::Read, .. })));
    }

    #[test]
    fn list_is_sorted_and_any_extension() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "").unwrap();
        fs::write(dir.path().join("a.txt"), "").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let tools = tools_in(dir.path());

        assert_eq!(tools.list("sub"), "");
        let listing = tools.list(".");
        let names: Vec<&str> = listing.lines().collect();
        assert_eq!(names, vec!["_sandbox_backup", "a.txt", "b.txt", "logs", "sub"]);
    }

    #[test]
    fn list_failures() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("file.py"), "").unwrap();
        let tools = tools_in(dir.path());

        assert!(matches!(tools.list_dir("nope"), Err(FsToolError::NotFound { .. })));
        assert!(matches!(tools.list_dir("file.py"), Err(FsToolError::NotADirectory { .. })));
        assert!(tools.list("..").starts_with("Error: "));
    }

    #[test]
    fn every_operation_is_observed() {
        let dir = tempdir().unwrap();
        let recorder = Recorder::default();
        let mut tools = FsTools::new(SandboxConfig::default());
        tools.add_observer(Box::new(recorder.clone()));
        tools.initialize(dir.path()).unwrap();

        tools.validate("../x.py").unwrap();
        tools.write("a.py", "x = 1\n");
        tools.write("a.py", "x = 2\n");
        tools.read("a.py");
        tools.list(".");

        assert_eq!(
            recorder.actions(),
            vec![
                (ActionKind::Setup, ActionStatus::Success),
                (ActionKind::Validate, ActionStatus::Rejected),
                (ActionKind::Write, ActionStatus::Success),
                (ActionKind::Backup, ActionStatus::Success),
                (ActionKind::Write, ActionStatus::Success),
                (ActionKind::Read, ActionStatus::Success),
                (ActionKind::List, ActionStatus::Success),
            ]
        );
    }

    #[test]
    fn audit_log_lands_under_logs_and_verifies() {
        let dir = tempdir().unwrap();
        let tools = tools_in(dir.path());
        tools.write("a.py", "x = 1\n");
        tools.read("../etc/passwd.py");

        let path = tools.audit_log_path().unwrap().to_path_buf();
        assert_eq!(path, tools.root().unwrap().logs_dir().join(AUDIT_LOG_FILE));
        assert_eq!(AuditLog::verify_chain(&path).unwrap(), 3);

        let events = AuditLog::read_all(&path).unwrap();
        assert_eq!(events[2].status, ActionStatus::Rejected);
        assert_eq!(events[1].content_hash.as_deref(), Some(hasher::hash_str("x = 1\n").as_str()));
    }

    #[test]
    fn audit_log_can_be_disabled() {
        let dir = tempdir().unwrap();
        let mut tools = FsTools::new(SandboxConfig {
            audit_log: false,
            ..SandboxConfig::default()
        });
        tools.initialize(dir.path()).unwrap();
        tools.write("a.py", "x = 1\n");

        assert!(tools.audit_log_path().is_none());
        assert!(!dir.path().join("logs").join(AUDIT_LOG_FILE).exists());
    }

    #[test]
    fn failed_initialize_keeps_previous_root() {
        let dir = tempdir().unwrap();
        let mut tools = tools_in(dir.path());
        assert!(tools.initialize(dir.path().join("missing")).is_err());
        assert_eq!(tools.write("a.py", "x=1"), "Success: Wrote 3 bytes to a.py");
    }

    #[test]
    fn reinitialize_moves_the_audit_log() {
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        let mut tools = tools_in(first.path());
        tools.initialize(second.path()).unwrap();
        tools.write("a.py", "x=1");

        assert!(second.path().join("a.py").exists());
        assert!(!first.path().join("a.py").exists());
        let second_log = second.path().join("logs").join(AUDIT_LOG_FILE);
        assert_eq!(AuditLog::verify_chain(&second_log).unwrap(), 2);
    }
}
