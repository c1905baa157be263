// observer.rs — Best-effort delivery of audit events to observers.
//
// The file tools report every decision to an EventDispatcher. Observers
// (the JSONL audit log, test recorders, anything else) receive events in
// registration order. An observer that fails is logged via tracing and
// skipped; the operation that produced the event is never affected.

use std::path::Path;
use std::sync::Mutex;

use crate::error::AuditError;
use crate::event::AuditEvent;
use crate::log::AuditLog;

/// Receives audit events from the sandbox tools.
pub trait SandboxObserver: Send + Sync {
    /// Handle one event. Errors are logged by the dispatcher and otherwise ignored.
    fn notify(&self, event: &AuditEvent) -> Result<(), AuditError>;
}

/// Observer that appends every event to an [`AuditLog`].
pub struct AuditLogSink {
    log: Mutex<AuditLog>,
}

impl AuditLogSink {
    /// Open (or create) the audit log at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        Ok(Self::new(AuditLog::open(path)?))
    }

    pub fn new(log: AuditLog) -> Self {
        Self {
            log: Mutex::new(log),
        }
    }
}

impl SandboxObserver for AuditLogSink {
    fn notify(&self, event: &AuditEvent) -> Result<(), AuditError> {
        let mut log = self
            .log
            .lock()
            .map_err(|_| AuditError::Observer("audit log mutex poisoned".to_string()))?;
        // The log stamps previous_hash, so it needs its own copy.
        let mut event = event.clone();
        log.append(&mut event)
    }
}

/// Fans events out to every registered observer.
#[derive(Default)]
pub struct EventDispatcher {
    observers: Vec<Box<dyn SandboxObserver>>,
}

impl EventDispatcher {
    /// Create a dispatcher with no observers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer.
    pub fn add_observer(&mut self, observer: Box<dyn SandboxObserver>) {
        self.observers.push(observer);
    }

    /// Number of registered observers.
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Deliver `event` to all observers.
    pub fn dispatch(&self, event: &AuditEvent) {
        for observer in &self.observers {
            if let Err(e) = observer.notify(event) {
                tracing::warn!(action = ?event.action, "audit observer error: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{ActionKind, ActionStatus};
    use std::sync::Arc;
    use tempfile::tempdir;

    struct Recorder(Arc<Mutex<Vec<AuditEvent>>>);

    impl SandboxObserver for Recorder {
        fn notify(&self, event: &AuditEvent) -> Result<(), AuditError> {
            self.0.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    struct Failing;

    impl SandboxObserver for Failing {
        fn notify(&self, _event: &AuditEvent) -> Result<(), AuditError> {
            Err(AuditError::Observer("always fails".to_string()))
        }
    }

    #[test]
    fn dispatch_reaches_every_observer_despite_failures() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = EventDispatcher::new();
        dispatcher.add_observer(Box::new(Failing));
        dispatcher.add_observer(Box::new(Recorder(Arc::clone(&seen))));

        dispatcher.dispatch(&AuditEvent::new(
            "agent",
            ActionKind::Validate,
            ActionStatus::Rejected,
        ));

        assert_eq!(dispatcher.len(), 2);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].status, ActionStatus::Rejected);
    }

    #[test]
    fn audit_log_sink_writes_chained_events() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let sink = AuditLogSink::open(&path).unwrap();

        let event = AuditEvent::new("agent", ActionKind::Read, ActionStatus::Success);
        sink.notify(&event).unwrap();
        sink.notify(&event).unwrap();

        assert_eq!(AuditLog::verify_chain(&path).unwrap(), 2);
    }

    #[test]
    fn empty_dispatcher_is_a_no_op() {
        let dispatcher = EventDispatcher::new();
        assert!(dispatcher.is_empty());
        dispatcher.dispatch(&AuditEvent::new(
            "agent",
            ActionKind::Setup,
            ActionStatus::Success,
        ));
    }
}
