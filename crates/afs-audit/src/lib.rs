//! # afs-audit
//!
//! Audit trail for Agent File Sandbox.
//!
//! Every setup, validation, read, list and write decision can be recorded as
//! an [`AuditEvent`]: who asked, what kind of action, a detail map, and the
//! outcome. Events reach an [`AuditLog`] (hash-chained JSONL) through the
//! [`SandboxObserver`] trait. Observers are strictly best-effort: the
//! [`EventDispatcher`] logs their failures and moves on.
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use afs_audit::{ActionKind, ActionStatus, AuditEvent, AuditLog};
//!
//! let mut log = AuditLog::open("/tmp/project/logs/audit.jsonl").unwrap();
//! let mut event = AuditEvent::new("agent", ActionKind::Write, ActionStatus::Success)
//!     .with_target("pkg/module.py");
//! log.append(&mut event).unwrap();
//! ```

pub mod error;
pub mod event;
pub mod hasher;
pub mod log;
pub mod observer;

pub use error::AuditError;
pub use event::{ActionKind, ActionStatus, AuditEvent};
pub use log::{AuditLog, AUDIT_LOG_FILE};
pub use observer::{AuditLogSink, EventDispatcher, SandboxObserver};
