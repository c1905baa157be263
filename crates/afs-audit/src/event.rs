// event.rs — Audit event data model.
//
// One AuditEvent is one line in the JSONL audit log. Each carries the agent
// name, the kind of action, a free-form detail map and the outcome, plus a
// `previous_hash` that links it to the line before it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What kind of sandbox decision this event records.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// A sandbox root was initialized.
    Setup,
    /// A candidate path was checked against a policy.
    Validate,
    /// A file was read.
    Read,
    /// A directory was listed.
    List,
    /// A file was written.
    Write,
    /// A backup of a file was taken before overwriting it.
    Backup,
}

/// How the action ended.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Success,
    /// The request was refused by policy or by a precondition (size, syntax).
    Rejected,
    /// The request was admissible but failed at the OS level.
    Error,
}

/// A single audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique identifier for this event.
    pub event_id: Uuid,

    /// When this event occurred (UTC).
    pub timestamp: DateTime<Utc>,

    /// Which agent asked for the action.
    pub agent_name: String,

    /// What kind of action was performed.
    pub action: ActionKind,

    /// Outcome of the action.
    pub status: ActionStatus,

    /// The candidate path as the agent supplied it, when there is one.
    pub target: Option<String>,

    /// SHA-256 of the content read or written. The content itself is never logged.
    pub content_hash: Option<String>,

    /// Free-form details (policy, byte counts, error text, ...).
    #[serde(default)]
    pub details: serde_json::Map<String, serde_json::Value>,

    /// Hash of the previous line in the log; None for the first event.
    pub previous_hash: Option<String>,
}

impl AuditEvent {
    /// Create an event stamped now with a fresh id.
    pub fn new(agent_name: impl Into<String>, action: ActionKind, status: ActionStatus) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            agent_name: agent_name.into(),
            action,
            status,
            target: None,
            content_hash: None,
            details: serde_json::Map::new(),
            previous_hash: None,
        }
    }

    /// Set the target path and return self.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Set the content hash and return self.
    pub fn with_content_hash(mut self, hash: impl Into<String>) -> Self {
        self.content_hash = Some(hash.into());
        self
    }

    /// Add one detail entry and return self.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}
