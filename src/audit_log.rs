// audit_log.rs
// Purpose: Bounded, append-only record of every evaluation and remediation.
//
// Entries live for the lifetime of the process only. Nothing here touches
// disk; exporting is the caller's job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

use crate::errors::{GovernanceError, GovernanceResult};

pub const DEFAULT_AUDIT_CAPACITY: usize = 100;

/// What produced an audit entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    ContrastEvaluation,
    ContrastRemediation,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::ContrastEvaluation => "CONTRAST_EVALUATION",
            AuditAction::ContrastRemediation => "CONTRAST_REMEDIATION",
        }
    }
}

/// Immutable record of one engine invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: String,
    /// Insertion order across the log's lifetime, starting at 1.
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub action: AuditAction,
    pub input: serde_json::Value,
    pub output: serde_json::Value,
    pub compliant: bool,
}

impl AuditEntry {
    pub fn new(
        action: AuditAction,
        input: serde_json::Value,
        output: serde_json::Value,
        compliant: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            sequence: 0,
            timestamp: Utc::now(),
            action,
            input,
            output,
            compliant,
        }
    }
}

/// Fixed-capacity FIFO ring buffer of audit entries
#[derive(Debug, Clone)]
pub struct AuditLog {
    capacity: usize,
    entries: VecDeque<AuditEntry>,
    appended: u64,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_AUDIT_CAPACITY,
            entries: VecDeque::with_capacity(DEFAULT_AUDIT_CAPACITY),
            appended: 0,
        }
    }
}

impl AuditLog {
    pub fn with_capacity(capacity: usize) -> GovernanceResult<Self> {
        if capacity == 0 {
            return Err(GovernanceError::config("audit capacity must be at least 1"));
        }
        Ok(Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
            appended: 0,
        })
    }

    /// Append an entry, evicting the oldest one when the buffer is full.
    pub fn append(&mut self, mut entry: AuditEntry) {
        self.appended += 1;
        entry.sequence = self.appended;
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Snapshot of the retained entries, oldest first.
    pub fn export(&self) -> Vec<AuditEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn export_json(&self) -> GovernanceResult<String> {
        serde_json::to_string_pretty(&self.export())
            .map_err(|e| GovernanceError::serialization("audit_export", e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total entries ever appended, including evicted ones.
    pub fn total_appended(&self) -> u64 {
        self.appended
    }
}
