//! Audit trail for temporal mutations
//!
//! Sinks are told about every committed create/supersede/delete. Recording
//! is best effort: a sink that cannot write logs a warning and the mutation
//! still stands.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::scope::UserId;

/// Kind of temporal mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Supersede,
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "CREATE"),
            Operation::Supersede => write!(f, "SUPERSEDE"),
            Operation::Delete => write!(f, "DELETE"),
        }
    }
}

/// One committed mutation
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub timestamp: DateTime<Utc>,
    pub operation: Operation,
    pub entity_type: &'static str,
    pub entity_key: String,
    /// Version opened (create/supersede) or closed (delete)
    pub version_id: Uuid,
    pub effective: DateTime<Utc>,
    pub owner: UserId,
    /// Store revision after the commit
    pub revision: u64,
}

impl AuditEvent {
    pub fn new(
        operation: Operation,
        entity_type: &'static str,
        entity_key: impl ToString,
        version_id: Uuid,
        effective: DateTime<Utc>,
        owner: UserId,
        revision: u64,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            operation,
            entity_type,
            entity_key: entity_key.to_string(),
            version_id,
            effective,
            owner,
            revision,
        }
    }
}

impl std::fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {}:{} version={} effective={} rev={}",
            self.owner,
            self.operation,
            self.entity_type,
            self.entity_key,
            self.version_id,
            self.effective.format("%Y-%m-%dT%H:%M:%SZ"),
            self.revision
        )
    }
}

/// Receives audit events; must not fail the caller
pub trait AuditSink: Send + Sync {
    fn record(&self, event: &AuditEvent);
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record(&self, _event: &AuditEvent) {}
}

/// Writes events through the `log` facade at info level
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAuditSink;

impl AuditSink for LogAuditSink {
    fn record(&self, event: &AuditEvent) {
        log::info!(target: "audit", "{}", event);
    }
}

/// Appends events as JSON lines to a file
#[derive(Debug)]
pub struct JsonlAuditSink {
    log_path: PathBuf,
    // serializes appends from concurrent writers
    lock: Mutex<()>,
}

impl JsonlAuditSink {
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self {
            log_path: log_path.into(),
            lock: Mutex::new(()),
        }
    }

    fn append(&self, event: &AuditEvent) -> std::io::Result<()> {
        let json = serde_json::to_string(event)?;
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        writeln!(file, "{}", json)?;
        file.flush()
    }
}

impl AuditSink for JsonlAuditSink {
    fn record(&self, event: &AuditEvent) {
        if let Err(e) = self.append(event) {
            log::warn!(
                "Failed to write audit entry to {}: {}",
                self.log_path.display(),
                e
            );
        }
    }
}

/// Keeps events in memory
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: &AuditEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
