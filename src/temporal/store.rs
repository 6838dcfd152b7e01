//! Persistence seam for temporal records
//!
//! Every logical key carries a revision counter. Readers get it with the
//! record; writers hand it back in their batch. A batch whose revision no
//! longer matches is rejected as a conflict, so two writers racing from the
//! same snapshot can never both open a version.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::record::Temporal;
use crate::error::{FinanceError, FinanceResult};
use crate::scope::Scope;

/// A record as read from the store, with the revision it was read at
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    pub record: T,
    pub revision: u64,
}

/// Close an open version at a point in time
#[derive(Debug, Clone)]
pub struct CloseVersion {
    pub version_id: Uuid,
    pub valid_to: DateTime<Utc>,
}

/// All writes for one key, applied together or not at all
#[derive(Debug, Clone)]
pub struct WriteBatch<T: Temporal> {
    pub key: T::Key,
    pub expected_revision: u64,
    pub close: Option<CloseVersion>,
    pub open: Option<T>,
}

impl<T: Temporal> WriteBatch<T> {
    pub fn new(key: T::Key, expected_revision: u64) -> Self {
        Self {
            key,
            expected_revision,
            close: None,
            open: None,
        }
    }

    pub fn close(mut self, version_id: Uuid, valid_to: DateTime<Utc>) -> Self {
        self.close = Some(CloseVersion { version_id, valid_to });
        self
    }

    pub fn open(mut self, record: T) -> Self {
        self.open = Some(record);
        self
    }
}

/// Load/query/commit operations the temporal service needs from a backend
pub trait TemporalStore<T: Temporal>: Send + Sync {
    /// Current revision of a key (0 if never written)
    fn revision(&self, key: &T::Key) -> FinanceResult<u64>;

    /// The open version of a key, if any is visible in `scope`
    fn load_open(&self, key: &T::Key, scope: Scope) -> FinanceResult<Option<Snapshot<T>>>;

    /// All versions of a key visible in `scope`, ordered by `valid_from`
    fn history(&self, key: &T::Key, scope: Scope) -> FinanceResult<Vec<T>>;

    /// Apply a batch atomically; returns the new revision
    fn commit(&self, batch: WriteBatch<T>) -> FinanceResult<u64>;
}

/// Versions and revision counter of one key
#[derive(Debug, Clone)]
struct KeyHistory<T> {
    revision: u64,
    versions: Vec<T>,
}

impl<T> KeyHistory<T> {
    fn new() -> Self {
        Self {
            revision: 0,
            versions: Vec::new(),
        }
    }
}

/// In-process store; commits are serialized by the write lock
#[derive(Debug)]
pub struct InMemoryTemporalStore<T: Temporal> {
    data: RwLock<HashMap<T::Key, KeyHistory<T>>>,
}

impl<T: Temporal> Default for InMemoryTemporalStore<T> {
    fn default() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }
}

impl<T: Temporal> InMemoryTemporalStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys with at least one version
    pub fn len(&self) -> FinanceResult<usize> {
        let data = self.data.read().map_err(|e| {
            FinanceError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(data.values().filter(|h| !h.versions.is_empty()).count())
    }

    pub fn is_empty(&self) -> FinanceResult<bool> {
        Ok(self.len()? == 0)
    }
}

impl<T: Temporal> TemporalStore<T> for InMemoryTemporalStore<T> {
    fn revision(&self, key: &T::Key) -> FinanceResult<u64> {
        let data = self.data.read().map_err(|e| {
            FinanceError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(data.get(key).map_or(0, |h| h.revision))
    }

    fn load_open(&self, key: &T::Key, scope: Scope) -> FinanceResult<Option<Snapshot<T>>> {
        let data = self.data.read().map_err(|e| {
            FinanceError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.get(key).and_then(|history| {
            history
                .versions
                .iter()
                .find(|v| v.is_open() && scope.allows(v.owner()))
                .map(|v| Snapshot {
                    record: v.clone(),
                    revision: history.revision,
                })
        }))
    }

    fn history(&self, key: &T::Key, scope: Scope) -> FinanceResult<Vec<T>> {
        let data = self.data.read().map_err(|e| {
            FinanceError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let mut versions: Vec<T> = data
            .get(key)
            .map(|h| {
                h.versions
                    .iter()
                    .filter(|v| scope.allows(v.owner()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        versions.sort_by_key(|v| v.validity().valid_from);
        Ok(versions)
    }

    fn commit(&self, batch: WriteBatch<T>) -> FinanceResult<u64> {
        let mut data = self.data.write().map_err(|e| {
            FinanceError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        let actual = data.get(&batch.key).map_or(0, |h| h.revision);
        if actual != batch.expected_revision {
            return Err(FinanceError::Conflict {
                identifier: format!("{}:{}", T::ENTITY, batch.key),
                expected: batch.expected_revision,
                actual,
            });
        }

        // Stage on a copy so a rejected batch leaves nothing behind
        let mut staged: Vec<T> = data
            .get(&batch.key)
            .map(|h| h.versions.clone())
            .unwrap_or_default();

        let mut predecessor_owner = None;
        if let Some(close) = &batch.close {
            let version = staged
                .iter_mut()
                .find(|v| v.validity().version_id == close.version_id)
                .ok_or_else(|| FinanceError::not_found(T::ENTITY, close.version_id))?;
            if !version.is_open() {
                return Err(FinanceError::InvalidState(format!(
                    "{} version {} is already closed",
                    T::ENTITY,
                    close.version_id
                )));
            }
            if close.valid_to <= version.validity().valid_from {
                return Err(FinanceError::InvalidState(format!(
                    "{} version {} cannot close at {}, before it starts",
                    T::ENTITY,
                    close.version_id,
                    close.valid_to
                )));
            }
            version.validity_mut().close_at(close.valid_to);
            predecessor_owner = Some(version.owner());
        }

        if let Some(record) = batch.open {
            if record.key() != batch.key {
                return Err(FinanceError::invalid(format!(
                    "record key {} does not match batch key {}",
                    record.key(),
                    batch.key
                )));
            }
            if !record.is_open() {
                return Err(FinanceError::invalid(format!(
                    "{}:{} new version must be open",
                    T::ENTITY,
                    batch.key
                )));
            }
            // A successor keeps the owner of the version it replaces
            if let Some(owner) = predecessor_owner {
                if owner != record.owner() {
                    return Err(FinanceError::InvalidState(format!(
                        "{}:{} belongs to {}, not {}",
                        T::ENTITY,
                        batch.key,
                        owner,
                        record.owner()
                    )));
                }
            }
            let from = record.validity().valid_from;
            if staged
                .iter()
                .any(|v| v.validity().valid_to.map_or(true, |to| to > from))
            {
                return Err(FinanceError::InvalidState(format!(
                    "{}:{} version starting {} overlaps an existing version",
                    T::ENTITY,
                    batch.key,
                    from
                )));
            }
            staged.push(record);
        }

        if staged.iter().filter(|v| v.is_open()).count() > 1 {
            return Err(FinanceError::InvalidState(format!(
                "{}:{} would have more than one open version",
                T::ENTITY,
                batch.key
            )));
        }

        let history = data.entry(batch.key).or_insert_with(KeyHistory::new);
        history.versions = staged;
        history.revision += 1;
        Ok(history.revision)
    }
}
