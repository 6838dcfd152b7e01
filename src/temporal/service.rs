//! Create, supersede, delete and query temporal records

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::record::Temporal;
use super::store::{Snapshot, TemporalStore, WriteBatch};
use crate::audit::{AuditEvent, AuditSink, NullAuditSink, Operation};
use crate::error::{FinanceError, FinanceResult};
use crate::scope::Scope;

/// Version history on top of a [`TemporalStore`]
///
/// Mutations read a [`Snapshot`] first and commit against its revision, so a
/// writer working from stale data gets [`FinanceError::Conflict`] instead of
/// silently overwriting someone else's version.
pub struct TemporalService<S, T> {
    store: S,
    audit: Arc<dyn AuditSink>,
    _record: PhantomData<fn() -> T>,
}

impl<S, T> TemporalService<S, T>
where
    S: TemporalStore<T>,
    T: Temporal,
{
    pub fn new(store: S) -> Self {
        Self::with_audit(store, Arc::new(NullAuditSink))
    }

    pub fn with_audit(store: S, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            store,
            audit,
            _record: PhantomData,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Open the first version of a key; `effective` defaults to now
    pub fn create(
        &self,
        mut record: T,
        effective: Option<DateTime<Utc>>,
    ) -> FinanceResult<Snapshot<T>> {
        let at = effective.unwrap_or_else(Utc::now);
        let key = record.key();

        // Revision first: anything committed after this read fails the commit
        let revision = self.store.revision(&key)?;
        if self.store.load_open(&key, Scope::All)?.is_some() {
            return Err(FinanceError::InvalidState(format!(
                "{}:{} already has an open version",
                T::ENTITY,
                key
            )));
        }

        record.validity_mut().open_at(at);
        let revision = self
            .store
            .commit(WriteBatch::new(key.clone(), revision).open(record.clone()))?;

        log::debug!("Created {}:{} at {}", T::ENTITY, key, at);
        self.emit(Operation::Create, &record, at, revision);
        Ok(Snapshot { record, revision })
    }

    /// Close `current` at `effective` and open `next` from the same instant
    pub fn supersede(
        &self,
        current: &Snapshot<T>,
        mut next: T,
        effective: Option<DateTime<Utc>>,
    ) -> FinanceResult<Snapshot<T>> {
        let at = effective.unwrap_or_else(Utc::now);
        let key = current.record.key();

        if next.key() != key {
            return Err(FinanceError::invalid(format!(
                "cannot supersede {}:{} with a record for {}",
                T::ENTITY,
                key,
                next.key()
            )));
        }
        if next.owner() != current.record.owner() {
            return Err(FinanceError::InvalidState(format!(
                "{}:{} belongs to user {}, successor names user {}",
                T::ENTITY,
                key,
                current.record.owner(),
                next.owner()
            )));
        }
        self.check_closable(&current.record, at)?;

        next.validity_mut().open_at(at);
        let batch = WriteBatch::new(key.clone(), current.revision)
            .close(current.record.validity().version_id, at)
            .open(next.clone());
        let revision = self.store.commit(batch)?;

        log::debug!("Superseded {}:{} at {}", T::ENTITY, key, at);
        self.emit(Operation::Supersede, &next, at, revision);
        Ok(Snapshot {
            record: next,
            revision,
        })
    }

    /// Supersede the open version of `record`'s key, or open the first one
    pub fn record_change(&self, record: T, effective: Option<DateTime<Utc>>) -> FinanceResult<Snapshot<T>> {
        match self.store.load_open(&record.key(), Scope::All)? {
            Some(current) => self.supersede(&current, record, effective),
            None => self.create(record, effective),
        }
    }

    /// Close `current` without a successor; returns the closed version
    pub fn delete(&self, current: &Snapshot<T>, effective: Option<DateTime<Utc>>) -> FinanceResult<T> {
        let at = effective.unwrap_or_else(Utc::now);
        let key = current.record.key();
        self.check_closable(&current.record, at)?;

        let version_id = current.record.validity().version_id;
        let batch = WriteBatch::new(key.clone(), current.revision).close(version_id, at);
        let revision = self.store.commit(batch)?;

        let mut closed = current.record.clone();
        closed.validity_mut().close_at(at);

        log::debug!("Deleted {}:{} at {}", T::ENTITY, key, at);
        self.emit(Operation::Delete, &closed, at, revision);
        Ok(closed)
    }

    /// The open version of a key
    pub fn current(&self, key: &T::Key, scope: Scope) -> FinanceResult<Snapshot<T>> {
        self.store
            .load_open(key, scope)?
            .ok_or_else(|| FinanceError::not_found(T::ENTITY, key))
    }

    /// The version valid at `at`, if any
    pub fn as_of(&self, key: &T::Key, at: DateTime<Utc>, scope: Scope) -> FinanceResult<Option<T>> {
        Ok(self
            .store
            .history(key, scope)?
            .into_iter()
            .find(|v| v.is_valid_at(at)))
    }

    /// Every version of a key, oldest first
    pub fn history(&self, key: &T::Key, scope: Scope) -> FinanceResult<Vec<T>> {
        self.store.history(key, scope)
    }

    fn check_closable(&self, record: &T, at: DateTime<Utc>) -> FinanceResult<()> {
        if !record.is_open() {
            return Err(FinanceError::InvalidState(format!(
                "{}:{} version {} is already closed",
                T::ENTITY,
                record.key(),
                record.validity().version_id
            )));
        }
        if at <= record.validity().valid_from {
            return Err(FinanceError::InvalidState(format!(
                "effective date {} is not after valid_from {} of {}:{}",
                at,
                record.validity().valid_from,
                T::ENTITY,
                record.key()
            )));
        }
        Ok(())
    }

    fn emit(&self, operation: Operation, record: &T, at: DateTime<Utc>, revision: u64) {
        let event = AuditEvent::new(
            operation,
            T::ENTITY,
            record.key(),
            record.validity().version_id,
            at,
            record.owner(),
            revision,
        );
        self.audit.record(&event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{JsonlAuditSink, LogAuditSink, MemoryAuditSink};
    use crate::scope::UserId;
    use crate::temporal::{InMemoryTemporalStore, PriceRecord, RateRecord};
    use chrono::TimeZone;
    use std::sync::Barrier;
    use std::thread;

    type RateService = TemporalService<InMemoryTemporalStore<RateRecord>, RateRecord>;

    fn at(year: i32, month: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).unwrap()
    }

    fn service() -> RateService {
        TemporalService::new(InMemoryTemporalStore::new())
    }

    #[test]
    fn test_create_then_supersede() {
        let service = service();
        let created = service
            .create(RateRecord::new(1, UserId(1), 3.5), Some(at(2024, 1)))
            .unwrap();

        let next = service
            .supersede(&created, RateRecord::new(1, UserId(1), 4.1), Some(at(2024, 7)))
            .unwrap();

        let history = service.history(&1, Scope::All).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].validity.valid_to, Some(at(2024, 7)));
        assert_eq!(history[1].validity.valid_from, at(2024, 7));
        assert!(history[1].is_open());
        assert_eq!(history.iter().filter(|v| v.is_open()).count(), 1);

        let current = service.current(&1, Scope::All).unwrap();
        assert_eq!(current.record.interest_rate, 4.1);
        assert_eq!(current.revision, next.revision);
    }

    #[test]
    fn test_as_of_picks_interval() {
        let service = service();
        let created = service
            .create(RateRecord::new(1, UserId(1), 3.5), Some(at(2024, 1)))
            .unwrap();
        service
            .supersede(&created, RateRecord::new(1, UserId(1), 4.1), Some(at(2024, 7)))
            .unwrap();

        let rate_at = |when| {
            service
                .as_of(&1, when, Scope::All)
                .unwrap()
                .map(|r| r.interest_rate)
        };
        assert_eq!(rate_at(at(2023, 12)), None);
        assert_eq!(rate_at(at(2024, 1)), Some(3.5));
        assert_eq!(rate_at(at(2024, 6)), Some(3.5));
        assert_eq!(rate_at(at(2024, 7)), Some(4.1));
        assert_eq!(rate_at(at(2030, 1)), Some(4.1));
    }

    #[test]
    fn test_create_on_open_key_rejected() {
        let service = service();
        service
            .create(RateRecord::new(1, UserId(1), 3.5), Some(at(2024, 1)))
            .unwrap();

        let err = service
            .create(RateRecord::new(1, UserId(1), 4.0), Some(at(2024, 2)))
            .unwrap_err();
        assert!(matches!(err, FinanceError::InvalidState(_)));
    }

    #[test]
    fn test_effective_must_follow_valid_from() {
        let service = service();
        let created = service
            .create(RateRecord::new(1, UserId(1), 3.5), Some(at(2024, 3)))
            .unwrap();

        for when in [at(2024, 3), at(2024, 1)] {
            let err = service
                .supersede(&created, RateRecord::new(1, UserId(1), 4.0), Some(when))
                .unwrap_err();
            assert!(matches!(err, FinanceError::InvalidState(_)));
        }
        assert_eq!(service.history(&1, Scope::All).unwrap().len(), 1);
    }

    #[test]
    fn test_delete_closes_without_successor() {
        let service = service();
        let created = service
            .create(RateRecord::new(1, UserId(1), 3.5), Some(at(2024, 1)))
            .unwrap();

        let closed = service.delete(&created, Some(at(2025, 1))).unwrap();
        assert_eq!(closed.validity.valid_to, Some(at(2025, 1)));

        let err = service.current(&1, Scope::All).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NotFound);
        assert!(service.as_of(&1, at(2024, 6), Scope::All).unwrap().is_some());

        // key can be reopened after deletion
        service
            .create(RateRecord::new(1, UserId(1), 2.9), Some(at(2025, 6)))
            .unwrap();
        assert_eq!(service.history(&1, Scope::All).unwrap().len(), 2);
    }

    #[test]
    fn test_supersede_cannot_change_owner() {
        let service = service();
        let created = service
            .create(RateRecord::new(1, UserId(1), 3.5), Some(at(2024, 1)))
            .unwrap();

        let err = service
            .supersede(&created, RateRecord::new(1, UserId(2), 4.0), Some(at(2024, 6)))
            .unwrap_err();
        assert!(matches!(err, FinanceError::InvalidState(_)));

        // the owner still sees their open version
        let current = service.current(&1, Scope::User(UserId(1))).unwrap();
        assert_eq!(current.record.interest_rate, 3.5);
        assert!(service.current(&1, Scope::User(UserId(2))).is_err());
        assert_eq!(service.history(&1, Scope::All).unwrap().len(), 1);
    }

    #[test]
    fn test_record_change_creates_then_supersedes() {
        let service = service();
        let first = service
            .record_change(RateRecord::new(3, UserId(1), 3.5), Some(at(2024, 1)))
            .unwrap();
        assert_eq!(first.revision, 1);

        let second = service
            .record_change(RateRecord::new(3, UserId(1), 4.25), Some(at(2024, 9)))
            .unwrap();
        assert_eq!(second.revision, 2);

        let history = service.history(&3, Scope::All).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].validity.valid_to, Some(at(2024, 9)));
        assert_eq!(service.current(&3, Scope::All).unwrap().record.interest_rate, 4.25);

        // same date as the open version's start
        let err = service
            .record_change(RateRecord::new(3, UserId(1), 5.0), Some(at(2024, 9)))
            .unwrap_err();
        assert!(matches!(err, FinanceError::InvalidState(_)));
    }

    #[test]
    fn test_stale_snapshot_conflicts() {
        let service = service();
        let created = service
            .create(RateRecord::new(1, UserId(1), 3.5), Some(at(2024, 1)))
            .unwrap();
        service
            .supersede(&created, RateRecord::new(1, UserId(1), 4.0), Some(at(2024, 5)))
            .unwrap();

        let err = service
            .supersede(&created, RateRecord::new(1, UserId(1), 5.0), Some(at(2024, 6)))
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_concurrent_supersede_one_wins() {
        let service = Arc::new(service());
        service
            .create(RateRecord::new(1, UserId(1), 3.5), Some(at(2024, 1)))
            .unwrap();
        let current = service.current(&1, Scope::All).unwrap();
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = [4.0, 5.0]
            .into_iter()
            .map(|rate| {
                let service = Arc::clone(&service);
                let barrier = Arc::clone(&barrier);
                let current = current.clone();
                thread::spawn(move || {
                    barrier.wait();
                    service.supersede(
                        &current,
                        RateRecord::new(1, UserId(1), rate),
                        Some(at(2024, 6)),
                    )
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        let loser = results.iter().find_map(|r| r.as_ref().err()).unwrap();
        assert!(matches!(loser, FinanceError::Conflict { .. }));

        let history = service.history(&1, Scope::All).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.iter().filter(|v| v.is_open()).count(), 1);
    }

    #[test]
    fn test_scope_filters_reads() {
        let service = TemporalService::new(InMemoryTemporalStore::<PriceRecord>::new());
        service
            .create(PriceRecord::new("SE0000108656", UserId(1), 112.4, "SEK"), Some(at(2024, 1)))
            .unwrap();
        let key = "SE0000108656".to_string();

        assert!(service.current(&key, Scope::User(UserId(1))).is_ok());
        assert!(service.current(&key, Scope::User(UserId(2))).is_err());
        assert!(service.current(&key, Scope::All).is_ok());
        assert!(service
            .as_of(&key, at(2024, 2), Scope::User(UserId(2)))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_log_sink_does_not_affect_mutations() {
        let service: RateService =
            TemporalService::with_audit(InMemoryTemporalStore::new(), Arc::new(LogAuditSink));
        service
            .record_change(RateRecord::new(5, UserId(2), 3.1), Some(at(2024, 1)))
            .unwrap();
        service
            .record_change(RateRecord::new(5, UserId(2), 3.4), Some(at(2024, 4)))
            .unwrap();

        assert_eq!(service.history(&5, Scope::User(UserId(2))).unwrap().len(), 2);
    }

    #[test]
    fn test_rate_changes_written_to_jsonl() {
        let path = std::env::temp_dir().join(format!("rates-{}.jsonl", uuid::Uuid::new_v4()));
        let service: RateService =
            TemporalService::with_audit(InMemoryTemporalStore::new(), Arc::new(JsonlAuditSink::new(&path)));
        service
            .record_change(RateRecord::new(8, UserId(1), 4.0), Some(at(2024, 1)))
            .unwrap();
        service
            .record_change(RateRecord::new(8, UserId(1), 3.6), Some(at(2024, 10)))
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let operations: Vec<String> = content
            .lines()
            .map(|line| serde_json::from_str::<serde_json::Value>(line).unwrap()["operation"].to_string())
            .collect();
        assert_eq!(operations, vec!["\"create\"", "\"supersede\""]);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_mutations_are_audited() {
        let sink = Arc::new(MemoryAuditSink::new());
        let service: RateService =
            TemporalService::with_audit(InMemoryTemporalStore::new(), sink.clone());

        let created = service
            .create(RateRecord::new(9, UserId(4), 3.5), Some(at(2024, 1)))
            .unwrap();
        let next = service
            .supersede(&created, RateRecord::new(9, UserId(4), 3.9), Some(at(2024, 4)))
            .unwrap();
        service.delete(&next, Some(at(2024, 9))).unwrap();
        let _ = service.delete(&next, Some(at(2024, 10)));

        let events = sink.events();
        let ops: Vec<_> = events.iter().map(|e| e.operation).collect();
        assert_eq!(ops, vec![Operation::Create, Operation::Supersede, Operation::Delete]);
        assert_eq!(events[1].version_id, next.record.validity.version_id);
        assert_eq!(events[2].revision, 3);
        assert!(events.iter().all(|e| e.owner == UserId(4) && e.entity_key == "9"));
    }
}
