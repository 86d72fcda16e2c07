use std::collections::{BTreeMap, BTreeSet};

use monitor_logging::{monitor_debug, monitor_info, monitor_warn};
use thiserror::Error;

use crate::{JobId, QueueStore, RemoteError};

/// Tags one delete attempt so a late completion cannot resolve a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MutationId(u64);

impl MutationId {
    pub fn value(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePhase {
    Idle,
    Deleting(MutationId),
}

/// Deletes refused before any request goes out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeleteRejection {
    #[error("Queue item #{0} not found")]
    NotFound(JobId),
    #[error("Queue item #{0} is already processed and cannot be deleted")]
    AlreadyProcessed(JobId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStart {
    /// Record hidden; the caller must now send the request.
    Started(MutationId),
    /// A delete for this id is already outstanding; nothing to do.
    AlreadyDeleting(MutationId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The optimistic removal was undone. `reinserted` is false when the
    /// server had meanwhile dropped the record on its own.
    RolledBack { reinserted: bool },
    /// Completion for a mutation that is no longer tracked.
    Stale,
}

/// Optimistic delete protocol: `Idle -> Deleting -> {Deleted | Failed}`,
/// with `Failed` rolling back to `Idle`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeleteCoordinator {
    next_mutation: u64,
    in_flight: BTreeMap<JobId, MutationId>,
    // Deleted ids mapped to the newest poll seq issued before the delete was
    // acknowledged. Fetches up to that seq may still list them.
    tombstones: BTreeMap<JobId, u64>,
}

impl DeleteCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self, id: JobId) -> DeletePhase {
        match self.in_flight.get(&id) {
            Some(&mutation) => DeletePhase::Deleting(mutation),
            None => DeletePhase::Idle,
        }
    }

    pub fn pending_ids(&self) -> BTreeSet<JobId> {
        self.in_flight.keys().copied().collect()
    }

    pub fn has_pending(&self) -> bool {
        !self.in_flight.is_empty()
    }

    /// Hides the record and registers the delete. Must run before the
    /// request is issued.
    pub(crate) fn begin(
        &mut self,
        store: &mut QueueStore,
        id: JobId,
    ) -> Result<DeleteStart, DeleteRejection> {
        if let Some(&mutation) = self.in_flight.get(&id) {
            monitor_debug!("Delete of queue item #{} already in flight", id);
            return Ok(DeleteStart::AlreadyDeleting(mutation));
        }
        let record = store.current().get(id).ok_or(DeleteRejection::NotFound(id))?;
        if !record.is_deletable() {
            return Err(DeleteRejection::AlreadyProcessed(id));
        }

        store.remove(id);
        self.next_mutation += 1;
        let mutation = MutationId(self.next_mutation);
        self.in_flight.insert(id, mutation);
        monitor_info!("Deleting queue item #{} (mutation {})", id, mutation.0);
        Ok(DeleteStart::Started(mutation))
    }

    /// Applies the server's answer. `last_issued_seq` is the newest poll
    /// ticket issued so far.
    pub(crate) fn resolve(
        &mut self,
        store: &mut QueueStore,
        id: JobId,
        mutation: MutationId,
        result: &Result<(), RemoteError>,
        last_issued_seq: u64,
    ) -> DeleteOutcome {
        if self.in_flight.get(&id) != Some(&mutation) {
            monitor_debug!(
                "Ignoring completion of mutation {} for queue item #{}",
                mutation.0,
                id
            );
            return DeleteOutcome::Stale;
        }
        self.in_flight.remove(&id);

        match result {
            Ok(()) => {
                self.tombstones.insert(id, last_issued_seq);
                monitor_info!("Queue item #{} deleted", id);
                DeleteOutcome::Deleted
            }
            Err(err) => {
                let reinserted = match store.last_fetched().get(id).cloned() {
                    Some(record) => store.reinsert(record),
                    None => false,
                };
                monitor_warn!(
                    "Delete of queue item #{} failed ({}); restored={}",
                    id,
                    err,
                    reinserted
                );
                DeleteOutcome::RolledBack { reinserted }
            }
        }
    }

    /// Ids a fetch with the given seq must not show.
    pub fn suppressed_for(&self, seq: u64) -> BTreeSet<JobId> {
        let mut ids = self.pending_ids();
        ids.extend(
            self.tombstones
                .iter()
                .filter(|(_, acked_after)| seq <= **acked_after)
                .map(|(&id, _)| id),
        );
        ids
    }

    /// A fetch with this seq was applied; tombstones it outdates go away.
    pub(crate) fn fetch_applied(&mut self, seq: u64) {
        self.tombstones.retain(|_, acked_after| seq <= *acked_after);
    }

    /// Teardown: forget everything in flight. Late completions become stale.
    pub(crate) fn close(&mut self) {
        self.in_flight.clear();
        self.tombstones.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{JobAction, JobRecord, QueueSnapshot};

    fn record(id: JobId) -> JobRecord {
        JobRecord {
            id,
            created_at: "2023-01-01T00:00:00Z".parse().unwrap(),
            processed_at: None,
            try_count: 0,
            next_try_at: None,
            action: JobAction::Entry,
            result: None,
            user_id: None,
            params: None,
        }
    }

    fn store_with(records: Vec<JobRecord>) -> QueueStore {
        let snapshot = QueueSnapshot::from_records(records);
        let mut store = QueueStore::new();
        store.replace(snapshot.clone(), snapshot);
        store
    }

    fn started(start: Result<DeleteStart, DeleteRejection>) -> MutationId {
        match start {
            Ok(DeleteStart::Started(mutation)) => mutation,
            other => panic!("expected a started delete, got {other:?}"),
        }
    }

    #[test]
    fn begin_hides_record_and_tracks_phase() {
        let mut store = store_with(vec![record(1), record(2)]);
        let mut deletes = DeleteCoordinator::new();

        let mutation = started(deletes.begin(&mut store, 1));
        assert_eq!(store.current().ids(), vec![2]);
        assert_eq!(deletes.phase(1), DeletePhase::Deleting(mutation));
        assert_eq!(deletes.pending_ids(), BTreeSet::from([1]));
    }

    #[test]
    fn second_begin_is_suppressed() {
        let mut store = store_with(vec![record(1)]);
        let mut deletes = DeleteCoordinator::new();

        let mutation = started(deletes.begin(&mut store, 1));
        assert_eq!(
            deletes.begin(&mut store, 1),
            Ok(DeleteStart::AlreadyDeleting(mutation))
        );
    }

    #[test]
    fn processed_record_is_rejected_without_removal() {
        let processed = JobRecord {
            processed_at: Some("2023-01-01T00:00:00Z".parse().unwrap()),
            ..record(1)
        };
        let mut store = store_with(vec![processed]);
        let mut deletes = DeleteCoordinator::new();

        assert_eq!(
            deletes.begin(&mut store, 1),
            Err(DeleteRejection::AlreadyProcessed(1))
        );
        assert_eq!(store.current().ids(), vec![1]);
        assert_eq!(deletes.phase(1), DeletePhase::Idle);
    }

    #[test]
    fn unknown_id_is_rejected() {
        let mut store = store_with(vec![record(1)]);
        let mut deletes = DeleteCoordinator::new();
        assert_eq!(
            deletes.begin(&mut store, 3),
            Err(DeleteRejection::NotFound(3))
        );
    }

    #[test]
    fn failure_restores_exact_record() {
        let original = record(7);
        let mut store = store_with(vec![record(6), original.clone(), record(8)]);
        let mut deletes = DeleteCoordinator::new();

        let mutation = started(deletes.begin(&mut store, 7));
        let outcome = deletes.resolve(
            &mut store,
            7,
            mutation,
            &Err(RemoteError::Rejected("nope".into())),
            0,
        );

        assert_eq!(outcome, DeleteOutcome::RolledBack { reinserted: true });
        assert_eq!(store.current().ids(), vec![6, 7, 8]);
        assert_eq!(store.current().get(7), Some(&original));
        assert_eq!(deletes.phase(7), DeletePhase::Idle);
    }

    #[test]
    fn success_leaves_tombstone_until_newer_fetch() {
        let mut store = store_with(vec![record(1)]);
        let mut deletes = DeleteCoordinator::new();

        let mutation = started(deletes.begin(&mut store, 1));
        let outcome = deletes.resolve(&mut store, 1, mutation, &Ok(()), 4);
        assert_eq!(outcome, DeleteOutcome::Deleted);
        assert!(deletes.pending_ids().is_empty());

        assert!(deletes.suppressed_for(4).contains(&1));
        assert!(!deletes.suppressed_for(5).contains(&1));

        deletes.fetch_applied(4);
        assert!(deletes.suppressed_for(3).contains(&1));
        deletes.fetch_applied(5);
        assert!(deletes.suppressed_for(3).is_empty());
    }

    #[test]
    fn mismatched_mutation_is_stale() {
        let mut store = store_with(vec![record(1)]);
        let mut deletes = DeleteCoordinator::new();

        let mutation = started(deletes.begin(&mut store, 1));
        let other = MutationId(mutation.value() + 10);
        assert_eq!(
            deletes.resolve(&mut store, 1, other, &Ok(()), 0),
            DeleteOutcome::Stale
        );
        assert_eq!(deletes.phase(1), DeletePhase::Deleting(mutation));
    }

    #[test]
    fn closed_coordinator_forgets_in_flight_deletes() {
        let mut store = store_with(vec![record(1), record(2)]);
        let mut deletes = DeleteCoordinator::new();

        let mutation = started(deletes.begin(&mut store, 1));
        deletes.close();

        let outcome = deletes.resolve(
            &mut store,
            1,
            mutation,
            &Err(RemoteError::Transport("reset".into())),
            0,
        );
        assert_eq!(outcome, DeleteOutcome::Stale);
        assert_eq!(store.current().ids(), vec![2]);
        assert!(!deletes.has_pending());
    }
}
