use std::collections::BTreeSet;

use monitor_logging::monitor_debug;

use crate::{JobId, QueueSnapshot};

/// Merges a fetched snapshot into what is currently shown.
///
/// The server is authoritative, so the result is `fetched` wholesale, except
/// for ids with a delete still in flight: those stay hidden even when the
/// fetch raced ahead of the server's own removal.
pub fn merge(
    current: &QueueSnapshot,
    fetched: &QueueSnapshot,
    pending_deletes: &BTreeSet<JobId>,
) -> QueueSnapshot {
    let merged = fetched.without(pending_deletes);

    let added = merged.iter().filter(|r| !current.contains(r.id)).count();
    let dropped = current.iter().filter(|r| !merged.contains(r.id)).count();
    let suppressed = fetched.len() - merged.len();
    if added + dropped + suppressed > 0 {
        monitor_debug!(
            "Reconciled queue: {} shown, {} added, {} dropped, {} hidden by pending deletes",
            merged.len(),
            added,
            dropped,
            suppressed
        );
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{JobAction, JobRecord};

    fn record(id: JobId, try_count: u32) -> JobRecord {
        JobRecord {
            id,
            created_at: "2023-01-01T00:00:00Z".parse().unwrap(),
            processed_at: None,
            try_count,
            next_try_at: None,
            action: JobAction::Entry,
            result: None,
            user_id: None,
            params: None,
        }
    }

    fn snapshot(ids: &[JobId]) -> QueueSnapshot {
        ids.iter().map(|&id| record(id, 0)).collect()
    }

    #[test]
    fn fetched_replaces_current_wholesale() {
        let current = snapshot(&[1, 2, 3]);
        let fetched = snapshot(&[2, 3, 4]);

        let merged = merge(&current, &fetched, &BTreeSet::new());
        assert_eq!(merged, fetched);
    }

    #[test]
    fn pending_deletes_are_not_resurrected() {
        let current = snapshot(&[1, 3]);
        let fetched = snapshot(&[1, 2, 3]);
        let pending = BTreeSet::from([2]);

        let merged = merge(&current, &fetched, &pending);
        assert_eq!(merged.ids(), vec![1, 3]);
    }

    #[test]
    fn field_changes_come_from_fetched() {
        let current: QueueSnapshot = vec![record(1, 0)].into_iter().collect();
        let fetched: QueueSnapshot = vec![record(1, 2)].into_iter().collect();

        let merged = merge(&current, &fetched, &BTreeSet::new());
        assert_eq!(merged.get(1).unwrap().try_count, 2);
    }

    #[test]
    fn pending_id_absent_from_fetch_is_ignored() {
        let merged = merge(&snapshot(&[1]), &snapshot(&[1]), &BTreeSet::from([9]));
        assert_eq!(merged.ids(), vec![1]);
    }
}
