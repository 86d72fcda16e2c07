use std::collections::{BTreeSet, HashMap};

use monitor_logging::monitor_warn;

use crate::{JobId, JobRecord};

/// Queue entries in the order the server reported them, unique by id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueueSnapshot {
    records: Vec<JobRecord>,
}

impl QueueSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a snapshot from a fetched list. The first occurrence of a
    /// duplicated id wins.
    pub fn from_records(records: Vec<JobRecord>) -> Self {
        let mut seen = BTreeSet::new();
        let mut unique = Vec::with_capacity(records.len());
        for record in records {
            if seen.insert(record.id) {
                unique.push(record);
            } else {
                monitor_warn!("Duplicate queue item #{} in snapshot ignored", record.id);
            }
        }
        Self { records: unique }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &JobRecord> {
        self.records.iter()
    }

    pub fn ids(&self) -> Vec<JobId> {
        self.records.iter().map(|record| record.id).collect()
    }

    pub fn get(&self, id: JobId) -> Option<&JobRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn contains(&self, id: JobId) -> bool {
        self.position(id).is_some()
    }

    pub fn position(&self, id: JobId) -> Option<usize> {
        self.records.iter().position(|record| record.id == id)
    }

    /// Copy of this snapshot without the given ids, order preserved.
    pub fn without(&self, excluded: &BTreeSet<JobId>) -> Self {
        Self {
            records: self
                .records
                .iter()
                .filter(|record| !excluded.contains(&record.id))
                .cloned()
                .collect(),
        }
    }
}

impl FromIterator<JobRecord> for QueueSnapshot {
    fn from_iter<I: IntoIterator<Item = JobRecord>>(iter: I) -> Self {
        Self::from_records(iter.into_iter().collect())
    }
}

/// Owner of the snapshot the view renders from.
///
/// Writes are crate-private: only the update loop applies them, one message
/// at a time, which is what keeps them serialized.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueueStore {
    current: QueueSnapshot,
    last_fetched: QueueSnapshot,
}

impl QueueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// What the view shows.
    pub fn current(&self) -> &QueueSnapshot {
        &self.current
    }

    /// The most recent server snapshot, before pending deletes were applied.
    pub fn last_fetched(&self) -> &QueueSnapshot {
        &self.last_fetched
    }

    /// Swaps in a reconciled snapshot. Returns whether the visible set changed.
    pub(crate) fn replace(&mut self, merged: QueueSnapshot, fetched: QueueSnapshot) -> bool {
        self.last_fetched = fetched;
        if self.current == merged {
            return false;
        }
        self.current = merged;
        true
    }

    pub(crate) fn remove(&mut self, id: JobId) -> Option<JobRecord> {
        let index = self.current.position(id)?;
        Some(self.current.records.remove(index))
    }

    /// Puts a record back where the last fetch placed it relative to its
    /// neighbours. Refused when the server no longer reports the id or the
    /// record is already shown.
    pub(crate) fn reinsert(&mut self, record: JobRecord) -> bool {
        if self.current.contains(record.id) {
            return false;
        }
        let fetched_order: HashMap<JobId, usize> = self
            .last_fetched
            .records
            .iter()
            .enumerate()
            .map(|(index, fetched)| (fetched.id, index))
            .collect();
        let Some(&target) = fetched_order.get(&record.id) else {
            return false;
        };

        let insert_at = self
            .current
            .records
            .iter()
            .position(|shown| {
                fetched_order
                    .get(&shown.id)
                    .is_some_and(|&index| index > target)
            })
            .unwrap_or(self.current.records.len());
        self.current.records.insert(insert_at, record);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JobAction;

    fn record(id: JobId) -> JobRecord {
        JobRecord {
            id,
            created_at: "2023-01-01T00:00:00Z".parse().unwrap(),
            processed_at: None,
            try_count: 0,
            next_try_at: None,
            action: JobAction::Chain,
            result: None,
            user_id: None,
            params: None,
        }
    }

    fn snapshot(ids: &[JobId]) -> QueueSnapshot {
        QueueSnapshot::from_records(ids.iter().copied().map(record).collect())
    }

    fn loaded_store(ids: &[JobId]) -> QueueStore {
        let mut store = QueueStore::new();
        store.replace(snapshot(ids), snapshot(ids));
        store
    }

    #[test]
    fn duplicate_ids_keep_first_occurrence() {
        let mut second = record(1);
        second.try_count = 9;
        let snap = QueueSnapshot::from_records(vec![record(1), record(2), second]);
        assert_eq!(snap.ids(), vec![1, 2]);
        assert_eq!(snap.get(1).unwrap().try_count, 0);
    }

    #[test]
    fn replace_reports_unchanged_snapshot() {
        let mut store = loaded_store(&[1, 2]);
        assert!(!store.replace(snapshot(&[1, 2]), snapshot(&[1, 2])));
        assert!(store.replace(snapshot(&[2]), snapshot(&[2])));
        assert_eq!(store.current().ids(), vec![2]);
    }

    #[test]
    fn reinsert_restores_prior_position() {
        let mut store = loaded_store(&[3, 1, 2]);
        let removed = store.remove(1).unwrap();
        assert_eq!(store.current().ids(), vec![3, 2]);

        assert!(store.reinsert(removed));
        assert_eq!(store.current().ids(), vec![3, 1, 2]);
    }

    #[test]
    fn reinsert_after_neighbours_vanished() {
        let mut store = loaded_store(&[1, 2, 3]);
        let removed = store.remove(2).unwrap();
        // Server dropped 1 and 3 but still reports 2.
        store.replace(snapshot(&[4]), snapshot(&[2, 4]));

        assert!(store.reinsert(removed));
        assert_eq!(store.current().ids(), vec![2, 4]);
    }

    #[test]
    fn reinsert_refused_when_server_dropped_record() {
        let mut store = loaded_store(&[1, 2]);
        let removed = store.remove(1).unwrap();
        store.replace(snapshot(&[2]), snapshot(&[2]));

        assert!(!store.reinsert(removed));
        assert_eq!(store.current().ids(), vec![2]);
    }

    #[test]
    fn reinsert_refused_for_visible_record() {
        let mut store = loaded_store(&[1]);
        assert!(!store.reinsert(record(1)));
        assert_eq!(store.current().len(), 1);
    }

    #[test]
    fn remove_unknown_id_is_none() {
        let mut store = loaded_store(&[1]);
        assert!(store.remove(5).is_none());
    }
}
