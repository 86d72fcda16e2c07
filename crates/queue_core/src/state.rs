use crate::view_model::{JobRowView, QueueViewModel, RetrySchedule, RowStatus};
use crate::{DeleteCoordinator, JobRecord, JobStatus, Poller, QueueStore, RemoteError};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    store: QueueStore,
    deletes: DeleteCoordinator,
    poller: Poller,
    last_poll_error: Option<RemoteError>,
    torn_down: bool,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> QueueViewModel {
        let pending = self.deletes.pending_ids();
        let rows: Vec<JobRowView> = self
            .store
            .current()
            .iter()
            .map(|record| row_view(record, pending.contains(&record.id)))
            .collect();
        QueueViewModel {
            job_count: rows.len(),
            rows,
            pending_deletes: pending.into_iter().collect(),
            polling: self.poller.is_running(),
            busy: self.deletes.has_pending(),
            stale: self.last_poll_error.is_some(),
            dirty: self.dirty,
        }
    }

    pub fn store(&self) -> &QueueStore {
        &self.store
    }

    pub fn deletes(&self) -> &DeleteCoordinator {
        &self.deletes
    }

    pub fn poller(&self) -> &Poller {
        &self.poller
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Returns whether anything visible changed since the last call.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut QueueStore, &mut DeleteCoordinator, &mut Poller) {
        (&mut self.store, &mut self.deletes, &mut self.poller)
    }

    pub(crate) fn last_poll_error(&self) -> Option<&RemoteError> {
        self.last_poll_error.as_ref()
    }

    pub(crate) fn set_last_poll_error(&mut self, error: Option<RemoteError>) {
        if self.last_poll_error.is_some() != error.is_some() {
            self.dirty = true;
        }
        self.last_poll_error = error;
    }

    pub(crate) fn tear_down(&mut self) {
        self.torn_down = true;
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}

fn row_view(record: &JobRecord, pending_delete: bool) -> JobRowView {
    let status = match record.status() {
        JobStatus::Processed { .. } => RowStatus::Processed,
        JobStatus::Pending => RowStatus::InProgress,
        JobStatus::Failed {
            try_count,
            next_try_at,
        } => RowStatus::Failed {
            retry: next_try_at.map(|next_try_at| RetrySchedule {
                try_count,
                next_try_at,
            }),
        },
    };
    JobRowView {
        id: record.id,
        created_at: record.created_at,
        processed_at: record.processed_at,
        action: record.action,
        status,
        result: record.result.clone(),
        deletable: record.is_deletable() && !pending_delete,
    }
}
