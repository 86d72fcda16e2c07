use chrono::{DateTime, Utc};

use crate::{JobAction, JobId};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueueViewModel {
    pub rows: Vec<JobRowView>,
    pub job_count: usize,
    /// Ids with a delete in flight. Their rows are hidden and must not offer
    /// a delete affordance if they come back.
    pub pending_deletes: Vec<JobId>,
    pub polling: bool,
    /// A delete is outstanding; the table shows a loading indicator.
    pub busy: bool,
    /// The last fetch failed and the rows may be out of date.
    pub stale: bool,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRowView {
    pub id: JobId,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub action: JobAction,
    pub status: RowStatus,
    pub result: Option<String>,
    pub deletable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    Processed,
    /// Never attempted yet; rendered as a busy indicator.
    InProgress,
    /// `retry` is only present when both the count and the next attempt are
    /// known, so one is never shown without the other.
    Failed { retry: Option<RetrySchedule> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySchedule {
    pub try_count: u32,
    pub next_try_at: DateTime<Utc>,
}
