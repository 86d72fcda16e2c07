use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type JobId = u64;

/// What a queued job does. Opaque to the monitor beyond display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobAction {
    Chain,
    Entry,
    #[serde(other)]
    Unknown,
}

impl JobAction {
    pub fn label(self) -> &'static str {
        match self {
            JobAction::Chain => "chain",
            JobAction::Entry => "entry",
            JobAction::Unknown => "unknown",
        }
    }
}

/// One queue entry as reported by the server. Never edited locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub id: JobId,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub try_count: u32,
    #[serde(default)]
    pub next_try_at: Option<DateTime<Utc>>,
    pub action: JobAction,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

/// Lifecycle status derived from a record's fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Processed {
        at: DateTime<Utc>,
    },
    Failed {
        try_count: u32,
        next_try_at: Option<DateTime<Utc>>,
    },
    Pending,
}

impl JobRecord {
    /// Pure function of the record; there is no stored status to drift.
    pub fn status(&self) -> JobStatus {
        match (self.processed_at, self.try_count) {
            (Some(at), _) => JobStatus::Processed { at },
            (None, 0) => JobStatus::Pending,
            (None, try_count) => JobStatus::Failed {
                try_count,
                next_try_at: self.next_try_at,
            },
        }
    }

    /// Processed jobs are history and may not be deleted.
    pub fn is_deletable(&self) -> bool {
        !matches!(self.status(), JobStatus::Processed { .. })
    }
}
