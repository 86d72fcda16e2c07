use std::fmt;

use queue_core::{JobId, JobRecord, MutationId, PollTicket};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    PollTick,
    FetchCompleted {
        ticket: PollTicket,
        result: Result<Vec<JobRecord>, ChannelError>,
    },
    DeleteCompleted {
        id: JobId,
        mutation: MutationId,
        result: Result<(), ChannelError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ChannelError {
    pub kind: FailureKind,
    pub message: String,
}

impl ChannelError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// True when the server produced an answer, even an unusable one.
    pub fn server_responded(&self) -> bool {
        matches!(
            self.kind,
            FailureKind::Rejected { .. } | FailureKind::Decode
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    Transport,
    Timeout,
    Rejected { status: u16 },
    Decode,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::Transport => write!(f, "network error"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Rejected { status } => write!(f, "rejected with http status {status}"),
            FailureKind::Decode => write!(f, "unreadable response"),
        }
    }
}
