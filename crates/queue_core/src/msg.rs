use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Begin polling; the first fetch goes out immediately.
    StartPolling { interval: Duration },
    /// Stop polling; an outstanding fetch result will be dropped.
    StopPolling,
    /// Poll timer fired.
    PollTick,
    /// Remote channel answered a queue fetch.
    FetchCompleted {
        ticket: crate::PollTicket,
        result: Result<Vec<crate::JobRecord>, crate::RemoteError>,
    },
    /// User confirmed deletion of a queue item.
    DeleteRequested { id: crate::JobId },
    /// Remote channel answered a delete.
    DeleteCompleted {
        id: crate::JobId,
        mutation: crate::MutationId,
        result: Result<(), crate::RemoteError>,
    },
    /// Component is going away; late results must not be applied.
    Teardown,
    /// Fallback for placeholder wiring.
    NoOp,
}
