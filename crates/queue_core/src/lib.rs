//! Queue monitor core: job model, snapshot store, reconciliation and the
//! pure state machine that serializes polling and optimistic deletes.
mod effect;
mod error;
mod job;
mod msg;
mod mutation;
mod poller;
mod reconcile;
mod snapshot;
mod state;
mod update;
mod view_model;

pub use effect::{Effect, Notification, NotificationLevel};
pub use error::{RemoteError, NETWORK_ERROR_MESSAGE};
pub use job::{JobAction, JobId, JobRecord, JobStatus};
pub use msg::Msg;
pub use mutation::{
    DeleteCoordinator, DeleteOutcome, DeletePhase, DeleteRejection, DeleteStart, MutationId,
};
pub use poller::{PollTicket, Poller};
pub use reconcile::merge;
pub use snapshot::{QueueSnapshot, QueueStore};
pub use state::AppState;
pub use update::update;
pub use view_model::{JobRowView, QueueViewModel, RetrySchedule, RowStatus};
