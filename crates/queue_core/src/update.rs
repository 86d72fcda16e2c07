use monitor_logging::{monitor_debug, monitor_info, monitor_warn};

use crate::reconcile::merge;
use crate::{
    AppState, DeleteOutcome, DeleteStart, Effect, Msg, Notification, QueueSnapshot, RemoteError,
};

/// Pure update function: applies a message to state and returns any effects.
///
/// Messages are applied one at a time in arrival order, so every write to
/// the snapshot store is serialized through here.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    if state.is_torn_down() && !matches!(msg, Msg::NoOp) {
        monitor_debug!("Ignoring {} after teardown", msg_name(&msg));
        return (state, Vec::new());
    }

    let effects = match msg {
        Msg::StartPolling { interval } => {
            let (_, _, poller) = state.parts_mut();
            if poller.is_running() {
                monitor_debug!("Polling already running");
                return (state, Vec::new());
            }
            let first = poller.start(interval);
            state.mark_dirty();
            monitor_info!("Polling queue every {:?}", interval);
            let mut effects = vec![Effect::StartTimer { interval }];
            effects.extend(first.map(|ticket| Effect::FetchQueue { ticket }));
            effects
        }
        Msg::StopPolling => {
            let (_, _, poller) = state.parts_mut();
            if poller.stop() {
                state.mark_dirty();
                monitor_info!("Polling stopped");
                vec![Effect::StopTimer]
            } else {
                Vec::new()
            }
        }
        Msg::PollTick => {
            let (_, _, poller) = state.parts_mut();
            match poller.on_tick() {
                Some(ticket) => vec![Effect::FetchQueue { ticket }],
                None => Vec::new(),
            }
        }
        Msg::FetchCompleted { ticket, result } => {
            let (store, deletes, poller) = state.parts_mut();
            if !poller.accept(ticket) {
                monitor_debug!("Discarding result of fetch #{}", ticket.seq());
                let effects = poller
                    .issue_owed()
                    .map(|ticket| Effect::FetchQueue { ticket })
                    .into_iter()
                    .collect();
                return (state, effects);
            }
            match result {
                Ok(records) => {
                    let fetched = QueueSnapshot::from_records(records);
                    let hidden = deletes.suppressed_for(ticket.seq());
                    let merged = merge(store.current(), &fetched, &hidden);
                    let changed = store.replace(merged, fetched);
                    deletes.fetch_applied(ticket.seq());
                    if changed {
                        state.mark_dirty();
                    }
                    state.set_last_poll_error(None);
                    Vec::new()
                }
                Err(err) => poll_failed(&mut state, err),
            }
        }
        Msg::DeleteRequested { id } => {
            let (store, deletes, _) = state.parts_mut();
            match deletes.begin(store, id) {
                Ok(DeleteStart::Started(mutation)) => {
                    state.mark_dirty();
                    vec![Effect::DeleteJob { id, mutation }]
                }
                Ok(DeleteStart::AlreadyDeleting(_)) => Vec::new(),
                Err(rejection) => {
                    monitor_warn!("Delete refused: {}", rejection);
                    vec![Effect::Notify(Notification::error(rejection.to_string()))]
                }
            }
        }
        Msg::DeleteCompleted {
            id,
            mutation,
            result,
        } => {
            let (store, deletes, poller) = state.parts_mut();
            let last_issued = poller.last_issued_seq();
            match deletes.resolve(store, id, mutation, &result, last_issued) {
                DeleteOutcome::Deleted => {
                    // Row already hidden; only the busy flag may change.
                    state.mark_dirty();
                    vec![Effect::Notify(Notification::success(format!(
                        "Queue item #{id} deleted"
                    )))]
                }
                DeleteOutcome::RolledBack { .. } => {
                    state.mark_dirty();
                    let reason = result
                        .as_ref()
                        .err()
                        .map(RemoteError::user_message)
                        .unwrap_or_default();
                    vec![Effect::Notify(Notification::error(format!(
                        "Failed to delete queue item #{id}: {reason}"
                    )))]
                }
                DeleteOutcome::Stale => Vec::new(),
            }
        }
        Msg::Teardown => {
            let (_, deletes, poller) = state.parts_mut();
            poller.stop();
            deletes.close();
            state.tear_down();
            monitor_info!("Queue monitor torn down");
            vec![Effect::StopTimer, Effect::CancelInFlight]
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

/// Stale rows stay on screen. Repeats of the same error are reported once.
fn poll_failed(state: &mut AppState, err: RemoteError) -> Vec<Effect> {
    monitor_warn!("Queue fetch failed: {}", err);
    let repeated = state.last_poll_error() == Some(&err);
    let notification = Notification::error(err.user_message());
    state.set_last_poll_error(Some(err));
    if repeated {
        Vec::new()
    } else {
        vec![Effect::Notify(notification)]
    }
}

fn msg_name(msg: &Msg) -> &'static str {
    match msg {
        Msg::StartPolling { .. } => "StartPolling",
        Msg::StopPolling => "StopPolling",
        Msg::PollTick => "PollTick",
        Msg::FetchCompleted { .. } => "FetchCompleted",
        Msg::DeleteRequested { .. } => "DeleteRequested",
        Msg::DeleteCompleted { .. } => "DeleteCompleted",
        Msg::Teardown => "Teardown",
        Msg::NoOp => "NoOp",
    }
}
