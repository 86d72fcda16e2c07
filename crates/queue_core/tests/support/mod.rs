#![allow(dead_code)]

use std::sync::Once;
use std::time::Duration;

use queue_core::{
    update, AppState, Effect, JobAction, JobId, JobRecord, Msg, MutationId, PollTicket,
};

pub const INTERVAL: Duration = Duration::from_millis(1000);

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(monitor_logging::initialize_for_tests);
}

pub fn pending(id: JobId) -> JobRecord {
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

pub fn processed(id: JobId) -> JobRecord {
    JobRecord {
        processed_at: Some("2023-01-01T00:00:00Z".parse().unwrap()),
        result: Some("a1b2c3".to_string()),
        ..pending(id)
    }
}

pub fn failed(id: JobId, try_count: u32) -> JobRecord {
    JobRecord {
        try_count,
        next_try_at: Some("2023-01-02T00:00:00Z".parse().unwrap()),
        ..pending(id)
    }
}

pub fn fetch_ticket(effects: &[Effect]) -> Option<PollTicket> {
    effects.iter().find_map(|effect| match effect {
        Effect::FetchQueue { ticket } => Some(*ticket),
        _ => None,
    })
}

pub fn delete_mutation(effects: &[Effect]) -> Option<MutationId> {
    effects.iter().find_map(|effect| match effect {
        Effect::DeleteJob { mutation, .. } => Some(*mutation),
        _ => None,
    })
}

pub fn ids(state: &AppState) -> Vec<JobId> {
    state.view().rows.iter().map(|row| row.id).collect()
}

/// Starts polling and answers the first fetch with `records`.
pub fn loaded(records: Vec<JobRecord>) -> AppState {
    let (state, effects) = update(AppState::new(), Msg::StartPolling { interval: INTERVAL });
    let ticket = fetch_ticket(&effects).expect("initial fetch");
    let (mut state, _) = update(
        state,
        Msg::FetchCompleted {
            ticket,
            result: Ok(records),
        },
    );
    state.consume_dirty();
    state
}

/// Runs one timer tick and answers the resulting fetch.
pub fn poll(state: AppState, records: Vec<JobRecord>) -> AppState {
    let (state, effects) = update(state, Msg::PollTick);
    let ticket = fetch_ticket(&effects).expect("tick issues a fetch");
    let (state, _) = update(
        state,
        Msg::FetchCompleted {
            ticket,
            result: Ok(records),
        },
    );
    state
}
