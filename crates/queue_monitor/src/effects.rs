use std::sync::mpsc;

use monitor_logging::monitor_debug;
use queue_core::{Effect, Msg, RemoteError};
use queue_engine::{ChannelError, EngineEvent, EngineHandle, EventSink};

use crate::app::AppEvent;
use crate::notify::Notifier;

pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }

    pub fn run(&self, effects: Vec<Effect>, notifier: &mut dyn Notifier) {
        for effect in effects {
            match effect {
                Effect::StartTimer { interval } => self.engine.start_timer(interval),
                Effect::StopTimer => self.engine.stop_timer(),
                Effect::FetchQueue { ticket } => {
                    monitor_debug!("FetchQueue seq={}", ticket.seq());
                    self.engine.fetch(ticket);
                }
                Effect::DeleteJob { id, mutation } => {
                    monitor_debug!("DeleteJob id={} mutation={}", id, mutation.value());
                    self.engine.delete(id, mutation);
                }
                Effect::CancelInFlight => self.engine.cancel_in_flight(),
                Effect::Notify(notification) => notifier.notify(notification),
            }
        }
    }

    pub fn shutdown(self) {
        self.engine.shutdown();
    }
}

/// Feeds engine events into the app's message loop.
pub struct MsgEventSink {
    tx: mpsc::Sender<AppEvent>,
}

impl MsgEventSink {
    pub fn new(tx: mpsc::Sender<AppEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for MsgEventSink {
    fn emit(&self, event: EngineEvent) -> bool {
        self.tx.send(AppEvent::Core(map_event(event))).is_ok()
    }
}

pub(crate) fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::PollTick => Msg::PollTick,
        EngineEvent::FetchCompleted { ticket, result } => Msg::FetchCompleted {
            ticket,
            result: result.map_err(map_channel_error),
        },
        EngineEvent::DeleteCompleted {
            id,
            mutation,
            result,
        } => Msg::DeleteCompleted {
            id,
            mutation,
            result: result.map_err(map_channel_error),
        },
    }
}

/// Anything the server actually answered counts as a rejection.
fn map_channel_error(err: ChannelError) -> RemoteError {
    if err.server_responded() {
        RemoteError::Rejected(err.message)
    } else {
        RemoteError::Transport(err.to_string())
    }
}
