use std::io;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use monitor_logging::{monitor_debug, monitor_info};
use queue_core::{JobId, MutationId, PollTicket};
use tokio::runtime::{Handle, Runtime};
use tokio_util::sync::CancellationToken;

use crate::timer::PollTimer;
use crate::{EngineEvent, QueueChannel};

/// Receives engine events. Returning false means nobody is listening.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent) -> bool;
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

enum EngineCommand {
    Fetch { ticket: PollTicket },
    Delete { id: JobId, mutation: MutationId },
    StartTimer { interval: Duration },
    StopTimer,
    CancelInFlight,
    Shutdown,
}

/// Runs remote calls and the poll timer on a background tokio runtime.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    worker: Option<thread::JoinHandle<()>>,
}

impl EngineHandle {
    pub fn new(channel: Arc<dyn QueueChannel>, sink: Arc<dyn EventSink>) -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("queue-engine")
            .enable_all()
            .build()?;
        let (cmd_tx, cmd_rx) = mpsc::channel();

        let worker = thread::Builder::new()
            .name("queue-engine-commands".to_string())
            .spawn(move || run_commands(runtime, channel, sink, cmd_rx))?;

        Ok(Self {
            cmd_tx,
            worker: Some(worker),
        })
    }

    pub fn fetch(&self, ticket: PollTicket) {
        self.send(EngineCommand::Fetch { ticket });
    }

    pub fn delete(&self, id: JobId, mutation: MutationId) {
        self.send(EngineCommand::Delete { id, mutation });
    }

    pub fn start_timer(&self, interval: Duration) {
        self.send(EngineCommand::StartTimer { interval });
    }

    pub fn stop_timer(&self) {
        self.send(EngineCommand::StopTimer);
    }

    /// Abandons every outstanding request; none of them will report back.
    pub fn cancel_in_flight(&self) {
        self.send(EngineCommand::CancelInFlight);
    }

    /// Stops the timer, cancels requests and joins the worker thread.
    pub fn shutdown(mut self) {
        self.stop_worker();
    }

    fn send(&self, command: EngineCommand) {
        let _ = self.cmd_tx.send(command);
    }

    fn stop_worker(&mut self) {
        self.send(EngineCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.stop_worker();
    }
}

fn run_commands(
    runtime: Runtime,
    channel: Arc<dyn QueueChannel>,
    sink: Arc<dyn EventSink>,
    cmd_rx: mpsc::Receiver<EngineCommand>,
) {
    let mut requests = CancellationToken::new();
    let mut timer: Option<PollTimer> = None;

    while let Ok(command) = cmd_rx.recv() {
        match command {
            EngineCommand::Fetch { ticket } => {
                spawn_fetch(runtime.handle(), &channel, &sink, &requests, ticket);
            }
            EngineCommand::Delete { id, mutation } => {
                spawn_delete(runtime.handle(), &channel, &sink, &requests, id, mutation);
            }
            EngineCommand::StartTimer { interval } => {
                if let Some(previous) = timer.take() {
                    previous.stop();
                }
                let sink = sink.clone();
                timer = Some(PollTimer::spawn(runtime.handle(), interval, move || {
                    sink.emit(EngineEvent::PollTick)
                }));
            }
            EngineCommand::StopTimer => {
                if let Some(previous) = timer.take() {
                    previous.stop();
                }
            }
            EngineCommand::CancelInFlight => {
                requests.cancel();
                requests = CancellationToken::new();
            }
            EngineCommand::Shutdown => break,
        }
    }

    if let Some(previous) = timer.take() {
        previous.stop();
    }
    requests.cancel();
    runtime.shutdown_timeout(Duration::from_millis(200));
    monitor_info!("Queue engine stopped");
}

fn spawn_fetch(
    handle: &Handle,
    channel: &Arc<dyn QueueChannel>,
    sink: &Arc<dyn EventSink>,
    requests: &CancellationToken,
    ticket: PollTicket,
) {
    let channel = channel.clone();
    let sink = sink.clone();
    let token = requests.child_token();
    handle.spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {
                monitor_debug!("Fetch #{} cancelled", ticket.seq());
            }
            result = channel.fetch_queue() => {
                sink.emit(EngineEvent::FetchCompleted { ticket, result });
            }
        }
    });
}

fn spawn_delete(
    handle: &Handle,
    channel: &Arc<dyn QueueChannel>,
    sink: &Arc<dyn EventSink>,
    requests: &CancellationToken,
    id: JobId,
    mutation: MutationId,
) {
    let channel = channel.clone();
    let sink = sink.clone();
    let token = requests.child_token();
    handle.spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {
                monitor_debug!("Delete of queue item #{} cancelled", id);
            }
            result = channel.delete_job(id) => {
                sink.emit(EngineEvent::DeleteCompleted { id, mutation, result });
            }
        }
    });
}
