use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Fixed-interval tick source. The first tick comes one interval after
/// spawning; ticks missed while the runtime was busy are dropped.
pub struct PollTimer {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl PollTimer {
    /// `on_tick` returning false ends the timer (receiver gone).
    pub fn spawn<F>(handle: &Handle, interval: Duration, on_tick: F) -> Self
    where
        F: Fn() -> bool + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let task = handle.spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if !on_tick() {
                            break;
                        }
                    }
                }
            }
        });
        Self { cancel, task }
    }

    pub fn stop(self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollTimer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
