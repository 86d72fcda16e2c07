use std::io::{self, Write};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use anyhow::Context;
use chrono::{Local, Offset};
use monitor_logging::{monitor_debug, monitor_info};
use queue_core::{update, AppState, Effect, Msg, Notification};
use queue_engine::{EngineHandle, ReqwestChannel};

use crate::config::{MonitorConfig, SortOrder};
use crate::effects::{EffectRunner, MsgEventSink};
use crate::input::{self, Command};
use crate::notify::{NoticeBoard, Notifier};
use crate::render;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

#[derive(Debug)]
pub enum AppEvent {
    /// Engine result or timer tick, already in core terms.
    Core(Msg),
    Input(Command),
}

/// What a typed command asks the loop to do.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Action {
    Dispatch(Msg),
    Redraw,
    Usage(String),
    Quit,
}

pub(crate) fn action_for(command: Command, interval: Duration) -> Action {
    match command {
        Command::Delete(id) => Action::Dispatch(Msg::DeleteRequested { id }),
        Command::Refresh => Action::Redraw,
        Command::Pause => Action::Dispatch(Msg::StopPolling),
        Command::Resume => Action::Dispatch(Msg::StartPolling { interval }),
        Command::Quit => Action::Quit,
        Command::Unknown(text) => Action::Usage(format!(
            "Unknown command \"{text}\". {}",
            render::HELP_LINE
        )),
    }
}

struct Monitor {
    state: AppState,
    notices: NoticeBoard,
    runner: EffectRunner,
    sort: SortOrder,
}

impl Monitor {
    /// Returns whether the screen needs redrawing.
    fn dispatch(&mut self, msg: Msg) -> bool {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let notified = effects.iter().any(|e| matches!(e, Effect::Notify(_)));
        let dirty = state.consume_dirty();
        self.state = state;
        self.runner.run(effects, &mut self.notices);
        dirty || notified
    }

    fn draw(&self, out: &mut impl Write) -> io::Result<()> {
        let offset = Local::now().offset().fix();
        let screen = render::render(&self.state.view(), &self.notices, self.sort, offset);
        write!(out, "{CLEAR_SCREEN}{screen}")?;
        out.flush()
    }
}

pub fn run(config: MonitorConfig) -> anyhow::Result<()> {
    let (tx, rx) = mpsc::channel::<AppEvent>();

    let channel = ReqwestChannel::new(config.channel.clone()).context("creating HTTP client")?;
    monitor_info!("Monitoring {}", channel.queue_url());
    let sink = MsgEventSink::new(tx.clone());
    let engine = EngineHandle::new(Arc::new(channel), Arc::new(sink))
        .context("starting queue engine")?;

    let mut monitor = Monitor {
        state: AppState::new(),
        notices: NoticeBoard::new(),
        runner: EffectRunner::new(engine),
        sort: config.sort,
    };

    input::spawn_reader(io::BufReader::new(io::stdin()), tx).context("starting stdin reader")?;

    let mut stdout = io::stdout();
    monitor.dispatch(Msg::StartPolling {
        interval: config.poll_interval,
    });
    monitor.draw(&mut stdout).context("drawing screen")?;

    while let Ok(event) = rx.recv() {
        let redraw = match event {
            AppEvent::Core(msg) => monitor.dispatch(msg),
            AppEvent::Input(command) => match action_for(command, config.poll_interval) {
                Action::Dispatch(msg) => monitor.dispatch(msg),
                Action::Redraw => true,
                Action::Usage(text) => {
                    monitor.notices.notify(Notification::error(text));
                    true
                }
                Action::Quit => {
                    monitor_debug!("Quit requested");
                    monitor.dispatch(Msg::Teardown);
                    break;
                }
            },
        };
        if redraw {
            monitor.draw(&mut stdout).context("drawing screen")?;
        }
    }

    monitor.runner.shutdown();
    monitor_info!("Queue monitor stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const INTERVAL: Duration = Duration::from_millis(1000);

    #[test]
    fn commands_become_core_messages() {
        assert_eq!(
            action_for(Command::Delete(9), INTERVAL),
            Action::Dispatch(Msg::DeleteRequested { id: 9 })
        );
        assert_eq!(
            action_for(Command::Pause, INTERVAL),
            Action::Dispatch(Msg::StopPolling)
        );
        assert_eq!(
            action_for(Command::Resume, INTERVAL),
            Action::Dispatch(Msg::StartPolling { interval: INTERVAL })
        );
        assert_eq!(action_for(Command::Refresh, INTERVAL), Action::Redraw);
        assert_eq!(action_for(Command::Quit, INTERVAL), Action::Quit);
    }

    #[test]
    fn unknown_command_shows_usage() {
        let Action::Usage(text) = action_for(Command::Unknown("purge".into()), INTERVAL) else {
            panic!("expected usage");
        };
        assert!(text.starts_with("Unknown command \"purge\""));
        assert!(text.contains(render::HELP_LINE));
    }
}
