use std::io::BufRead;
use std::sync::mpsc;
use std::thread;

use monitor_logging::{monitor_debug, monitor_warn};
use queue_core::JobId;

use crate::app::AppEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Delete(JobId),
    Refresh,
    Pause,
    Resume,
    Quit,
    Unknown(String),
}

/// Blank lines yield `None`.
pub fn parse_command(line: &str) -> Option<Command> {
    let mut words = line.split_whitespace();
    let head = words.next()?;
    let command = match (head.to_ascii_lowercase().as_str(), words.next(), words.next()) {
        ("delete" | "d", Some(id), None) => match id.trim_start_matches('#').parse() {
            Ok(id) => Command::Delete(id),
            Err(_) => Command::Unknown(line.trim().to_string()),
        },
        ("refresh" | "r", None, None) => Command::Refresh,
        ("pause", None, None) => Command::Pause,
        ("resume", None, None) => Command::Resume,
        ("quit" | "q" | "exit", None, None) => Command::Quit,
        _ => Command::Unknown(line.trim().to_string()),
    };
    Some(command)
}

/// Reads commands until EOF; EOF counts as quit.
pub fn spawn_reader<R>(reader: R, tx: mpsc::Sender<AppEvent>) -> std::io::Result<()>
where
    R: BufRead + Send + 'static,
{
    thread::Builder::new()
        .name("stdin-commands".to_string())
        .spawn(move || {
            for line in reader.lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(err) => {
                        monitor_warn!("stdin read failed: {}", err);
                        break;
                    }
                };
                let Some(command) = parse_command(&line) else {
                    continue;
                };
                monitor_debug!("Command: {:?}", command);
                let quit = command == Command::Quit;
                if tx.send(AppEvent::Input(command)).is_err() || quit {
                    return;
                }
            }
            let _ = tx.send(AppEvent::Input(Command::Quit));
        })?;
    Ok(())
}
