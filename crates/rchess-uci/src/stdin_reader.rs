use crate::uci::{UciCommand, parse_uci_command, send_info_string};
use crossbeam_channel::Sender;
use std::io::{self, BufRead};
use std::thread::{self, JoinHandle};

/// Events produced by the stdin reader
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    Command(UciCommand),
    /// stdin reached EOF or failed
    Closed,
}

/// Spawn stdin reader thread
///
/// Malformed lines are reported as `info string` and skipped.
pub fn spawn_stdin_reader(tx: Sender<InputEvent>) -> JoinHandle<()> {
    thread::spawn(move || {
        let stdin = io::stdin();
        let reader = stdin.lock();

        for line in reader.lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    log::error!("Stdin read error: {e}");
                    break;
                }
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            log::debug!("< {line}");

            match parse_uci_command(line) {
                Ok(cmd) => {
                    let quit = matches!(cmd, UciCommand::Quit);
                    if tx.send(InputEvent::Command(cmd)).is_err() {
                        log::debug!("Command channel disconnected, exiting stdin reader");
                        return;
                    }
                    if quit {
                        return;
                    }
                }
                Err(e) => {
                    log::warn!("Failed to parse command '{line}': {e}");
                    if let Err(e) = send_info_string(format!("{e}")) {
                        log::error!("{e}");
                    }
                }
            }
        }

        log::debug!("Stdin closed");
        let _ = tx.send(InputEvent::Closed);
    })
}
