//! Operator commands read from standard input.

use std::{io::BufRead, thread};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Command {
    /// Shut the server down.
    Stop,
}

impl Command {
    /// Parses one console line. `stop` and `halt` are accepted in any case.
    pub fn parse(line: &str) -> Option<Self> {
        let command = line.trim();
        if command.eq_ignore_ascii_case("stop") || command.eq_ignore_ascii_case("halt") {
            Some(Self::Stop)
        } else {
            None
        }
    }
}

/// Executes one console line. Returns whether it was a known command.
pub fn handle_command(line: &str, shutdown: &CancellationToken) -> bool {
    match Command::parse(line) {
        Some(Command::Stop) => {
            shutdown.cancel();
            true
        }
        None => {
            let line = line.trim();
            if !line.is_empty() {
                tracing::info!("Unknown command \"{line}\". Type \"stop\" or \"halt\" to stop the server");
            }
            false
        }
    }
}

/// Reads commands from `input` until it ends or the server stops.
pub fn run(input: impl BufRead, shutdown: &CancellationToken) {
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("Failed to read console input: {e}");
                break;
            }
        };
        handle_command(&line, shutdown);
        if shutdown.is_cancelled() {
            break;
        }
    }
    tracing::debug!("Console closed");
}

/// Runs the console on standard input in a background thread.
///
/// Stdin reads block, so this is a plain thread rather than a task that
/// would hold up runtime shutdown.
pub fn spawn(shutdown: CancellationToken) {
    let spawned = thread::Builder::new()
        .name("console".to_owned())
        .spawn(move || run(std::io::stdin().lock(), &shutdown));
    if let Err(e) = spawned {
        tracing::warn!("Failed to start console: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn stop_and_halt_in_any_case() {
        for line in ["stop", "STOP", "Halt", "  halt\n"] {
            assert_eq!(Command::parse(line), Some(Command::Stop), "{line:?}");
        }
        for line in ["", "stopp", "help", "stop now"] {
            assert_eq!(Command::parse(line), None, "{line:?}");
        }
    }

    #[test]
    fn handle_command_cancels_on_stop() {
        let shutdown = CancellationToken::new();
        assert!(!handle_command("list", &shutdown));
        assert!(!shutdown.is_cancelled());
        assert!(handle_command("HALT", &shutdown));
        assert!(shutdown.is_cancelled());
    }

    #[test]
    fn run_stops_reading_after_stop() {
        let shutdown = CancellationToken::new();
        run(Cursor::new("help\nstop\nthis is never read\n"), &shutdown);
        assert!(shutdown.is_cancelled());
    }

    #[test]
    fn end_of_input_does_not_stop_server() {
        let shutdown = CancellationToken::new();
        run(Cursor::new("help\n"), &shutdown);
        assert!(!shutdown.is_cancelled());
    }
}
