//! Operator quit signal read from stdin.
//!
//! A reader thread forwards quit requests over a channel so the run loop
//! can check once per tick without blocking.  `q`, `quit` or an ESC
//! character followed by Enter ask the loop to exit.  End of input does
//! not: autostarted exhibits run with stdin closed.

use std::io::BufRead;
use std::thread;

use crossbeam_channel::Receiver;
use log::debug;

use crate::app::ports::QuitSignal;
use crate::error::{Error, Result};

pub struct StdinQuit {
    rx: Receiver<()>,
}

impl StdinQuit {
    /// Start the reader thread.
    pub fn spawn() -> Result<Self> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        thread::Builder::new()
            .name("stdin-quit".into())
            .spawn(move || {
                let stdin = std::io::stdin();
                for line in stdin.lock().lines() {
                    let Ok(line) = line else { break };
                    if is_quit_command(&line) {
                        let _ = tx.try_send(());
                    }
                }
                debug!("stdin closed, quit reader exiting");
            })
            .map_err(|_| Error::Init("stdin reader spawn failed"))?;
        Ok(Self { rx })
    }
}

impl QuitSignal for StdinQuit {
    fn quit_requested(&mut self) -> bool {
        self.rx.try_recv().is_ok()
    }
}

fn is_quit_command(line: &str) -> bool {
    let line = line.trim();
    line.eq_ignore_ascii_case("q") || line.eq_ignore_ascii_case("quit") || line.contains('\u{1b}')
}
