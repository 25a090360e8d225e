//! Cooperative run loop.
//!
//! One tick:
//!
//! ```text
//!   quit? ──yes──▶ Exit
//!     │
//!     ▼
//!   DeviceLink::poll ×N ──▶ AppService::handle_line
//!     │   (error → LinkLost once, presentation frozen;
//!     │    down past the link-loss limit → LinkTimedOut)
//!     ▼
//!   AppService::poll_timer      (deliver reversion expiries)
//!     ▼
//!   AppService::render          (pull model, every tick)
//! ```
//!
//! Nothing here blocks except the inter-tick sleep in [`Runner::run`].
//!
//! Reversion expiries keep being delivered while the link is down: a
//! release received before the failure still ends on the neutral image.

use std::thread;

use log::{debug, info, warn};

use crate::config::ExhibitConfig;
use crate::error::{Error, Result, TransportError};
use crate::protocol::Framed;

use super::events::AppEvent;
use super::ports::{AudioSink, Clock, DeviceLink, DisplaySink, EventSink, QuitSignal};
use super::service::AppService;

/// Whether the loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
    /// The link stayed down past the configured limit.
    LinkTimedOut(TransportError),
}

/// Owns the driving adapters and steps the service.
pub struct Runner<L: DeviceLink, Q: QuitSignal> {
    link: L,
    quit: Q,
    max_lines_per_tick: usize,
    tick_interval: core::time::Duration,
    link_loss_ticks: Option<u64>,
    link_up: bool,
    /// Ticks since the link went down, with the error that took it down.
    down: Option<(u64, TransportError)>,
    ticks: u64,
}

impl<L: DeviceLink, Q: QuitSignal> Runner<L, Q> {
    pub fn new(link: L, quit: Q, config: &ExhibitConfig) -> Self {
        Self {
            link,
            quit,
            max_lines_per_tick: config.max_lines_per_tick.max(1),
            tick_interval: config.tick_interval(),
            link_loss_ticks: config.link_loss_ticks(),
            link_up: true,
            down: None,
            ticks: 0,
        }
    }

    /// Run one loop iteration.
    pub fn tick<C: Clock>(
        &mut self,
        app: &mut AppService<C>,
        out: &mut (impl DisplaySink + AudioSink),
        sink: &mut impl EventSink,
    ) -> Flow {
        self.ticks += 1;

        if self.quit.quit_requested() {
            info!("quit requested after {} ticks", self.ticks);
            return Flow::Exit;
        }

        for _ in 0..self.max_lines_per_tick {
            match self.link.poll() {
                Ok(Some(framed)) => {
                    if !self.link_up {
                        self.link_up = true;
                        self.down = None;
                        info!("device link restored");
                        sink.emit(&AppEvent::LinkRestored);
                    }
                    match framed {
                        Framed::Line(line) => app.handle_line(&line, out, sink),
                        Framed::Overflow => app.handle_overflow(sink),
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    if self.link_up {
                        self.link_up = false;
                        self.down = Some((0, e));
                        app.handle_link_error(e, sink);
                    }
                    break;
                }
            }
        }

        app.poll_timer(sink);
        app.render(out);

        if let Some((ticks_down, err)) = self.down.as_mut() {
            *ticks_down += 1;
            if self.link_loss_ticks.is_some_and(|limit| *ticks_down >= limit) {
                warn!("device link down for {} ticks, giving up", ticks_down);
                return Flow::LinkTimedOut(*err);
            }
        }
        Flow::Continue
    }

    /// Tick until quit or link timeout, then shut down in order: timer,
    /// link, sinks.  A link timeout is returned as an error so the process
    /// can exit non-zero and be restarted by its supervisor.
    pub fn run<C: Clock>(
        &mut self,
        app: &mut AppService<C>,
        out: &mut (impl DisplaySink + AudioSink),
        sink: &mut impl EventSink,
    ) -> Result<()> {
        let flow = loop {
            match self.tick(app, out, sink) {
                Flow::Continue => thread::sleep(self.tick_interval),
                other => break other,
            }
        };
        self.shutdown(app, sink);
        match flow {
            Flow::LinkTimedOut(err) => Err(Error::Transport(err)),
            _ => Ok(()),
        }
    }

    /// Cancel any pending timer and release the device link.
    pub fn shutdown<C: Clock>(&mut self, app: &mut AppService<C>, sink: &mut impl EventSink) {
        app.shutdown(sink);
        self.link.close();
        debug!("device link closed");
    }

    pub fn link_up(&self) -> bool {
        self.link_up
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn link(&self) -> &L {
        &self.link
    }
}
