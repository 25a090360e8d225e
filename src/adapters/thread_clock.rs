//! Thread-backed clock adapter.
//!
//! Each [`Clock::after`] spawns a short-lived worker that waits on a
//! cancel channel with a timeout.  Timeout → the token is sent to the
//! main loop.  A cancel message, or the handle being dropped, ends the
//! worker without sending anything.
//!
//! The worker holds only a `Sender<TimerToken>`; it never touches
//! exhibit state or sinks, so a worker outliving shutdown is harmless.

use core::time::Duration;
use std::thread;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::app::ports::{CancelHandle, Clock};
use crate::error::{Error, Result};
use crate::timer::TimerToken;

/// Clock whose expiries arrive on a crossbeam channel.
pub struct ThreadClock {
    fired_tx: Sender<TimerToken>,
    fired_rx: Receiver<TimerToken>,
}

impl Default for ThreadClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadClock {
    pub fn new() -> Self {
        let (fired_tx, fired_rx) = crossbeam_channel::unbounded();
        Self { fired_tx, fired_rx }
    }

    /// Block up to `timeout` for the next expiry.  Tests only need this;
    /// the run loop uses the non-blocking [`Clock::try_recv_fired`].
    pub fn recv_fired_timeout(&self, timeout: Duration) -> Option<TimerToken> {
        self.fired_rx.recv_timeout(timeout).ok()
    }
}

/// Cancels one worker.  Dropping it cancels too.
pub struct ThreadTimerHandle {
    cancel_tx: Sender<()>,
}

impl CancelHandle for ThreadTimerHandle {
    fn cancel(self) {
        // The worker may already have fired and exited; that is fine.
        let _ = self.cancel_tx.try_send(());
    }
}

impl Clock for ThreadClock {
    type Handle = ThreadTimerHandle;

    fn after(&mut self, delay: Duration, token: TimerToken) -> Result<ThreadTimerHandle> {
        let (cancel_tx, cancel_rx) = crossbeam_channel::bounded::<()>(1);
        let fired_tx = self.fired_tx.clone();

        thread::Builder::new()
            .name(format!("reversion-{}", token.0))
            .spawn(move || {
                if let Err(RecvTimeoutError::Timeout) = cancel_rx.recv_timeout(delay) {
                    let _ = fired_tx.send(token);
                }
            })
            .map_err(|_| Error::Init("timer thread spawn failed"))?;

        Ok(ThreadTimerHandle { cancel_tx })
    }

    fn try_recv_fired(&mut self) -> Option<TimerToken> {
        self.fired_rx.try_recv().ok()
    }
}
