//! Single-slot reversion timer.
//!
//! The slot holds at most one pending expiry.  Each arm bumps a
//! generation counter and the backend [`Clock`] is told to deliver that
//! generation's [`TimerToken`] after the delay.  Delivery is a message,
//! not a callback: the main loop drains tokens from the clock and asks
//! the slot whether each one is still current.
//!
//! ```text
//!   arm() ──▶ Clock::after(delay, token#7) ──(thread sleeps)──┐
//!                                                             ▼
//!   main loop ◀── Clock::try_recv_fired() ◀── channel ◀── token#7
//!       │
//!       └─▶ ReversionTimer::accept(token#7)  → Fired / Stale
//! ```
//!
//! Cancellation is advisory.  A token already sitting in the channel when
//! the slot is cancelled or re-armed is rejected by the generation check.

use core::fmt;
use core::time::Duration;

use log::{debug, warn};

use crate::app::ports::{CancelHandle, Clock};
use crate::error::Result;

/// Generation token identifying one arm of the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerToken(pub u64);

impl fmt::Display for TimerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Classification of a delivered token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerOutcome {
    /// The token belongs to the pending arm; the slot is now idle.
    Fired(TimerToken),
    /// Superseded or cancelled; ignore.
    Stale(TimerToken),
}

struct Pending<H> {
    token: TimerToken,
    handle: H,
}

/// One logical timer slot over a [`Clock`] backend.
pub struct ReversionTimer<C: Clock> {
    clock: C,
    generation: u64,
    pending: Option<Pending<C::Handle>>,
}

impl<C: Clock> ReversionTimer<C> {
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            generation: 0,
            pending: None,
        }
    }

    /// Cancel whatever is pending, then schedule a fresh expiry.
    pub fn arm(&mut self, delay: Duration) -> Result<TimerToken> {
        self.cancel();
        self.generation += 1;
        let token = TimerToken(self.generation);
        let handle = self.clock.after(delay, token)?;
        self.pending = Some(Pending { token, handle });
        debug!("timer {} armed for {} ms", token, delay.as_millis());
        Ok(token)
    }

    /// Arm only if nothing is pending.  Returns the new token, or `None`
    /// when an earlier arm is still outstanding (no reset).
    pub fn arm_if_idle(&mut self, delay: Duration) -> Result<Option<TimerToken>> {
        if self.pending.is_some() {
            return Ok(None);
        }
        self.arm(delay).map(Some)
    }

    /// Cancel the pending expiry, if any, and invalidate its token.
    /// Returns the cancelled token.
    pub fn cancel(&mut self) -> Option<TimerToken> {
        let pending = self.pending.take()?;
        pending.handle.cancel();
        // Any later delivery of this token now fails the generation check.
        self.generation += 1;
        debug!("timer {} cancelled", pending.token);
        Some(pending.token)
    }

    /// Decide whether a delivered token is still current.
    pub fn accept(&mut self, token: TimerToken) -> TimerOutcome {
        match &self.pending {
            Some(p) if p.token == token => {
                self.pending = None;
                TimerOutcome::Fired(token)
            }
            _ => TimerOutcome::Stale(token),
        }
    }

    /// Drain the next delivered token from the backend and classify it.
    pub fn poll(&mut self) -> Option<TimerOutcome> {
        let token = self.clock.try_recv_fired()?;
        Some(self.accept(token))
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_token(&self) -> Option<TimerToken> {
        self.pending.as_ref().map(|p| p.token)
    }

    /// Release the slot for shutdown.  Cancels the pending expiry and
    /// discards anything already delivered.
    pub fn shutdown(&mut self) {
        if let Some(token) = self.cancel() {
            warn!("timer {} still pending at shutdown, cancelled", token);
        }
        while self.clock.try_recv_fired().is_some() {}
    }
}
