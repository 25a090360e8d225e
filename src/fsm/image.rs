//! Two-switch image exhibit state machine.
//!
//! Transition rules, applied once per switch event:
//!
//! 1. Record the switch level.
//! 2. A press always selects the pressed switch's image.  A release
//!    falls back to the other switch's image if that one is still held,
//!    otherwise leaves the image alone.
//! 3. Any switch held → cancel a pending reversion.  Both released and
//!    nothing pending → arm the grace timer.  Re-arming while pending is
//!    a no-op, not a reset.
//! 4. On expiry, revert to `Neutral` only if the token is current and
//!    both switches are still released.

use core::time::Duration;

use log::{debug, info, warn};

use super::{ButtonStates, PresentationState};
use crate::app::events::AppEvent;
use crate::app::ports::{Clock, EventSink};
use crate::protocol::SwitchEvent;
use crate::timer::{ReversionTimer, TimerOutcome, TimerToken};

/// Owns the switch levels, the presented image and the reversion timer.
pub struct ImageMachine<C: Clock> {
    buttons: ButtonStates,
    state: PresentationState,
    timer: ReversionTimer<C>,
    grace: Duration,
    reversions: u64,
    stale_expiries: u64,
}

impl<C: Clock> ImageMachine<C> {
    /// Start in `Neutral` with every switch released.
    pub fn new(clock: C, grace: Duration) -> Self {
        Self {
            buttons: ButtonStates::default(),
            state: PresentationState::Neutral,
            timer: ReversionTimer::new(clock),
            grace,
            reversions: 0,
            stale_expiries: 0,
        }
    }

    /// Apply one switch event.
    pub fn handle_switch(&mut self, event: SwitchEvent, sink: &mut impl EventSink) {
        let prev = self.state;
        self.buttons.set(event.switch, event.pressed);

        if event.pressed {
            self.state = PresentationState::for_switch(event.switch);
        } else {
            let other = event.switch.other();
            if self.buttons.is_pressed(other) {
                self.state = PresentationState::for_switch(other);
            }
        }

        if self.buttons.any_pressed() {
            if let Some(token) = self.timer.cancel() {
                sink.emit(&AppEvent::ReversionCancelled { token });
            }
        } else {
            self.arm_reversion(sink);
        }

        self.announce(prev, sink);
    }

    /// Drain every expiry the clock has delivered.
    pub fn poll_timer(&mut self, sink: &mut impl EventSink) {
        while let Some(outcome) = self.timer.poll() {
            self.apply_outcome(outcome, sink);
        }
    }

    /// Feed a single delivered token (for callers that receive tokens
    /// from somewhere other than the owned clock).
    pub fn handle_expiry(&mut self, token: TimerToken, sink: &mut impl EventSink) {
        let outcome = self.timer.accept(token);
        self.apply_outcome(outcome, sink);
    }

    /// Current image.  The run loop pulls this every tick.
    pub fn current(&self) -> PresentationState {
        self.state
    }

    pub fn buttons(&self) -> ButtonStates {
        self.buttons
    }

    pub fn reversion_pending(&self) -> bool {
        self.timer.is_pending()
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    pub fn reversions(&self) -> u64 {
        self.reversions
    }

    pub fn stale_expiries(&self) -> u64 {
        self.stale_expiries
    }

    /// Cancel any pending reversion so no expiry outlives the machine.
    pub fn shutdown(&mut self) {
        self.timer.shutdown();
    }

    pub fn timer(&self) -> &ReversionTimer<C> {
        &self.timer
    }

    // ── Internal ──────────────────────────────────────────────

    fn arm_reversion(&mut self, sink: &mut impl EventSink) {
        match self.timer.arm_if_idle(self.grace) {
            Ok(Some(token)) => sink.emit(&AppEvent::ReversionArmed {
                token,
                delay_ms: self.grace.as_millis() as u64,
            }),
            Ok(None) => debug!("reversion already pending, not re-armed"),
            Err(e) => {
                // Without a timer nothing would ever bring the exhibit back.
                warn!("could not arm reversion timer ({}), reverting now", e);
                self.state = PresentationState::Neutral;
            }
        }
    }

    fn apply_outcome(&mut self, outcome: TimerOutcome, sink: &mut impl EventSink) {
        match outcome {
            TimerOutcome::Fired(token) => {
                if self.buttons.any_pressed() {
                    // Unreachable while presses cancel the slot, but the
                    // level is what matters, not the token.
                    debug!("timer {} fired with a switch held, ignored", token);
                    return;
                }
                let prev = self.state;
                self.state = PresentationState::Neutral;
                self.reversions += 1;
                sink.emit(&AppEvent::ReversionFired { token });
                self.announce(prev, sink);
            }
            TimerOutcome::Stale(token) => {
                self.stale_expiries += 1;
                debug!("stale timer {} ignored", token);
                sink.emit(&AppEvent::StaleTimerIgnored { token });
            }
        }
    }

    fn announce(&self, prev: PresentationState, sink: &mut impl EventSink) {
        if prev != self.state {
            info!("image: {} -> {}", prev, self.state);
            sink.emit(&AppEvent::StateChanged {
                from: prev,
                to: self.state,
            });
        }
    }
}
