//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) and the
//! [`Runner`](super::runner::Runner) emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to the console, count them in
//! a test, etc.

use crate::config::ExhibitMode;
use crate::error::{ParseError, TransportError};
use crate::fsm::PresentationState;
use crate::protocol::VolumeVector;
use crate::timer::TimerToken;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started (carries mode and initial state).
    Started { mode: ExhibitMode, state: PresentationState },

    /// The presented image changed.
    StateChanged { from: PresentationState, to: PresentationState },

    /// Both switches released; reversion to neutral scheduled.
    ReversionArmed { token: TimerToken, delay_ms: u64 },

    /// A press arrived inside the grace window.
    ReversionCancelled { token: TimerToken },

    /// The grace delay elapsed with both switches still released.
    ReversionFired { token: TimerToken },

    /// A superseded timer expiry arrived and was ignored.
    StaleTimerIgnored { token: TimerToken },

    /// A volume sample was applied to every channel.
    VolumesApplied(VolumeVector),

    /// A device line was rejected and dropped.
    LineDropped { reason: ParseError },

    /// A line longer than the framing buffer was discarded.
    LineOverflow,

    /// A line parsed fine but does not apply to this exhibit's mode.
    EventIgnored { mode: ExhibitMode },

    /// The device link failed; presentation is frozen.
    LinkLost(TransportError),

    /// Data is flowing again after a link failure.
    LinkRestored,

    /// The run loop is shutting down (carries final counters).
    Stopped(Stats),
}

/// Running counters, reported at shutdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    /// Lines handed to the service.
    pub lines_received: u64,
    /// Lines rejected by the parser or framing.
    pub lines_dropped: u64,
    /// Events that reached a state machine.
    pub events_applied: u64,
    /// Reversions to neutral that actually fired.
    pub reversions: u64,
    /// Expiries rejected by the generation check.
    pub stale_expiries: u64,
}
