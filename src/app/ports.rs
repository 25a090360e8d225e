//! Port traits: the hexagonal boundary between exhibit logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driving adapters (device link, quit signal, clock) feed the service;
//! driven adapters (display, audio, event sink) receive its output.  The
//! [`AppService`](super::service::AppService) and
//! [`Runner`](super::runner::Runner) consume them via generics, so the
//! domain core never touches a serial port, a thread, or a screen.
//!
//! ## Contracts
//!
//! - **DeviceLink::poll** never blocks.  "No data yet" is `Ok(None)`.
//! - **DisplaySink** and **AudioSink** are idempotent: the core repeats
//!   itself freely and never diffs.
//! - **Clock** delivers expiries as tokens through `try_recv_fired`,
//!   consumed on the main loop only.

use core::time::Duration;

use crate::config::ExhibitConfig;
use crate::error::{Result, TransportError};
use crate::fsm::PresentationState;
use crate::protocol::Framed;
use crate::timer::TimerToken;

// ───────────────────────────────────────────────────────────────
// Device link (driving adapter: microcontroller → domain)
// ───────────────────────────────────────────────────────────────

/// Line-oriented, non-blocking view of the serial connection.
pub trait DeviceLink {
    /// Next framed line (terminator stripped) or overflow marker, or
    /// `None` if nothing is pending.  Must return immediately.
    fn poll(&mut self) -> core::result::Result<Option<Framed>, TransportError>;

    /// Release the underlying port.  Later polls return
    /// [`TransportError::Closed`].
    fn close(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Output sinks (driven adapters: domain → screen / speakers)
// ───────────────────────────────────────────────────────────────

/// Shows exactly one image at a time.
pub trait DisplaySink {
    /// Whatever is displayed becomes the image for `state`.
    fn show(&mut self, state: PresentationState);
}

/// Per-channel volume control.
pub trait AudioSink {
    /// Set channel `channel` (index into the volume vector) to `level`
    /// in `0.0..=1.0`.
    fn set_volume(&mut self, channel: usize, level: f32);
}

// ───────────────────────────────────────────────────────────────
// Clock (driving adapter: delayed expiries → domain)
// ───────────────────────────────────────────────────────────────

/// Cancels one scheduled expiry.  Safe to call after it already fired.
pub trait CancelHandle {
    fn cancel(self);
}

/// Schedules single-shot expiries on an auxiliary context and hands the
/// resulting tokens back to the main loop.
pub trait Clock {
    type Handle: CancelHandle;

    /// Deliver `token` through [`try_recv_fired`](Self::try_recv_fired)
    /// once `delay` has elapsed, unless cancelled first.
    fn after(&mut self, delay: Duration, token: TimerToken) -> Result<Self::Handle>;

    /// Next delivered token, if any.  Never blocks.
    fn try_recv_fired(&mut self) -> Option<TimerToken>;
}

// ───────────────────────────────────────────────────────────────
// Quit signal (driving adapter: operator → run loop)
// ───────────────────────────────────────────────────────────────

/// UI quit request, checked once per loop tick.
pub trait QuitSignal {
    fn quit_requested(&mut self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ config file)
// ───────────────────────────────────────────────────────────────

/// Loads exhibit configuration.
///
/// Implementations MUST validate before returning.  Invalid ranges are
/// rejected with [`ConfigError::ValidationFailed`], not silently clamped.
pub trait ConfigPort {
    /// Load configuration.  Returns [`ExhibitConfig::default()`] if no
    /// stored config exists.
    fn load(&self) -> core::result::Result<ExhibitConfig, ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// Stored config failed to deserialize.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error reading the backing store.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}
