//! Unified error types for the exhibit host.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! run loop's error handling uniform.  All variants are `Copy` so they can
//! travel inside [`AppEvent`](crate::app::events::AppEvent)s and test
//! assertions without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// No serial port matched the discovery hints at startup.
    DeviceNotFound,
    /// The device link failed after it was opened.
    Transport(TransportError),
    /// A device line could not be interpreted.
    Parse(ParseError),
    /// A background context (timer thread, stdin reader) could not start.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceNotFound => write!(f, "no matching serial device found"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Parse(e) => write!(f, "parse: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Parse errors
// ---------------------------------------------------------------------------

/// Why a device line was rejected.  Never fatal: the line is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// Line was empty after trimming.
    Empty,
    /// `name:level` shape, but the name is not a known switch.
    UnknownSwitch,
    /// Known switch, but the level is not exactly `0` or `1`.
    BadSwitchLevel,
    /// Comma-separated sample with the wrong number of fields.
    WrongChannelCount(usize),
    /// A volume field is not an unsigned integer.
    BadPercent,
    /// A volume field is above 100.
    PercentOutOfRange(u16),
    /// Matches neither grammar.
    Unrecognized,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty line"),
            Self::UnknownSwitch => write!(f, "unknown switch"),
            Self::BadSwitchLevel => write!(f, "switch level must be 0 or 1"),
            Self::WrongChannelCount(n) => write!(f, "expected 4 volume fields, got {n}"),
            Self::BadPercent => write!(f, "volume field is not an integer"),
            Self::PercentOutOfRange(v) => write!(f, "volume {v}% out of range 0-100"),
            Self::Unrecognized => write!(f, "unrecognized message"),
        }
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

/// Serial link failures.  The state machine freezes on these (fail static).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// The device disappeared (unplugged, port vanished).
    Disconnected,
    /// A read returned an I/O error.
    ReadFailed,
    /// The link was already closed by an earlier failure or by shutdown.
    Closed,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "device disconnected"),
            Self::ReadFailed => write!(f, "serial read failed"),
            Self::Closed => write!(f, "link closed"),
        }
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
