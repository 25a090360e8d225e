//! Device wire protocol: line framing and message parsing.
//!
//! The microcontroller sends one ASCII message per line:
//!
//! ```text
//!   switch1:1          switch press / release   ──▶ DeviceEvent::Switch
//!   10,20,30,40        four knob percentages    ──▶ DeviceEvent::Volume
//! ```
//!
//! [`LineBuffer`] turns a raw byte stream into lines; [`parse`] turns a
//! line into a typed [`DeviceEvent`].  Anything that is not a valid
//! message yields a [`ParseError`] and is dropped by the caller.

use core::fmt;

use crate::error::ParseError;

/// Number of channels in a volume sample.
pub const CHANNELS: usize = 4;

/// Default capacity of the line framing buffer.
pub const MAX_LINE_LEN: usize = 128;

// ---------------------------------------------------------------------------
// Typed events
// ---------------------------------------------------------------------------

/// The two physical switches on the image exhibit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwitchId {
    One,
    Two,
}

impl SwitchId {
    pub const ALL: [SwitchId; 2] = [SwitchId::One, SwitchId::Two];

    /// Wire name of this switch.
    pub fn name(self) -> &'static str {
        match self {
            Self::One => "switch1",
            Self::Two => "switch2",
        }
    }

    /// Look up a switch by wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "switch1" => Some(Self::One),
            "switch2" => Some(Self::Two),
            _ => None,
        }
    }

    /// The other switch.
    pub fn other(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Self::One => 0,
            Self::Two => 1,
        }
    }
}

impl fmt::Display for SwitchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One complete, normalized volume sample (each level in `0.0..=1.0`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeVector {
    levels: [f32; CHANNELS],
}

impl VolumeVector {
    /// Every channel at `level` (clamped into range).
    pub fn uniform(level: f32) -> Self {
        Self {
            levels: [level.clamp(0.0, 1.0); CHANNELS],
        }
    }

    /// Build from wire percentages.  Callers guarantee `<= 100`.
    pub fn from_percent(percent: [u8; CHANNELS]) -> Self {
        let mut levels = [0.0; CHANNELS];
        for (level, pct) in levels.iter_mut().zip(percent) {
            *level = f32::from(pct.min(100)) / 100.0;
        }
        Self { levels }
    }

    pub fn levels(&self) -> &[f32; CHANNELS] {
        &self.levels
    }
}

impl Default for VolumeVector {
    fn default() -> Self {
        Self::uniform(0.5)
    }
}

/// A discrete switch transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchEvent {
    pub switch: SwitchId,
    pub pressed: bool,
}

/// A complete knob sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeEvent {
    pub volumes: VolumeVector,
}

/// Everything the device can report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeviceEvent {
    Switch(SwitchEvent),
    Volume(VolumeEvent),
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parse one device line.
///
/// Leading/trailing whitespace (including the `\r` of CRLF) is ignored.
/// Exactly one event per valid line.
pub fn parse(line: &str) -> Result<DeviceEvent, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(ParseError::Empty);
    }

    if let Some((name, level)) = line.split_once(':') {
        return parse_switch(name, level).map(DeviceEvent::Switch);
    }

    if line.contains(',') {
        return parse_volumes(line).map(DeviceEvent::Volume);
    }

    Err(ParseError::Unrecognized)
}

fn parse_switch(name: &str, level: &str) -> Result<SwitchEvent, ParseError> {
    let switch = SwitchId::from_name(name).ok_or(ParseError::UnknownSwitch)?;
    let pressed = match level {
        "1" => true,
        "0" => false,
        _ => return Err(ParseError::BadSwitchLevel),
    };
    Ok(SwitchEvent { switch, pressed })
}

fn parse_volumes(line: &str) -> Result<VolumeEvent, ParseError> {
    let fields = line.split(',').count();
    if fields != CHANNELS {
        return Err(ParseError::WrongChannelCount(fields));
    }

    let mut percent = [0u8; CHANNELS];
    for (slot, field) in percent.iter_mut().zip(line.split(',')) {
        let field = field.trim();
        if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseError::BadPercent);
        }
        // Saturate absurdly long digit runs so they report as out of range.
        let value: u16 = field.parse().unwrap_or(u16::MAX);
        if value > 100 {
            return Err(ParseError::PercentOutOfRange(value));
        }
        *slot = value as u8;
    }

    Ok(VolumeEvent {
        volumes: VolumeVector::from_percent(percent),
    })
}

// ---------------------------------------------------------------------------
// Line framing
// ---------------------------------------------------------------------------

/// What [`LineBuffer::next_line`] produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Framed {
    /// A complete line, terminator stripped.
    Line(String),
    /// A line longer than the buffer was discarded up to its newline.
    Overflow,
}

/// Streaming newline framer over a fixed-capacity buffer.
///
/// Bytes are fed in whatever chunks the transport returns; complete lines
/// are handed out one at a time.  An over-long line is dropped as a whole
/// (everything up to the next `\n`) so framing resynchronises on the next
/// message.
pub struct LineBuffer<const N: usize = MAX_LINE_LEN> {
    buf: heapless::Vec<u8, N>,
    /// Line length cap, at most `N`.
    limit: usize,
    /// Set once the current line has overflowed; cleared at its newline.
    discarding: bool,
    /// Lines completed but not yet handed out.
    ready: std::collections::VecDeque<Framed>,
}

impl<const N: usize> Default for LineBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> LineBuffer<N> {
    pub fn new() -> Self {
        Self::with_limit(N)
    }

    /// Buffer that treats lines longer than `limit` bytes as overflow.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            buf: heapless::Vec::new(),
            limit: limit.min(N),
            discarding: false,
            ready: std::collections::VecDeque::new(),
        }
    }

    /// Feed raw bytes.
    pub fn feed(&mut self, data: &[u8]) {
        for &byte in data {
            if byte == b'\n' {
                self.finish_line();
                continue;
            }
            if self.discarding {
                continue;
            }
            if self.buf.len() >= self.limit || self.buf.push(byte).is_err() {
                self.buf.clear();
                self.discarding = true;
            }
        }
    }

    /// Pop the next complete line, if any.
    pub fn next_line(&mut self) -> Option<Framed> {
        self.ready.pop_front()
    }

    /// Bytes of the current partial line.
    pub fn pending_len(&self) -> usize {
        self.buf.len()
    }

    /// Drop any partial line and queued lines.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.discarding = false;
        self.ready.clear();
    }

    fn finish_line(&mut self) {
        if self.discarding {
            self.discarding = false;
            self.ready.push_back(Framed::Overflow);
            return;
        }
        let mut bytes: &[u8] = &self.buf;
        if let Some((b'\r', rest)) = bytes.split_last() {
            bytes = rest;
        }
        let line = String::from_utf8_lossy(bytes).into_owned();
        self.buf.clear();
        self.ready.push_back(Framed::Line(line));
    }
}
