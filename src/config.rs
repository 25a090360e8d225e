//! Exhibit configuration parameters
//!
//! All tunable parameters for one exhibit host.
//! Values come from a JSON file (see `adapters::config_file`) and may be
//! overridden on the command line.

use core::fmt;
use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::fsm::PresentationState;
use crate::protocol::CHANNELS;

/// Which exhibit this host drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExhibitMode {
    /// Two switches select one of three images.
    #[default]
    Image,
    /// Four knobs set four channel volumes.
    Audio,
}

impl ExhibitMode {
    /// Baud rate the exhibit firmware talks at.
    pub fn default_baud(self) -> u32 {
        match self {
            Self::Image => 9600,
            Self::Audio => 115_200,
        }
    }
}

impl fmt::Display for ExhibitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => f.write_str("image"),
            Self::Audio => f.write_str("audio"),
        }
    }
}

/// Image file shown for each presentation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMap {
    pub neutral: String,
    pub blue: String,
    pub white: String,
}

impl ImageMap {
    pub fn path(&self, state: PresentationState) -> &str {
        match state {
            PresentationState::Neutral => &self.neutral,
            PresentationState::Blue => &self.blue,
            PresentationState::White => &self.white,
        }
    }
}

impl Default for ImageMap {
    fn default() -> Self {
        Self {
            blue: "1.jpg".into(),
            white: "2.jpg".into(),
            neutral: "3.jpg".into(),
        }
    }
}

/// Where one knob's level ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelRoute {
    /// A looping local track on mixer channel `n`.
    Track(u8),
    /// The streamed source's player volume.
    Stream,
}

impl fmt::Display for ChannelRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Track(n) => write!(f, "track{}", n),
            Self::Stream => f.write_str("stream"),
        }
    }
}

/// Core exhibit configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExhibitConfig {
    // --- Exhibit ---
    /// Image switcher or audio mixer
    pub mode: ExhibitMode,
    /// Grace delay before reverting to the neutral image (milliseconds)
    pub grace_delay_ms: u64,

    // --- Serial ---
    /// Explicit serial port; skips discovery when set
    pub port: Option<String>,
    /// Case-insensitive substrings that identify the microcontroller
    pub port_hints: Vec<String>,
    /// Baud rate; `None` picks the mode's default
    pub baud_rate: Option<u32>,
    /// Maximum bytes in one device line
    pub max_line_len: usize,

    // --- Loop timing ---
    /// Run loop tick interval (milliseconds)
    pub tick_interval_ms: u64,
    /// Device lines drained per tick
    pub max_lines_per_tick: usize,
    /// Give up after the device link has been down this long
    /// (milliseconds, counted in ticks); 0 waits forever
    pub link_loss_timeout_ms: u64,

    // --- Outputs ---
    /// Start-up level for every audio channel (0.0-1.0)
    pub initial_volume: f32,
    /// Image file per presentation state
    pub images: ImageMap,
    /// Destination of each volume vector index
    pub channel_routes: [ChannelRoute; CHANNELS],
}

impl Default for ExhibitConfig {
    fn default() -> Self {
        Self {
            // Exhibit
            mode: ExhibitMode::Image,
            grace_delay_ms: 1000,

            // Serial
            port: None,
            port_hints: ["arduino", "ch340", "usb", "acm"]
                .iter()
                .map(|h| (*h).to_string())
                .collect(),
            baud_rate: None,
            max_line_len: crate::protocol::MAX_LINE_LEN,

            // Loop timing
            tick_interval_ms: 10, // 100 Hz
            max_lines_per_tick: 16,
            link_loss_timeout_ms: 30_000,

            // Outputs
            initial_volume: 0.5,
            images: ImageMap::default(),
            channel_routes: [
                ChannelRoute::Track(0),
                ChannelRoute::Track(1),
                ChannelRoute::Stream,
                ChannelRoute::Track(2),
            ],
        }
    }
}

impl ExhibitConfig {
    /// Default configuration for `mode`.
    pub fn for_mode(mode: ExhibitMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn grace_delay(&self) -> Duration {
        Duration::from_millis(self.grace_delay_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Ticks the link may stay down before the loop gives up, if bounded.
    pub fn link_loss_ticks(&self) -> Option<u64> {
        if self.link_loss_timeout_ms == 0 {
            return None;
        }
        Some(self.link_loss_timeout_ms.div_ceil(self.tick_interval_ms.max(1)))
    }

    pub fn effective_baud(&self) -> u32 {
        self.baud_rate.unwrap_or_else(|| self.mode.default_baud())
    }

    /// Reject values that would make the exhibit misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grace_delay_ms > 600_000 {
            return Err(ConfigError::ValidationFailed("grace_delay_ms above 10 minutes"));
        }
        if self.tick_interval_ms == 0 || self.tick_interval_ms > 1000 {
            return Err(ConfigError::ValidationFailed("tick_interval_ms must be 1-1000"));
        }
        if self.link_loss_timeout_ms > 3_600_000 {
            return Err(ConfigError::ValidationFailed("link_loss_timeout_ms above 1 hour"));
        }
        if self.max_lines_per_tick == 0 {
            return Err(ConfigError::ValidationFailed("max_lines_per_tick must be at least 1"));
        }
        if !(16..=4096).contains(&self.max_line_len) {
            return Err(ConfigError::ValidationFailed("max_line_len must be 16-4096"));
        }
        if !(0.0..=1.0).contains(&self.initial_volume) {
            return Err(ConfigError::ValidationFailed("initial_volume must be 0.0-1.0"));
        }
        if self.baud_rate == Some(0) {
            return Err(ConfigError::ValidationFailed("baud_rate must be non-zero"));
        }
        if self.port.is_none() && self.port_hints.iter().all(|h| h.trim().is_empty()) {
            return Err(ConfigError::ValidationFailed("port_hints empty and no port given"));
        }
        if PresentationState::ALL
            .iter()
            .any(|s| self.images.path(*s).trim().is_empty())
        {
            return Err(ConfigError::ValidationFailed("image path empty"));
        }
        Ok(())
    }
}
