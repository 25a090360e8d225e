//! Presentation state machines.
//!
//! Two exhibit flavours share the same shape: device events go in, one
//! authoritative presentation state comes out, and the run loop pulls
//! that state every tick to drive its sink.
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │  image exhibit  (ImageMachine)                            │
//! │                                                           │
//! │         press switch1            press switch2            │
//! │  NEUTRAL ───────────▶ BLUE ◀──────────────▶ WHITE         │
//! │     ▲                   │   (last press wins) │           │
//! │     │                   └──────────┬──────────┘           │
//! │     │                     both released                   │
//! │     │                              ▼                      │
//! │     └──────[grace delay, still released]── (timer armed)  │
//! ├───────────────────────────────────────────────────────────┤
//! │  audio exhibit  (VolumeMachine)                           │
//! │    each sample replaces the whole VolumeVector            │
//! └───────────────────────────────────────────────────────────┘
//! ```

pub mod audio;
pub mod image;

use core::fmt;

use crate::protocol::SwitchId;

// ---------------------------------------------------------------------------
// Presentation state
// ---------------------------------------------------------------------------

/// The image currently presented.  Closed set; match on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum PresentationState {
    /// Nothing held; the default picture.
    #[default]
    Neutral = 0,
    /// Switch 1 is (or was most recently) held.
    Blue = 1,
    /// Switch 2 is (or was most recently) held.
    White = 2,
}

impl PresentationState {
    /// Total number of states.
    pub const COUNT: usize = 3;

    pub const ALL: [PresentationState; Self::COUNT] = [Self::Neutral, Self::Blue, Self::White];

    /// The state a held switch selects.
    pub fn for_switch(switch: SwitchId) -> Self {
        match switch {
            SwitchId::One => Self::Blue,
            SwitchId::Two => Self::White,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Neutral => "Neutral",
            Self::Blue => "Blue",
            Self::White => "White",
        }
    }
}

impl fmt::Display for PresentationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Button states
// ---------------------------------------------------------------------------

/// Pressed/released state of every switch.  All released at start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonStates {
    pressed: [bool; 2],
}

impl ButtonStates {
    pub fn set(&mut self, switch: SwitchId, pressed: bool) {
        self.pressed[switch.index()] = pressed;
    }

    pub fn is_pressed(&self, switch: SwitchId) -> bool {
        self.pressed[switch.index()]
    }

    pub fn any_pressed(&self) -> bool {
        self.pressed.iter().any(|&p| p)
    }

    pub fn all_released(&self) -> bool {
        !self.any_pressed()
    }
}
