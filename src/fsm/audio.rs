//! Four-knob audio exhibit state machine.
//!
//! No discrete states and no timer: every complete sample replaces the
//! whole [`VolumeVector`] and is pushed to the sink in the same call,
//! channel by channel, in sample order.

use log::debug;

use crate::app::events::AppEvent;
use crate::app::ports::{AudioSink, EventSink};
use crate::protocol::{VolumeEvent, VolumeVector};

pub struct VolumeMachine {
    volumes: VolumeVector,
    samples: u64,
}

impl VolumeMachine {
    pub fn new(initial: VolumeVector) -> Self {
        Self {
            volumes: initial,
            samples: 0,
        }
    }

    /// Push the start-up levels so every channel begins at a known volume.
    pub fn start(&self, audio: &mut impl AudioSink) {
        Self::push(&self.volumes, audio);
    }

    /// Replace the vector with `event` and apply it immediately.
    pub fn handle_volume(
        &mut self,
        event: VolumeEvent,
        audio: &mut impl AudioSink,
        sink: &mut impl EventSink,
    ) {
        self.volumes = event.volumes;
        self.samples += 1;
        Self::push(&self.volumes, audio);
        debug!("volumes <- {:?}", self.volumes.levels());
        sink.emit(&AppEvent::VolumesApplied(self.volumes));
    }

    pub fn volumes(&self) -> VolumeVector {
        self.volumes
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }

    fn push(volumes: &VolumeVector, audio: &mut impl AudioSink) {
        for (channel, &level) in volumes.levels().iter().enumerate() {
            audio.set_volume(channel, level);
        }
    }
}

impl Default for VolumeMachine {
    fn default() -> Self {
        Self::new(VolumeVector::default())
    }
}
