//! Log-based sink adapters.
//!
//! [`LogEventSink`] writes structured application events to the logger
//! (stderr on the host).  [`ConsoleOutputs`] stands in for the screen
//! and the mixer: it resolves each output to its configured image file
//! or channel route and logs only real changes, so the per-tick
//! idempotent calls stay quiet.

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{AudioSink, DisplaySink, EventSink};
use crate::config::{ChannelRoute, ExhibitConfig, ImageMap};
use crate::fsm::PresentationState;
use crate::protocol::CHANNELS;

/// Adapter that logs every [`AppEvent`] to the console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { mode, state } => {
                info!("START | mode={} initial_state={}", mode, state);
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {} -> {}", from, to);
            }
            AppEvent::ReversionArmed { token, delay_ms } => {
                info!("TIMER | {} armed, neutral in {} ms", token, delay_ms);
            }
            AppEvent::ReversionCancelled { token } => {
                info!("TIMER | {} cancelled by press", token);
            }
            AppEvent::ReversionFired { token } => {
                info!("TIMER | {} fired", token);
            }
            AppEvent::StaleTimerIgnored { token } => {
                debug!("TIMER | stale {} ignored", token);
            }
            AppEvent::VolumesApplied(v) => {
                let l = v.levels();
                debug!(
                    "AUDIO | {:.2} {:.2} {:.2} {:.2}",
                    l[0], l[1], l[2], l[3]
                );
            }
            AppEvent::LineDropped { reason } => {
                info!("INPUT | dropped line: {}", reason);
            }
            AppEvent::LineOverflow => {
                info!("INPUT | dropped over-long line");
            }
            AppEvent::EventIgnored { mode } => {
                info!("INPUT | event not used by {} exhibit", mode);
            }
            AppEvent::LinkLost(e) => {
                info!("LINK  | lost: {} (presentation frozen)", e);
            }
            AppEvent::LinkRestored => {
                info!("LINK  | restored");
            }
            AppEvent::Stopped(s) => {
                info!(
                    "STOP  | lines={} dropped={} applied={} reversions={} stale={}",
                    s.lines_received,
                    s.lines_dropped,
                    s.events_applied,
                    s.reversions,
                    s.stale_expiries,
                );
            }
        }
    }
}

/// Display + audio stand-in that logs what a real output would do.
pub struct ConsoleOutputs {
    images: ImageMap,
    routes: [ChannelRoute; CHANNELS],
    shown: Option<PresentationState>,
    levels: [Option<f32>; CHANNELS],
}

impl ConsoleOutputs {
    pub fn new(config: &ExhibitConfig) -> Self {
        Self {
            images: config.images.clone(),
            routes: config.channel_routes,
            shown: None,
            levels: [None; CHANNELS],
        }
    }

    /// Image currently "on screen".
    pub fn shown(&self) -> Option<PresentationState> {
        self.shown
    }

    pub fn level(&self, channel: usize) -> Option<f32> {
        self.levels.get(channel).copied().flatten()
    }
}

impl DisplaySink for ConsoleOutputs {
    fn show(&mut self, state: PresentationState) {
        if self.shown == Some(state) {
            return;
        }
        self.shown = Some(state);
        info!("SHOW  | {} ({})", self.images.path(state), state);
    }
}

impl AudioSink for ConsoleOutputs {
    fn set_volume(&mut self, channel: usize, level: f32) {
        let Some(route) = self.routes.get(channel) else {
            warn!("no route for channel {}", channel);
            return;
        };
        let slot = &mut self.levels[channel];
        if *slot == Some(level) {
            return;
        }
        *slot = Some(level);
        match route {
            // Stream players take an integer percent.
            ChannelRoute::Stream => info!("MIX   | stream volume {}%", (level * 100.0).round() as u8),
            ChannelRoute::Track(n) => info!("MIX   | track{} volume {:.2}", n, level),
        }
    }
}
