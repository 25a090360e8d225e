//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the exhibit's state machine and the running
//! counters.  It exposes a hardware-agnostic API: raw lines and timer
//! expiries go in, sinks are driven through port traits injected at the
//! call site.
//!
//! ```text
//!  DeviceLink ──line──▶ ┌──────────────────────┐ ──▶ EventSink
//!                       │      AppService      │
//!  Clock ──token──────▶ │ parse · FSM · stats  │ ──▶ DisplaySink / AudioSink
//!                       └──────────────────────┘
//! ```

use log::{debug, info, warn};

use crate::config::{ExhibitConfig, ExhibitMode};
use crate::error::TransportError;
use crate::fsm::audio::VolumeMachine;
use crate::fsm::image::ImageMachine;
use crate::fsm::PresentationState;
use crate::protocol::{self, DeviceEvent, VolumeVector};

use super::events::{AppEvent, Stats};
use super::ports::{AudioSink, Clock, DisplaySink, EventSink};

/// Mode-specific state machine.
enum Exhibit<C: Clock> {
    Image(ImageMachine<C>),
    Audio(VolumeMachine),
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all exhibit logic.
pub struct AppService<C: Clock> {
    exhibit: Exhibit<C>,
    mode: ExhibitMode,
    stats: Stats,
}

impl<C: Clock> AppService<C> {
    /// Construct the service from configuration.  The clock backs the
    /// reversion timer in image mode and is unused in audio mode.
    pub fn new(config: &ExhibitConfig, clock: C) -> Self {
        let exhibit = match config.mode {
            ExhibitMode::Image => Exhibit::Image(ImageMachine::new(clock, config.grace_delay())),
            ExhibitMode::Audio => {
                Exhibit::Audio(VolumeMachine::new(VolumeVector::uniform(config.initial_volume)))
            }
        };
        Self {
            exhibit,
            mode: config.mode,
            stats: Stats::default(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Announce start-up and push initial outputs.
    pub fn start(&mut self, out: &mut (impl DisplaySink + AudioSink), sink: &mut impl EventSink) {
        match &self.exhibit {
            Exhibit::Image(m) => out.show(m.current()),
            Exhibit::Audio(m) => m.start(out),
        }
        sink.emit(&AppEvent::Started {
            mode: self.mode,
            state: self.presentation(),
        });
        info!("AppService started in {} mode", self.mode);
    }

    /// Release the timer slot.  Call before the sinks are torn down.
    pub fn shutdown(&mut self, sink: &mut impl EventSink) {
        if let Exhibit::Image(m) = &mut self.exhibit {
            m.shutdown();
        }
        self.refresh_stats();
        sink.emit(&AppEvent::Stopped(self.stats));
        info!("AppService stopped");
    }

    // ── Inputs ────────────────────────────────────────────────

    /// Parse one device line and apply it.  Malformed lines are logged,
    /// counted and dropped; they never touch state.
    pub fn handle_line(
        &mut self,
        line: &str,
        audio: &mut impl AudioSink,
        sink: &mut impl EventSink,
    ) {
        self.stats.lines_received += 1;
        match protocol::parse(line) {
            Ok(event) => self.handle_event(event, audio, sink),
            Err(reason) => {
                self.stats.lines_dropped += 1;
                warn!("dropping device line {:?}: {}", line, reason);
                sink.emit(&AppEvent::LineDropped { reason });
            }
        }
    }

    /// Record a line the framer had to discard.
    pub fn handle_overflow(&mut self, sink: &mut impl EventSink) {
        self.stats.lines_received += 1;
        self.stats.lines_dropped += 1;
        warn!("dropping over-long device line");
        sink.emit(&AppEvent::LineOverflow);
    }

    /// Apply an already-parsed event.
    pub fn handle_event(
        &mut self,
        event: DeviceEvent,
        audio: &mut impl AudioSink,
        sink: &mut impl EventSink,
    ) {
        match (&mut self.exhibit, event) {
            (Exhibit::Image(m), DeviceEvent::Switch(ev)) => {
                self.stats.events_applied += 1;
                m.handle_switch(ev, sink);
            }
            (Exhibit::Audio(m), DeviceEvent::Volume(ev)) => {
                self.stats.events_applied += 1;
                m.handle_volume(ev, audio, sink);
            }
            (_, other) => {
                debug!("{:?} does not apply to the {} exhibit", other, self.mode);
                sink.emit(&AppEvent::EventIgnored { mode: self.mode });
            }
        }
    }

    /// Deliver any timer expiries that have arrived.
    pub fn poll_timer(&mut self, sink: &mut impl EventSink) {
        if let Exhibit::Image(m) = &mut self.exhibit {
            m.poll_timer(sink);
        }
    }

    /// Transport failure: presentation stays frozen on the last good state.
    pub fn handle_link_error(&mut self, err: TransportError, sink: &mut impl EventSink) {
        warn!(
            "device link failed ({}); holding {} until it recovers",
            err,
            self.describe()
        );
        sink.emit(&AppEvent::LinkLost(err));
    }

    // ── Output ────────────────────────────────────────────────

    /// Push the current presentation to the display.  Called every tick;
    /// the sink is idempotent.  No-op in audio mode, where volumes are
    /// pushed as samples arrive.
    pub fn render(&self, display: &mut impl DisplaySink) {
        if let Exhibit::Image(m) = &self.exhibit {
            display.show(m.current());
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn mode(&self) -> ExhibitMode {
        self.mode
    }

    /// Current image (always `Neutral` in audio mode).
    pub fn presentation(&self) -> PresentationState {
        match &self.exhibit {
            Exhibit::Image(m) => m.current(),
            Exhibit::Audio(_) => PresentationState::Neutral,
        }
    }

    /// Current volume vector (audio mode only).
    pub fn volumes(&self) -> Option<VolumeVector> {
        match &self.exhibit {
            Exhibit::Image(_) => None,
            Exhibit::Audio(m) => Some(m.volumes()),
        }
    }

    pub fn image_machine(&self) -> Option<&ImageMachine<C>> {
        match &self.exhibit {
            Exhibit::Image(m) => Some(m),
            Exhibit::Audio(_) => None,
        }
    }

    pub fn reversion_pending(&self) -> bool {
        self.image_machine().is_some_and(ImageMachine::reversion_pending)
    }

    pub fn stats(&self) -> Stats {
        let mut stats = self.stats;
        if let Exhibit::Image(m) = &self.exhibit {
            stats.reversions = m.reversions();
            stats.stale_expiries = m.stale_expiries();
        }
        stats
    }

    // ── Internal ──────────────────────────────────────────────

    fn refresh_stats(&mut self) {
        self.stats = self.stats();
    }

    fn describe(&self) -> String {
        match &self.exhibit {
            Exhibit::Image(m) => format!("image {}", m.current()),
            Exhibit::Audio(m) => format!("volumes {:?}", m.volumes().levels()),
        }
    }
}
