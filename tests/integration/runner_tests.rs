//! Run loop tests: ticks driven against a scripted device link.

use exhibit::app::events::AppEvent;
use exhibit::app::runner::{Flow, Runner};
use exhibit::app::service::AppService;
use exhibit::config::{ExhibitConfig, ExhibitMode};
use exhibit::error::{Error, TransportError};
use exhibit::fsm::PresentationState;

use crate::mock_io::{ManualClock, MockLink, MockQuit, RecordingOutputs, RecordingSink, Step};

struct Rig {
    app: AppService<ManualClock>,
    clock: ManualClock,
    runner: Runner<MockLink, MockQuit>,
    out: RecordingOutputs,
    sink: RecordingSink,
}

impl Rig {
    fn new(config: ExhibitConfig, link: MockLink, quit: MockQuit) -> Self {
        let clock = ManualClock::default();
        let mut app = AppService::new(&config, clock.clone());
        let mut out = RecordingOutputs::default();
        let mut sink = RecordingSink::default();
        app.start(&mut out, &mut sink);
        let runner = Runner::new(link, quit, &config);
        Self {
            app,
            clock,
            runner,
            out,
            sink,
        }
    }

    fn image(link: MockLink) -> Self {
        Self::new(ExhibitConfig::default(), link, MockQuit::never())
    }

    fn tick(&mut self) -> Flow {
        self.runner.tick(&mut self.app, &mut self.out, &mut self.sink)
    }
}

#[test]
fn every_tick_renders_current_image() {
    let mut rig = Rig::image(MockLink::default());
    let before = rig.out.shown.len();
    for _ in 0..3 {
        assert_eq!(rig.tick(), Flow::Continue);
    }
    assert_eq!(rig.out.shown.len(), before + 3);
    assert_eq!(rig.out.last_shown(), Some(PresentationState::Neutral));
}

#[test]
fn visitor_session_end_to_end() {
    let link = MockLink::new([
        Step::Line("switch1:1"),
        Step::Idle,
        Step::Line("switch1:0"),
        Step::Idle,
        Step::Line("switch2:1"),
        Step::Line("switch2:0"),
    ]);
    let mut rig = Rig::image(link);

    rig.tick();
    assert_eq!(rig.out.last_shown(), Some(PresentationState::Blue));

    rig.tick();
    assert_eq!(rig.out.last_shown(), Some(PresentationState::Blue));
    let first = rig.clock.scheduled()[0].0;

    // Second visitor presses inside the grace window.
    rig.tick();
    assert_eq!(rig.out.last_shown(), Some(PresentationState::White));
    assert_eq!(rig.clock.cancelled(), vec![first]);

    // The cancelled expiry shows up late; it must not blank the screen.
    rig.clock.deliver(first);
    rig.tick();
    assert_eq!(rig.out.last_shown(), Some(PresentationState::White));

    rig.clock.fire_latest();
    rig.tick();
    assert_eq!(rig.out.last_shown(), Some(PresentationState::Neutral));

    let stats = rig.app.stats();
    assert_eq!(stats.reversions, 1);
    assert_eq!(stats.stale_expiries, 1);
    assert_eq!(stats.events_applied, 4);
}

#[test]
fn lines_per_tick_are_bounded() {
    let config = ExhibitConfig {
        max_lines_per_tick: 2,
        ..ExhibitConfig::default()
    };
    let link = MockLink::lines(&["switch1:1", "switch1:0", "switch2:1", "switch2:0"]);
    let mut rig = Rig::new(config, link, MockQuit::never());

    rig.tick();
    assert_eq!(rig.runner.link().remaining(), 2);
    assert_eq!(rig.app.stats().lines_received, 2);

    rig.tick();
    assert_eq!(rig.runner.link().remaining(), 0);
    assert_eq!(rig.app.stats().lines_received, 4);
}

#[test]
fn overflow_from_link_reaches_stats() {
    let link = MockLink::new([Step::Overflow, Step::Line("switch2:1")]);
    let mut rig = Rig::image(link);
    rig.tick();
    assert_eq!(rig.app.stats().lines_dropped, 1);
    assert_eq!(rig.app.presentation(), PresentationState::White);
}

#[test]
fn link_loss_freezes_and_reports_once() {
    let link = MockLink::new([
        Step::Line("switch2:1"),
        Step::Fail(TransportError::Disconnected),
        Step::Fail(TransportError::Disconnected),
        Step::Fail(TransportError::Disconnected),
        Step::Line("switch2:0"),
    ]);
    let mut rig = Rig::image(link);

    rig.tick(); // line, then first failure
    assert!(!rig.runner.link_up());
    rig.tick();
    rig.tick();
    assert_eq!(rig.out.last_shown(), Some(PresentationState::White));
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::LinkLost(_))),
        1
    );

    rig.tick();
    assert!(rig.runner.link_up());
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::LinkRestored)),
        1
    );
    assert!(rig.app.reversion_pending());
}

#[test]
fn quit_exits_before_reading() {
    let link = MockLink::lines(&["switch1:1"]);
    let mut rig = Rig::new(ExhibitConfig::default(), link, MockQuit::after(1));
    assert_eq!(rig.tick(), Flow::Exit);
    assert_eq!(rig.runner.link().polls, 0);
    assert_eq!(rig.app.presentation(), PresentationState::Neutral);
}

#[test]
fn run_shuts_down_timer_then_link() {
    let config = ExhibitConfig {
        tick_interval_ms: 1,
        ..ExhibitConfig::default()
    };
    let link = MockLink::lines(&["switch1:1", "switch1:0"]);
    let mut rig = Rig::new(config, link, MockQuit::after(3));

    let result = rig.runner.run(&mut rig.app, &mut rig.out, &mut rig.sink);

    assert!(result.is_ok());
    assert_eq!(rig.runner.ticks(), 3);
    assert!(rig.runner.link().closed);
    assert!(!rig.app.reversion_pending());
    assert_eq!(rig.clock.cancelled().len(), 1);
    assert!(matches!(rig.sink.last(), Some(AppEvent::Stopped(_))));
}

#[test]
fn audio_session_pushes_levels_as_they_arrive() {
    let link = MockLink::lines(&["0,50,100,25"]);
    let mut rig = Rig::new(
        ExhibitConfig::for_mode(ExhibitMode::Audio),
        link,
        MockQuit::never(),
    );
    rig.tick();
    assert_eq!(rig.out.level(2), Some(1.0));
    assert_eq!(rig.out.level(3), Some(0.25));
    assert!(rig.out.shown.is_empty(), "audio exhibit has no display");
}

fn with_link_timeout(timeout_ms: u64) -> ExhibitConfig {
    ExhibitConfig {
        tick_interval_ms: 10,
        link_loss_timeout_ms: timeout_ms,
        ..ExhibitConfig::default()
    }
}

#[test]
fn dead_link_times_out_after_limit() {
    let link = MockLink::lines(&["switch1:1"]).then_fail(TransportError::Disconnected);
    let mut rig = Rig::new(with_link_timeout(50), link, MockQuit::never());

    // The first tick reads the line, then loses the link.
    for _ in 0..4 {
        assert_eq!(rig.tick(), Flow::Continue);
    }
    assert_eq!(
        rig.tick(),
        Flow::LinkTimedOut(TransportError::Disconnected)
    );
    assert_eq!(rig.out.last_shown(), Some(PresentationState::Blue));
}

#[test]
fn run_returns_error_when_link_never_recovers() {
    let link = MockLink::default().then_fail(TransportError::ReadFailed);
    let mut rig = Rig::new(with_link_timeout(30), link, MockQuit::never());

    let result = rig.runner.run(&mut rig.app, &mut rig.out, &mut rig.sink);

    assert_eq!(result, Err(Error::Transport(TransportError::ReadFailed)));
    assert_eq!(rig.runner.ticks(), 3);
    assert!(rig.runner.link().closed);
    assert!(matches!(rig.sink.last(), Some(AppEvent::Stopped(_))));
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::LinkLost(_))),
        1
    );
}

#[test]
fn zero_link_timeout_waits_forever() {
    let link = MockLink::default().then_fail(TransportError::Closed);
    let mut rig = Rig::new(with_link_timeout(0), link, MockQuit::never());
    for _ in 0..10_000 {
        assert_eq!(rig.tick(), Flow::Continue);
    }
    assert!(!rig.runner.link_up());
}

#[test]
fn recovery_resets_link_loss_clock() {
    let link = MockLink::new([
        Step::Fail(TransportError::Disconnected),
        Step::Fail(TransportError::Disconnected),
        Step::Fail(TransportError::Disconnected),
        Step::Line("switch2:1"),
    ])
    .then_fail(TransportError::Disconnected);
    let mut rig = Rig::new(with_link_timeout(40), link, MockQuit::never());

    for _ in 0..3 {
        assert_eq!(rig.tick(), Flow::Continue);
    }
    // Restored, then lost again on the same tick: the count starts over.
    assert_eq!(rig.tick(), Flow::Continue);
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::LinkRestored)),
        1
    );
    for _ in 0..2 {
        assert_eq!(rig.tick(), Flow::Continue);
    }
    assert!(matches!(rig.tick(), Flow::LinkTimedOut(_)));
    assert_eq!(
        rig.sink.count(|e| matches!(e, AppEvent::LinkLost(_))),
        2
    );
}

#[test]
fn pending_reversion_still_fires_while_link_is_down() {
    let link = MockLink::lines(&["switch1:1", "switch1:0"])
        .then_fail(TransportError::Disconnected);
    let mut rig = Rig::image(link);

    rig.tick();
    assert!(!rig.runner.link_up());
    assert_eq!(rig.out.last_shown(), Some(PresentationState::Blue));

    rig.clock.fire_latest();
    rig.tick();
    assert_eq!(rig.out.last_shown(), Some(PresentationState::Neutral));
    assert_eq!(rig.app.stats().reversions, 1);
}
