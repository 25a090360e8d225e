//! Integration tests for the line → parser → state machine → sink pipeline.
//!
//! Raw device lines go into `AppService` exactly as the serial link would
//! hand them over; assertions are made on recorded sink output.

use std::time::Duration;

use exhibit::app::events::AppEvent;
use exhibit::app::service::AppService;
use exhibit::config::{ExhibitConfig, ExhibitMode};
use exhibit::error::ParseError;
use exhibit::fsm::PresentationState;
use exhibit::timer::TimerToken;

use crate::mock_io::{ManualClock, RecordingOutputs, RecordingSink};

fn image_app() -> (AppService<ManualClock>, ManualClock, RecordingOutputs, RecordingSink) {
    let clock = ManualClock::default();
    let mut app = AppService::new(&ExhibitConfig::default(), clock.clone());
    let mut out = RecordingOutputs::default();
    let mut sink = RecordingSink::default();
    app.start(&mut out, &mut sink);
    (app, clock, out, sink)
}

fn audio_app() -> (AppService<ManualClock>, RecordingOutputs, RecordingSink) {
    let config = ExhibitConfig::for_mode(ExhibitMode::Audio);
    let mut app = AppService::new(&config, ManualClock::default());
    let mut out = RecordingOutputs::default();
    let mut sink = RecordingSink::default();
    app.start(&mut out, &mut sink);
    (app, out, sink)
}

// ── Image exhibit ─────────────────────────────────────────────

#[test]
fn image_exhibit_starts_on_neutral() {
    let (app, _clock, out, sink) = image_app();
    assert_eq!(app.presentation(), PresentationState::Neutral);
    assert_eq!(out.last_shown(), Some(PresentationState::Neutral));
    assert_eq!(
        sink.events[0],
        AppEvent::Started {
            mode: ExhibitMode::Image,
            state: PresentationState::Neutral
        }
    );
}

#[test]
fn full_press_release_cycle_returns_to_neutral() {
    let (mut app, clock, mut out, mut sink) = image_app();

    app.handle_line("switch1:1", &mut out, &mut sink);
    assert_eq!(app.presentation(), PresentationState::Blue);

    app.handle_line("switch2:1", &mut out, &mut sink);
    assert_eq!(app.presentation(), PresentationState::White);

    // Releasing white while blue is still held falls back to blue.
    app.handle_line("switch2:0", &mut out, &mut sink);
    assert_eq!(app.presentation(), PresentationState::Blue);
    assert!(!app.reversion_pending());

    app.handle_line("switch1:0", &mut out, &mut sink);
    assert_eq!(app.presentation(), PresentationState::Blue, "held through grace");
    assert!(app.reversion_pending());

    let scheduled = clock.scheduled();
    assert_eq!(scheduled.len(), 1);
    assert_eq!(scheduled[0].1, Duration::from_millis(1000));

    clock.fire_latest();
    app.poll_timer(&mut sink);
    assert_eq!(app.presentation(), PresentationState::Neutral);
    assert_eq!(app.stats().reversions, 1);

    app.render(&mut out);
    assert_eq!(out.last_shown(), Some(PresentationState::Neutral));
}

#[test]
fn press_within_grace_cancels_and_late_expiry_is_stale() {
    let (mut app, clock, mut out, mut sink) = image_app();

    app.handle_line("switch2:1", &mut out, &mut sink);
    app.handle_line("switch2:0", &mut out, &mut sink);
    let armed = clock.fire_latest().unwrap();

    // The press lands before the loop drains the expiry.
    app.handle_line("switch1:1", &mut out, &mut sink);
    assert_eq!(clock.cancelled(), vec![armed]);

    app.poll_timer(&mut sink);
    assert_eq!(app.presentation(), PresentationState::Blue);
    assert_eq!(app.stats().stale_expiries, 1);
    assert!(sink.events.contains(&AppEvent::StaleTimerIgnored { token: armed }));
}

#[test]
fn repeated_releases_do_not_extend_the_grace_window() {
    let (mut app, clock, mut out, mut sink) = image_app();

    app.handle_line("switch1:1", &mut out, &mut sink);
    app.handle_line("switch1:0", &mut out, &mut sink);
    app.handle_line("switch1:0", &mut out, &mut sink);
    app.handle_line("switch2:0", &mut out, &mut sink);

    assert_eq!(clock.scheduled().len(), 1);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::ReversionArmed { .. })),
        1
    );
}

#[test]
fn forged_token_never_changes_state() {
    let (mut app, clock, mut out, mut sink) = image_app();

    app.handle_line("switch1:1", &mut out, &mut sink);
    clock.deliver(TimerToken(42));
    app.poll_timer(&mut sink);

    assert_eq!(app.presentation(), PresentationState::Blue);
    assert_eq!(app.stats().stale_expiries, 1);
}

#[test]
fn malformed_lines_are_dropped_with_a_reason() {
    let (mut app, _clock, mut out, mut sink) = image_app();

    app.handle_line("switch1:1", &mut out, &mut sink);
    for line in ["", "switch1:2", "switch9:1", "hello", "1,2,3"] {
        app.handle_line(line, &mut out, &mut sink);
    }

    assert_eq!(app.presentation(), PresentationState::Blue);
    let dropped: Vec<ParseError> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::LineDropped { reason } => Some(*reason),
            _ => None,
        })
        .collect();
    assert_eq!(
        dropped,
        vec![
            ParseError::Empty,
            ParseError::BadSwitchLevel,
            ParseError::UnknownSwitch,
            ParseError::Unrecognized,
            ParseError::WrongChannelCount(3),
        ]
    );
    let stats = app.stats();
    assert_eq!((stats.lines_received, stats.lines_dropped), (6, 5));
}

#[test]
fn overflow_counts_as_dropped_line() {
    let (mut app, _clock, _out, mut sink) = image_app();
    app.handle_overflow(&mut sink);
    assert_eq!(sink.last(), Some(&AppEvent::LineOverflow));
    assert_eq!(app.stats().lines_dropped, 1);
}

#[test]
fn shutdown_cancels_pending_reversion() {
    let (mut app, clock, mut out, mut sink) = image_app();
    app.handle_line("switch1:1", &mut out, &mut sink);
    app.handle_line("switch1:0", &mut out, &mut sink);
    assert!(app.reversion_pending());

    app.shutdown(&mut sink);
    assert!(!app.reversion_pending());
    assert_eq!(clock.cancelled().len(), 1);
    match sink.last() {
        Some(AppEvent::Stopped(stats)) => assert_eq!(stats.events_applied, 2),
        other => panic!("expected Stopped, got {other:?}"),
    }
}

// ── Audio exhibit ─────────────────────────────────────────────

#[test]
fn audio_exhibit_pushes_half_volume_at_start() {
    let (app, out, _sink) = audio_app();
    for ch in 0..4 {
        assert_eq!(out.level(ch), Some(0.5));
    }
    assert_eq!(app.volumes().map(|v| *v.levels()), Some([0.5; 4]));
}

#[test]
fn volume_sample_replaces_every_channel() {
    let (mut app, mut out, mut sink) = audio_app();

    app.handle_line("100,0,25,75", &mut out, &mut sink);
    assert_eq!(out.level(0), Some(1.0));
    assert_eq!(out.level(1), Some(0.0));
    assert_eq!(out.level(2), Some(0.25));
    assert_eq!(out.level(3), Some(0.75));

    app.handle_line("10,10,10,10", &mut out, &mut sink);
    assert_eq!(app.volumes().map(|v| *v.levels()), Some([0.1; 4]));
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::VolumesApplied(_))),
        2
    );
}

#[test]
fn bad_volume_sample_keeps_previous_levels() {
    let (mut app, mut out, mut sink) = audio_app();
    app.handle_line("20,40,60,80", &mut out, &mut sink);
    let pushes = out.volumes.len();

    app.handle_line("20,40,60,101", &mut out, &mut sink);
    app.handle_line("20,40,x,80", &mut out, &mut sink);

    assert_eq!(out.volumes.len(), pushes);
    assert_eq!(out.level(3), Some(0.8));
    assert_eq!(
        sink.last(),
        Some(&AppEvent::LineDropped {
            reason: ParseError::BadPercent
        })
    );
}

#[test]
fn switch_line_ignored_by_audio_exhibit() {
    let (mut app, mut out, mut sink) = audio_app();
    app.handle_line("switch1:1", &mut out, &mut sink);
    assert_eq!(
        sink.last(),
        Some(&AppEvent::EventIgnored {
            mode: ExhibitMode::Audio
        })
    );
    assert_eq!(app.stats().events_applied, 0);
}
