//! Auto-scroll driven by a simulated 60 Hz display, synced to the metronome

use std::sync::Arc;
use std::time::Duration;

use tabstash_practice::config::PracticeConfig;
use tabstash_practice::engine::backend::{shared_output_factory, ManualClock, StubOutput};
use tabstash_practice::scroll::{FrameQueue, ScrollSurface, VirtualSurface};
use tabstash_practice::{PracticeSession, ScrollMode, SessionPatch};

const FRAME: Duration = Duration::from_micros(16_667);

fn session(document_height: f64) -> PracticeSession<VirtualSurface, FrameQueue> {
    let output = Arc::new(StubOutput::with_manual_clock(ManualClock::new()));
    PracticeSession::new(
        PracticeConfig::default(),
        shared_output_factory(output),
        VirtualSurface::new(600.0, document_height),
        FrameQueue::new(),
    )
}

/// Runs the display loop until the driver stops requesting frames or
/// `seconds` of host time pass. Returns the host time reached.
fn run_display(
    session: &mut PracticeSession<VirtualSurface, FrameQueue>,
    start: Duration,
    seconds: f64,
) -> Duration {
    let end = start + Duration::from_secs_f64(seconds);
    let mut now = start;
    while now < end {
        let Some(token) = session.scroll_mut().frames_mut().take_pending() else {
            break;
        };
        now += FRAME;
        session.scroll_mut().on_frame(token, now);
    }
    now
}

#[test]
fn test_manual_speed_scrolls_at_preset_rate() {
    let mut session = session(100_000.0);
    session.scroll_mut().set_speed("fast");
    session.scroll_mut().start(Duration::ZERO);
    let now = run_display(&mut session, Duration::ZERO, 10.0);

    let expected = 70.0 * now.as_secs_f64();
    let top = session.scroll().surface().scroll_top();
    assert!((top - expected).abs() <= 1.0, "top {} expected {}", top, expected);
    assert!(session.scroll().is_active());
}

#[test]
fn test_synced_scroll_follows_tempo_changes() {
    let mut session = session(100_000.0);
    session.apply_patch(SessionPatch {
        bpm: Some("60".to_string()),
        scroll_sync: Some(true),
        ..SessionPatch::default()
    });
    session.scroll_mut().start(Duration::ZERO);

    let now = run_display(&mut session, Duration::ZERO, 5.0);
    let first_leg = session.scroll().applied_pixels();
    assert!((first_leg - 2.0 * now.as_secs_f64()).abs() <= 1.0);

    session.set_bpm_text("180");
    let later = run_display(&mut session, now, 5.0);
    assert_eq!(
        session.scroll().state().mode,
        ScrollMode::Synced {
            pixels_per_beat: 2.0,
            bpm: 180.0
        }
    );

    let second_leg = session.scroll().applied_pixels() - first_leg;
    let expected = 6.0 * (later - now).as_secs_f64();
    assert!(
        (second_leg - expected).abs() <= 2.0,
        "second leg {} expected {}",
        second_leg,
        expected
    );
}

#[test]
fn test_disabling_sync_restores_manual_speed() {
    let mut session = session(100_000.0);
    session.scroll_mut().set_speed("slow");
    session.sync_scroll_to_tempo();
    assert_eq!(session.scroll().state().pixels_per_second, 4.0);

    session.unsync_scroll();
    assert_eq!(session.scroll().state().pixels_per_second, 20.0);
    assert!(!session.scroll().is_synced());
}

#[test]
fn test_scroll_stops_at_end_of_document() {
    let mut session = session(1_000.0);
    session.scroll_mut().set_speed("fast");
    session.scroll_mut().start(Duration::ZERO);
    run_display(&mut session, Duration::ZERO, 60.0);

    let scroll = session.scroll();
    assert!(!scroll.is_active());
    let bottom = scroll.surface().scroll_top() + scroll.surface().viewport_height();
    assert!(bottom >= scroll.surface().document_height() - 10.0);
    assert!(scroll.surface().smooth_scroll_enabled());
}

#[test]
fn test_toggle_round_trip_leaves_no_pending_frame() {
    let mut session = session(100_000.0);
    assert!(session.scroll_mut().toggle(Duration::ZERO));
    assert!(!session.scroll_mut().toggle(Duration::from_secs(1)));
    assert!(!session.scroll_mut().frames_mut().has_pending());
}
