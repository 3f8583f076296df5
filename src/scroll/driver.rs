//! Frame-driven auto-scroll
//!
//! [`ScrollDriver`] advances the surface by `rate * dt` every display frame.
//! Fractions of a pixel are carried in a remainder and only whole pixels are
//! applied, as an absolute jump, so the total distance tracks the integral of
//! the rate to within one pixel even on hosts that truncate small deltas.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;

use super::speed::{ScrollSpeed, SpeedPresets};
use super::surface::{FrameRequester, FrameToken, ScrollSurface};
use crate::beat_clock::Tempo;
use crate::config::ScrollConfig;

/// Where the scroll rate comes from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScrollMode {
    Manual,
    Synced { pixels_per_beat: f64, bpm: f64 },
}

/// Snapshot returned by [`ScrollDriver::state`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScrollState {
    pub is_active: bool,
    pub pixels_per_second: f64,
    pub fractional_remainder: f64,
    pub mode: ScrollMode,
}

pub struct ScrollDriver<S, F> {
    surface: S,
    frames: F,
    presets: SpeedPresets,
    bottom_tolerance: f64,
    active: bool,
    rate: f64,
    manual_rate: f64,
    remainder: f64,
    mode: ScrollMode,
    last_frame: Duration,
    started_at: Option<Duration>,
    pending_frame: Option<FrameToken>,
    saved_smooth_scroll: Option<bool>,
    applied_pixels: f64,
    tempo_rx: Option<watch::Receiver<Tempo>>,
}

impl<S: ScrollSurface, F: FrameRequester> ScrollDriver<S, F> {
    /// Creates an idle driver at the `medium` preset.
    pub fn new(surface: S, frames: F, config: &ScrollConfig) -> Self {
        let presets = SpeedPresets::from_config(config);
        let rate = presets.rate(ScrollSpeed::Medium);
        Self {
            surface,
            frames,
            presets,
            bottom_tolerance: config.bottom_tolerance_px,
            active: false,
            rate,
            manual_rate: rate,
            remainder: 0.0,
            mode: ScrollMode::Manual,
            last_frame: Duration::ZERO,
            started_at: None,
            pending_frame: None,
            saved_smooth_scroll: None,
            applied_pixels: 0.0,
            tempo_rx: None,
        }
    }

    /// Begins scrolling at host time `now`. No-op while already active.
    pub fn start(&mut self, now: Duration) {
        if self.active {
            return;
        }

        self.active = true;
        self.remainder = 0.0;
        self.applied_pixels = 0.0;
        self.last_frame = now;
        self.started_at = Some(now);

        self.saved_smooth_scroll = Some(self.surface.smooth_scroll_enabled());
        self.surface.set_smooth_scroll(false);
        self.surface.set_indicator_visible(true);

        self.pending_frame = Some(self.frames.request_frame());
        log::info!("[ScrollDriver] Started at {:.1} px/s", self.rate);
    }

    /// Stops scrolling and cancels the outstanding frame request. Idempotent.
    pub fn stop(&mut self) {
        if let Some(token) = self.pending_frame.take() {
            self.frames.cancel_frame(token);
        }
        if !self.active {
            return;
        }

        self.active = false;
        if let Some(previous) = self.saved_smooth_scroll.take() {
            self.surface.set_smooth_scroll(previous);
        }
        self.surface.set_indicator_visible(false);
        log::info!(
            "[ScrollDriver] Stopped after {:.0} px",
            self.applied_pixels
        );
    }

    /// Flips between running and stopped; returns whether it is now running.
    pub fn toggle(&mut self, now: Duration) -> bool {
        if self.active {
            self.stop();
        } else {
            self.start(now);
        }
        self.active
    }

    /// Selects a named preset. Unknown names leave the speed unchanged.
    ///
    /// While synced only the remembered manual rate moves; it takes effect
    /// once sync is disabled.
    pub fn set_speed(&mut self, name: &str) -> bool {
        let speed: ScrollSpeed = match name.parse() {
            Ok(speed) => speed,
            Err(()) => {
                log::debug!("[ScrollDriver] Ignoring unknown speed '{}'", name);
                return false;
            }
        };

        self.manual_rate = self.presets.rate(speed);
        if self.mode == ScrollMode::Manual {
            self.rate = self.manual_rate;
        }
        true
    }

    pub fn enable_sync(&mut self, pixels_per_beat: f64, bpm: f64) {
        self.mode = ScrollMode::Synced {
            pixels_per_beat,
            bpm,
        };
        self.rate = pixels_per_beat * bpm / 60.0;
        log::info!(
            "[ScrollDriver] Synced to {} BPM ({:.2} px/s)",
            bpm,
            self.rate
        );
    }

    pub fn disable_sync(&mut self) {
        if self.mode == ScrollMode::Manual {
            return;
        }
        self.mode = ScrollMode::Manual;
        self.rate = self.manual_rate;
    }

    /// Recomputes the synced rate; ignored in manual mode.
    pub fn update_sync_bpm(&mut self, bpm: f64) {
        if let ScrollMode::Synced {
            pixels_per_beat, ..
        } = self.mode
        {
            self.mode = ScrollMode::Synced {
                pixels_per_beat,
                bpm,
            };
            self.rate = pixels_per_beat * bpm / 60.0;
        }
    }

    pub fn is_synced(&self) -> bool {
        matches!(self.mode, ScrollMode::Synced { .. })
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn state(&self) -> ScrollState {
        ScrollState {
            is_active: self.active,
            pixels_per_second: self.rate,
            fractional_remainder: self.remainder,
            mode: self.mode,
        }
    }

    /// Tracks a tempo channel. The latest value is applied immediately and
    /// then re-read on the first frame after each change.
    pub fn follow_tempo(&mut self, mut tempo_rx: watch::Receiver<Tempo>) {
        let current = *tempo_rx.borrow_and_update();
        self.update_sync_bpm(current.bpm() as f64);
        self.tempo_rx = Some(tempo_rx);
    }

    /// Runs one animation step for the frame identified by `token`.
    ///
    /// Tokens other than the outstanding request are ignored, which covers
    /// frames delivered after `stop()` or a restart.
    pub fn on_frame(&mut self, token: FrameToken, now: Duration) {
        if !self.active || self.pending_frame != Some(token) {
            log::trace!("[ScrollDriver] Ignoring stale frame {:?}", token);
            return;
        }
        self.pending_frame = None;
        self.pull_tempo();

        let elapsed = now.saturating_sub(self.last_frame).as_secs_f64();
        self.last_frame = now;

        self.remainder += (self.rate * elapsed).max(0.0);
        if self.remainder >= 1.0 {
            let whole = self.remainder.floor();
            let top = self.surface.scroll_top();
            self.surface.scroll_to(top + whole);
            self.remainder -= whole;
            self.applied_pixels += whole;
        }

        if self.reached_bottom() {
            log::info!("[ScrollDriver] Reached end of document");
            self.stop();
            return;
        }

        self.pending_frame = Some(self.frames.request_frame());
    }

    /// Whole pixels applied since the last `start`.
    pub fn applied_pixels(&self) -> f64 {
        self.applied_pixels
    }

    pub fn started_at(&self) -> Option<Duration> {
        self.started_at
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn frames_mut(&mut self) -> &mut F {
        &mut self.frames
    }

    fn reached_bottom(&self) -> bool {
        let bottom = self.surface.scroll_top() + self.surface.viewport_height();
        bottom >= self.surface.document_height() - self.bottom_tolerance
    }

    fn pull_tempo(&mut self) {
        let latest = match self.tempo_rx.as_mut() {
            Some(rx) => match rx.has_changed() {
                Ok(true) => Some(*rx.borrow_and_update()),
                Ok(false) => None,
                Err(_) => {
                    log::debug!("[ScrollDriver] Tempo source closed");
                    self.tempo_rx = None;
                    None
                }
            },
            None => None,
        };

        if let Some(tempo) = latest {
            self.update_sync_bpm(tempo.bpm() as f64);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scroll::surface::{FrameQueue, VirtualSurface};

    fn driver(document_height: f64) -> ScrollDriver<VirtualSurface, FrameQueue> {
        ScrollDriver::new(
            VirtualSurface::new(600.0, document_height),
            FrameQueue::new(),
            &ScrollConfig::default(),
        )
    }

    /// Delivers `count` frames `step` apart, starting after `from`.
    fn run_frames(
        driver: &mut ScrollDriver<VirtualSurface, FrameQueue>,
        from: Duration,
        step: Duration,
        count: u32,
    ) -> Duration {
        let mut now = from;
        for _ in 0..count {
            now += step;
            match driver.frames_mut().take_pending() {
                Some(token) => driver.on_frame(token, now),
                None => break,
            }
        }
        now
    }

    #[test]
    fn test_fractional_accumulation_tracks_integral() {
        let mut driver = driver(100_000.0);
        driver.start(Duration::ZERO);

        let mut now = Duration::ZERO;
        for _ in 0..100 {
            now = run_frames(&mut driver, now, Duration::from_millis(10), 1);
            let state = driver.state();
            assert!(state.fractional_remainder >= 0.0 && state.fractional_remainder < 1.0);
        }

        let applied = driver.applied_pixels();
        assert!((applied - 40.0).abs() <= 1.0, "applied {}", applied);
        assert_eq!(driver.surface().scroll_top(), applied);
    }

    #[test]
    fn test_whole_pixels_applied_as_absolute_jumps() {
        let mut driver = driver(100_000.0);
        driver.start(Duration::ZERO);
        run_frames(&mut driver, Duration::ZERO, Duration::from_millis(10), 5);

        // 0.4 px per frame: jumps at 1.2 and 2.0
        assert_eq!(driver.surface().jumps(), 2);
        assert_eq!(driver.surface().scroll_top(), 2.0);
    }

    #[test]
    fn test_auto_stops_near_document_bottom() {
        let mut driver = driver(700.0);
        driver.set_speed("fast");
        driver.start(Duration::ZERO);
        run_frames(&mut driver, Duration::ZERO, Duration::from_millis(16), 1000);

        assert!(!driver.is_active());
        let bottom = driver.surface().scroll_top() + 600.0;
        assert!(bottom >= 690.0);
        assert!(!driver.frames_mut().has_pending());
        assert!(!driver.surface().indicator_visible());
    }

    #[test]
    fn test_already_at_bottom_stops_on_first_frame() {
        let mut driver = driver(605.0);
        driver.start(Duration::ZERO);
        run_frames(&mut driver, Duration::ZERO, Duration::from_millis(16), 1);
        assert!(!driver.is_active());
        assert_eq!(driver.applied_pixels(), 0.0);
    }

    #[test]
    fn test_sync_rate_and_restore() {
        let mut driver = driver(100_000.0);
        driver.set_speed("slow");
        driver.enable_sync(2.0, 120.0);
        assert!(driver.is_synced());
        assert_eq!(driver.state().pixels_per_second, 4.0);

        driver.disable_sync();
        assert!(!driver.is_synced());
        assert_eq!(driver.state().pixels_per_second, 20.0);
    }

    #[test]
    fn test_set_speed_while_synced_only_updates_manual_rate() {
        let mut driver = driver(100_000.0);
        driver.enable_sync(2.0, 120.0);
        assert!(driver.set_speed("fast"));
        assert_eq!(driver.state().pixels_per_second, 4.0);
        driver.disable_sync();
        assert_eq!(driver.state().pixels_per_second, 70.0);
    }

    #[test]
    fn test_unknown_speed_keeps_previous_rate() {
        let mut driver = driver(100_000.0);
        driver.set_speed("slow");
        assert!(!driver.set_speed("warp"));
        assert_eq!(driver.state().pixels_per_second, 20.0);
    }

    #[test]
    fn test_update_sync_bpm_ignored_in_manual_mode() {
        let mut driver = driver(100_000.0);
        driver.update_sync_bpm(200.0);
        assert_eq!(driver.state().mode, ScrollMode::Manual);
        assert_eq!(driver.state().pixels_per_second, 40.0);

        driver.enable_sync(3.0, 60.0);
        driver.update_sync_bpm(120.0);
        assert_eq!(driver.state().pixels_per_second, 6.0);
    }

    #[test]
    fn test_zero_and_negative_rates_never_move() {
        let mut driver = driver(100_000.0);
        driver.enable_sync(2.0, 0.0);
        driver.start(Duration::ZERO);
        let now = run_frames(&mut driver, Duration::ZERO, Duration::from_millis(16), 50);
        assert!(driver.is_active());
        assert_eq!(driver.surface().scroll_top(), 0.0);

        driver.enable_sync(-2.0, 120.0);
        run_frames(&mut driver, now, Duration::from_millis(16), 50);
        assert!(driver.is_active());
        assert_eq!(driver.surface().scroll_top(), 0.0);
        assert_eq!(driver.state().fractional_remainder, 0.0);
    }

    #[test]
    fn test_repeated_start_and_stop_are_noops() {
        let mut driver = driver(100_000.0);
        driver.start(Duration::ZERO);
        let first = driver.frames_mut().has_pending();
        driver.start(Duration::from_secs(5));
        assert!(first);
        assert_eq!(driver.started_at(), Some(Duration::ZERO));

        driver.stop();
        driver.stop();
        assert!(!driver.is_active());
        assert!(!driver.frames_mut().has_pending());
    }

    #[test]
    fn test_smooth_scroll_disabled_while_active() {
        let mut driver = driver(100_000.0);
        assert!(driver.surface().smooth_scroll_enabled());

        driver.start(Duration::ZERO);
        assert!(!driver.surface().smooth_scroll_enabled());
        assert!(driver.surface().indicator_visible());

        driver.stop();
        assert!(driver.surface().smooth_scroll_enabled());
        assert!(!driver.surface().indicator_visible());
    }

    #[test]
    fn test_stale_frame_after_restart_is_ignored() {
        let mut driver = driver(100_000.0);
        driver.set_speed("fast");
        driver.start(Duration::ZERO);
        let stale = driver.frames_mut().take_pending().unwrap();
        driver.stop();
        driver.start(Duration::from_secs(1));

        driver.on_frame(stale, Duration::from_secs(2));
        assert_eq!(driver.surface().scroll_top(), 0.0);
        assert!(driver.frames_mut().has_pending());
    }

    #[test]
    fn test_start_resets_remainder() {
        let mut driver = driver(100_000.0);
        driver.start(Duration::ZERO);
        run_frames(&mut driver, Duration::ZERO, Duration::from_millis(10), 1);
        assert!(driver.state().fractional_remainder > 0.0);

        driver.stop();
        driver.start(Duration::from_secs(1));
        assert_eq!(driver.state().fractional_remainder, 0.0);
    }

    #[test]
    fn test_follow_tempo_pulls_on_next_frame() {
        let (tx, rx) = watch::channel(Tempo::new(120));
        let mut driver = driver(100_000.0);
        driver.enable_sync(2.0, 60.0);
        driver.follow_tempo(rx);
        assert_eq!(driver.state().pixels_per_second, 4.0);

        driver.start(Duration::ZERO);
        tx.send_replace(Tempo::new(180));
        assert_eq!(driver.state().pixels_per_second, 4.0);

        run_frames(&mut driver, Duration::ZERO, Duration::from_millis(16), 1);
        assert_eq!(driver.state().pixels_per_second, 6.0);
    }
}
