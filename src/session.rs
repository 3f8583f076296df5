//! PracticeSession: one metronome, one auto-scroller and one search service
//! owned together by the hosting application.
//!
//! The components never write each other's state. Tempo sync is push-only:
//! the clock publishes every BPM change on its watch channel and the scroll
//! driver pulls the latest value on its next frame.

use serde::{Deserialize, Serialize};

use crate::beat_clock::{BeatClock, Tempo};
use crate::config::PracticeConfig;
use crate::engine::backend::OutputFactory;
use crate::error::AudioError;
use crate::scroll::{FrameRequester, ScrollDriver, ScrollSurface};
use crate::search::{SearchDocument, SearchService};

/// Control updates coming from host UI widgets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionPatch {
    /// Raw text from the tempo input
    #[serde(default)]
    pub bpm: Option<String>,
    /// Up/down control presses, applied after `bpm`
    #[serde(default)]
    pub bpm_delta: Option<i64>,
    #[serde(default)]
    pub scroll_speed: Option<String>,
    #[serde(default)]
    pub scroll_sync: Option<bool>,
}

pub struct PracticeSession<S, F> {
    config: PracticeConfig,
    clock: BeatClock,
    scroll: ScrollDriver<S, F>,
    search: SearchService,
}

impl<S: ScrollSurface, F: FrameRequester> PracticeSession<S, F> {
    pub fn new(config: PracticeConfig, factory: OutputFactory, surface: S, frames: F) -> Self {
        let clock = BeatClock::new(config.metronome.clone(), factory);
        let scroll = ScrollDriver::new(surface, frames, &config.scroll);
        let search = SearchService::new(config.search.clone());
        Self {
            config,
            clock,
            scroll,
            search,
        }
    }

    /// Locks the scroll rate to the metronome tempo.
    pub fn sync_scroll_to_tempo(&mut self) {
        let bpm = self.clock.bpm().bpm() as f64;
        self.scroll
            .enable_sync(self.config.scroll.pixels_per_beat, bpm);
        self.scroll.follow_tempo(self.clock.subscribe_tempo());
    }

    /// Returns the scroll driver to its remembered manual speed.
    pub fn unsync_scroll(&mut self) {
        self.scroll.disable_sync();
    }

    pub fn set_bpm_text(&mut self, raw: &str) -> Tempo {
        self.clock.set_bpm_text(raw)
    }

    pub fn nudge_bpm(&mut self, delta: i64) -> Tempo {
        self.clock.nudge_bpm(delta)
    }

    /// Seeds the metronome from a newly opened tab: its metadata tempo when
    /// present, the configured default otherwise.
    pub fn open_tab(&mut self, tab: &SearchDocument) -> Tempo {
        let bpm = tab.bpm.unwrap_or(self.config.metronome.default_bpm);
        log::debug!("[PracticeSession] Opened '{}' at {} BPM", tab.title, bpm);
        self.clock.set_bpm(bpm as i64)
    }

    /// Applies every field present in `patch`.
    pub fn apply_patch(&mut self, patch: SessionPatch) -> Tempo {
        if let Some(raw) = patch.bpm.as_deref() {
            self.clock.set_bpm_text(raw);
        }
        if let Some(delta) = patch.bpm_delta {
            self.clock.nudge_bpm(delta);
        }
        if let Some(speed) = patch.scroll_speed.as_deref() {
            self.scroll.set_speed(speed);
        }
        match patch.scroll_sync {
            Some(true) => self.sync_scroll_to_tempo(),
            Some(false) => self.unsync_scroll(),
            None => {}
        }
        self.clock.bpm()
    }

    pub fn toggle_metronome(&mut self) -> Result<bool, AudioError> {
        self.clock.toggle()
    }

    /// Stops both the metronome and the scroller.
    pub fn stop_all(&mut self) {
        self.clock.stop();
        self.scroll.stop();
    }

    pub fn clock(&self) -> &BeatClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut BeatClock {
        &mut self.clock
    }

    pub fn scroll(&self) -> &ScrollDriver<S, F> {
        &self.scroll
    }

    pub fn scroll_mut(&mut self) -> &mut ScrollDriver<S, F> {
        &mut self.scroll
    }

    pub fn search(&self) -> &SearchService {
        &self.search
    }

    pub fn search_mut(&mut self) -> &mut SearchService {
        &mut self.search
    }
}
